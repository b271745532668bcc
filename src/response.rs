use std::collections::HashMap;

use axum::{
    Json,
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode as HttpStatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::error::{RestfulError, Result};
use crate::exception::ExceptionFilter;

/// Normalized outcome of a resource handler.
///
/// Handlers may return a finished response, bare data, `(data, status)` or
/// `(data, status, headers)`; all of them end up here before being rendered.
///
/// # Example
/// ```
/// use simple_restful::{IntoReply, Reply};
/// use serde_json::json;
///
/// let reply = (json!({"id": 7}), 201).into_reply();
/// assert!(matches!(reply, Reply::Data { status, .. } if status.as_u16() == 201));
/// ```
#[derive(Debug)]
pub enum Reply {
    /// A response built by the handler itself, sent unchanged.
    Raw(Response),
    Data {
        body: Value,
        status: HttpStatusCode,
        headers: HeaderMap,
    },
    Error(RestfulError),
}

impl Reply {
    pub fn data(body: Value) -> Self {
        Reply::Data {
            body,
            status: HttpStatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    /// `200 OK` with no body, as answered to CORS preflight requests.
    pub fn empty() -> Self {
        Reply::Raw((HttpStatusCode::OK, Body::empty()).into_response())
    }

    fn from_parts<T, S, H>(data: T, status: S, headers: H) -> Self
    where
        T: Serialize,
        S: IntoStatus,
        H: IntoHeaders,
    {
        Self::try_from_parts(data, status, headers).unwrap_or_else(Reply::Error)
    }

    fn try_from_parts<T, S, H>(data: T, status: S, headers: H) -> Result<Self>
    where
        T: Serialize,
        S: IntoStatus,
        H: IntoHeaders,
    {
        Ok(Reply::Data {
            body: serde_json::to_value(data)?,
            status: status.into_status()?,
            headers: headers.into_headers()?,
        })
    }

    /// Render the reply, handing errors to `filter`.
    pub fn into_response_with(self, filter: &dyn ExceptionFilter) -> Response {
        match self {
            Reply::Raw(response) => response,
            Reply::Data {
                body,
                status,
                headers,
            } => {
                let mut response = (status, Json(body)).into_response();
                response.headers_mut().extend(headers);
                response
            }
            Reply::Error(error) => filter.catch(error),
        }
    }
}

/// Conversion of handler return values into a [`Reply`].
pub trait IntoReply {
    fn into_reply(self) -> Reply;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Reply {
        self
    }
}

impl IntoReply for Response {
    fn into_reply(self) -> Reply {
        Reply::Raw(self)
    }
}

impl IntoReply for RestfulError {
    fn into_reply(self) -> Reply {
        Reply::Error(self)
    }
}

impl<T, E> IntoReply for std::result::Result<T, E>
where
    T: IntoReply,
    E: Into<RestfulError>,
{
    fn into_reply(self) -> Reply {
        match self {
            Ok(value) => value.into_reply(),
            Err(error) => Reply::Error(error.into()),
        }
    }
}

impl IntoReply for Value {
    fn into_reply(self) -> Reply {
        Reply::data(self)
    }
}

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> Reply {
        Reply::from_parts(self.0, HttpStatusCode::OK, HeaderMap::new())
    }
}

impl<T: Serialize> IntoReply for Vec<T> {
    fn into_reply(self) -> Reply {
        Reply::from_parts(self, HttpStatusCode::OK, HeaderMap::new())
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Reply {
        Reply::data(Value::String(self))
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Reply {
        Reply::data(Value::String(self.to_string()))
    }
}

impl IntoReply for () {
    fn into_reply(self) -> Reply {
        Reply::data(Value::Null)
    }
}

impl<T, S> IntoReply for (T, S)
where
    T: Serialize,
    S: IntoStatus,
{
    fn into_reply(self) -> Reply {
        Reply::from_parts(self.0, self.1, HeaderMap::new())
    }
}

impl<T, S, H> IntoReply for (T, S, H)
where
    T: Serialize,
    S: IntoStatus,
    H: IntoHeaders,
{
    fn into_reply(self) -> Reply {
        Reply::from_parts(self.0, self.1, self.2)
    }
}

/// Tuples that are not `(data, status)` or `(data, status, headers)` are
/// sent whole as a `200` JSON array.
macro_rules! whole_tuple_reply {
    ($(($($ty:ident),+)),* $(,)?) => {
        $(
            impl<$($ty: Serialize),+> IntoReply for ($($ty,)+) {
                fn into_reply(self) -> Reply {
                    Reply::from_parts(self, HttpStatusCode::OK, HeaderMap::new())
                }
            }
        )*
    };
}

whole_tuple_reply!(
    (A),
    (A, B, C, D),
    (A, B, C, D, E),
    (A, B, C, D, E, F),
    (A, B, C, D, E, F, G),
    (A, B, C, D, E, F, G, H),
    (A, B, C, D, E, F, G, H, I),
    (A, B, C, D, E, F, G, H, I, J),
    (A, B, C, D, E, F, G, H, I, J, K),
    (A, B, C, D, E, F, G, H, I, J, K, L),
);

/// Status codes accepted in reply tuples.
pub trait IntoStatus {
    fn into_status(self) -> Result<HttpStatusCode>;
}

impl IntoStatus for HttpStatusCode {
    fn into_status(self) -> Result<HttpStatusCode> {
        Ok(self)
    }
}

macro_rules! int_status {
    ($($ty:ty),*) => {
        $(
            impl IntoStatus for $ty {
                fn into_status(self) -> Result<HttpStatusCode> {
                    u16::try_from(self)
                        .ok()
                        .and_then(|code| HttpStatusCode::from_u16(code).ok())
                        .ok_or(RestfulError::InvalidStatus(self as i64))
                }
            }
        )*
    };
}

int_status!(i32, u16, u32, i64);

/// Header collections accepted in reply tuples.
pub trait IntoHeaders {
    fn into_headers(self) -> Result<HeaderMap>;
}

impl IntoHeaders for HeaderMap {
    fn into_headers(self) -> Result<HeaderMap> {
        Ok(self)
    }
}

fn collect_headers<I, K, V>(pairs: I) -> Result<HeaderMap>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let name = name.as_ref();
        let invalid = || RestfulError::InvalidHeader {
            name: name.to_string(),
        };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value.as_ref()).map_err(|_| invalid())?;
        headers.append(header_name, header_value);
    }
    Ok(headers)
}

impl<K: AsRef<str>, V: AsRef<str>> IntoHeaders for Vec<(K, V)> {
    fn into_headers(self) -> Result<HeaderMap> {
        collect_headers(self)
    }
}

impl<K: AsRef<str>, V: AsRef<str>, const N: usize> IntoHeaders for [(K, V); N] {
    fn into_headers(self) -> Result<HeaderMap> {
        collect_headers(self)
    }
}

impl<K: AsRef<str>, V: AsRef<str>> IntoHeaders for HashMap<K, V> {
    fn into_headers(self) -> Result<HeaderMap> {
        collect_headers(self)
    }
}
