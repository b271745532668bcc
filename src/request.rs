use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri, request::Parts};
use serde::de::DeserializeOwned;

use crate::error::{RestfulError, Result};
use crate::route::PathParam;

/// Decoded placeholder values captured from the request path, in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathArgs {
    values: Vec<(String, String)>,
}

impl PathArgs {
    pub(crate) fn insert(&mut self, name: String, value: String) {
        self.values.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Bind a parameter every template of the handler captures.
    pub fn required<T: PathParam>(&self, name: &str) -> Result<T> {
        self.optional(name)?.ok_or_else(|| RestfulError::MissingParam {
            name: name.to_string(),
        })
    }

    /// Bind a parameter that shorter templates leave out.
    pub fn optional<T: PathParam>(&self, name: &str) -> Result<Option<T>> {
        match self.get(name) {
            None => Ok(None),
            Some(raw) => T::from_segment(raw)
                .map(Some)
                .ok_or_else(|| RestfulError::InvalidParam {
                    name: name.to_string(),
                    value: raw.to_string(),
                }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The request as seen by a resource handler.
#[derive(Debug)]
pub struct Request {
    parts: Parts,
    args: PathArgs,
    body: Bytes,
}

impl Request {
    pub fn new(parts: Parts, args: PathArgs, body: Bytes) -> Self {
        Self { parts, args, body }
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts
            .headers
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    pub fn args(&self) -> &PathArgs {
        &self.args
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| RestfulError::InvalidBody {
            reason: e.to_string(),
        })
    }

    pub fn into_parts(self) -> (Parts, PathArgs, Bytes) {
        (self.parts, self.args, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn request(body: &'static str) -> Request {
        let (parts, _) = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/todos/3")
            .header("content-type", "application/json")
            .body(())
            .unwrap()
            .into_parts();
        let mut args = PathArgs::default();
        args.insert("todo_id".into(), "3".into());
        Request::new(parts, args, Bytes::from_static(body.as_bytes()))
    }

    #[test]
    fn test_bind_args() {
        let req = request("");
        assert_eq!(req.args().required::<i64>("todo_id").unwrap(), 3);
        assert_eq!(req.args().optional::<String>("title").unwrap(), None);
        assert!(matches!(
            req.args().required::<String>("title"),
            Err(RestfulError::MissingParam { .. })
        ));
        assert!(matches!(
            req.args().required::<u8>("todo_id").map(|_| ()),
            Ok(())
        ));
        assert!(matches!(
            req.args().required::<uuid::Uuid>("todo_id"),
            Err(RestfulError::InvalidParam { .. })
        ));
    }

    #[test]
    fn test_json_body() {
        #[derive(Deserialize)]
        struct Todo {
            title: String,
        }

        let todo: Todo = request(r#"{"title":"write docs"}"#).json().unwrap();
        assert_eq!(todo.title, "write docs");
        assert!(request("{").json::<Todo>().is_err());
        assert_eq!(request("").header("Content-Type"), Some("application/json"));
    }
}
