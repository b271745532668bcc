//! Resources group one handler per HTTP verb under a base path.
//!
//! Implement [`Resource`] by hand or let `#[resource]` generate it from the
//! verb methods of an impl block:
//!
//! ```rust,ignore
//! use simple_restful::prelude::*;
//!
//! #[derive(Default)]
//! pub struct TodoResource;
//!
//! #[resource(path = "/todos")]
//! impl TodoResource {
//!     async fn get(&self, todo_id: Option<i64>) -> Value {
//!         json!({ "id": todo_id })
//!     }
//!
//!     async fn post(&self, req: Request, todo_id: i64) -> (Value, u16) {
//!         (json!({ "id": todo_id, "len": req.body().len() }), 201)
//!     }
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::http::Method;

use crate::request::Request;
use crate::response::{IntoReply, Reply};
use crate::route::Params;

/// Type-erased handler future.
pub type ReplyFuture = Pin<Box<dyn Future<Output = Reply> + Send>>;

/// Type-erased verb handler.
pub type BoxHandler = Arc<dyn Fn(Request) -> ReplyFuture + Send + Sync>;

/// A type exposing HTTP verb handlers under one base path.
pub trait Resource: Send + Sync + 'static {
    fn endpoint(self: Arc<Self>) -> Endpoint;
}

/// One verb of an endpoint with the path parameters it declares.
#[derive(Clone)]
pub struct MethodHandler {
    pub method: Method,
    pub params: Params,
    pub(crate) handler: BoxHandler,
}

impl MethodHandler {
    pub fn call(&self, request: Request) -> ReplyFuture {
        (self.handler)(request)
    }
}

impl std::fmt::Debug for MethodHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodHandler")
            .field("method", &self.method)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Declarative description of a resource: name, base path and verb handlers.
#[derive(Debug, Clone)]
pub struct Endpoint {
    name: String,
    path: String,
    urls: Vec<String>,
    handlers: Vec<MethodHandler>,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            urls: Vec::new(),
            handlers: Vec::new(),
        }
    }

    /// Bind every handler on these URLs instead of the derived templates.
    pub fn urls<I, U>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<String>,
    {
        self.urls = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Register the handler for `method`, replacing an earlier one.
    pub fn on<F, Fut, T>(mut self, method: Method, params: Params, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: IntoReply + 'static,
    {
        let handler: BoxHandler = Arc::new(move |request: Request| -> ReplyFuture {
            let future = handler(request);
            Box::pin(async move { future.await.into_reply() })
        });
        self.handlers.retain(|existing| existing.method != method);
        self.handlers.push(MethodHandler {
            method,
            params,
            handler,
        });
        self
    }

    pub fn get<F, Fut, T>(self, params: Params, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: IntoReply + 'static,
    {
        self.on(Method::GET, params, handler)
    }

    pub fn post<F, Fut, T>(self, params: Params, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: IntoReply + 'static,
    {
        self.on(Method::POST, params, handler)
    }

    pub fn put<F, Fut, T>(self, params: Params, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: IntoReply + 'static,
    {
        self.on(Method::PUT, params, handler)
    }

    pub fn patch<F, Fut, T>(self, params: Params, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: IntoReply + 'static,
    {
        self.on(Method::PATCH, params, handler)
    }

    pub fn delete<F, Fut, T>(self, params: Params, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: IntoReply + 'static,
    {
        self.on(Method::DELETE, params, handler)
    }

    pub fn head<F, Fut, T>(self, params: Params, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: IntoReply + 'static,
    {
        self.on(Method::HEAD, params, handler)
    }

    pub fn options<F, Fut, T>(self, params: Params, handler: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: IntoReply + 'static,
    {
        self.on(Method::OPTIONS, params, handler)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn explicit_urls(&self) -> &[String] {
        &self.urls
    }

    pub fn handlers(&self) -> &[MethodHandler] {
        &self.handlers
    }

    pub fn handler(&self, method: &Method) -> Option<&MethodHandler> {
        self.handlers.iter().find(|h| &h.method == method)
    }
}

/// Answers CORS preflight requests with an empty body.
pub(crate) fn preflight_handler() -> MethodHandler {
    MethodHandler {
        method: Method::OPTIONS,
        params: Params::new(),
        handler: Arc::new(|_request: Request| -> ReplyFuture {
            Box::pin(async { Reply::empty() })
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_endpoint_builder() {
        let endpoint = Endpoint::new("TodoResource", "/todos")
            .get(Params::new().optional::<i64>("todo_id"), |_req| async {
                json!([])
            })
            .post(Params::new().required::<i64>("todo_id"), |_req| async {
                (json!({}), 201)
            });

        assert_eq!(endpoint.name(), "TodoResource");
        assert_eq!(endpoint.path(), "/todos");
        assert_eq!(endpoint.handlers().len(), 2);
        assert!(endpoint.handler(&Method::POST).is_some());
        assert!(endpoint.handler(&Method::DELETE).is_none());
    }

    #[test]
    fn test_registering_a_verb_twice_replaces_it() {
        let endpoint = Endpoint::new("Echo", "/echo")
            .get(Params::new(), |_req| async { json!(1) })
            .get(Params::new().untyped("word"), |_req| async { json!(2) });
        assert_eq!(endpoint.handlers().len(), 1);
        assert_eq!(endpoint.handlers()[0].params.len(), 1);
    }

    #[tokio::test]
    async fn test_handler_output_is_normalized() {
        let endpoint =
            Endpoint::new("Echo", "/echo").get(Params::new(), |_req| async { json!("hi") });
        let (parts, _) = axum::http::Request::new(()).into_parts();
        let request = Request::new(parts, Default::default(), Default::default());

        match endpoint.handlers()[0].call(request).await {
            Reply::Data { body, .. } => assert_eq!(body, Value::from("hi")),
            other => panic!("unexpected reply: {:?}", other),
        }
    }
}
