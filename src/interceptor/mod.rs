use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response};
use std::future::Future;
use std::pin::Pin;

use crate::error::RestfulError;

mod layer;
mod logging;

pub use layer::{InterceptorLayer, InterceptorMiddleware};
pub use logging::LoggingInterceptor;

/// standard return type for Interceptors
pub type InterceptorResult = Result<Response, RestfulError>;

/// Represents the next handler in the chain
pub struct Next {
    pub(crate) run: Box<
        dyn FnOnce(Request<Body>) -> Pin<Box<dyn Future<Output = InterceptorResult> + Send>>
            + Send,
    >,
}

impl Next {
    /// Create a new Next handler
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Request<Body>) -> Pin<Box<dyn Future<Output = InterceptorResult> + Send>>
            + Send
            + 'static,
    {
        Self { run: Box::new(f) }
    }

    /// Execute the next handler
    pub async fn run(self, request: Request<Body>) -> InterceptorResult {
        (self.run)(request).await
    }
}

/// The Interceptor trait
///
/// Interceptors decorate every route registered through an `Api`. They can
/// inspect/modify the request before it reaches the resource, and
/// inspect/modify the response after the resource returns. An `Err` is
/// rendered through the api's exception filter.
///
/// # Example
/// ```
/// use simple_restful::interceptor::{Interceptor, InterceptorResult, Next};
/// use simple_restful::async_trait;
/// use axum::{body::Body, http::Request};
///
/// struct ServedBy;
///
/// #[async_trait]
/// impl Interceptor for ServedBy {
///     async fn intercept(&self, req: Request<Body>, next: Next) -> InterceptorResult {
///         let mut res = next.run(req).await?;
///         res.headers_mut().insert("x-served-by", "simple-restful".parse().unwrap());
///         Ok(res)
///     }
/// }
/// ```
#[async_trait]
pub trait Interceptor: Send + Sync + 'static {
    async fn intercept(&self, request: Request<Body>, next: Next) -> InterceptorResult;
}
