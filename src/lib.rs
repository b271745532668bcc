//! # simple-restful
//!
//! Resource-style routing for axum. A resource groups one handler per HTTP
//! verb; the path parameters each handler declares decide the URLs it is
//! reachable on, handler results are shaped into JSON responses, and every
//! response leaves with permissive CORS headers.
//!
//! ## Features
//!
//! - **Derived routes**: optional parameters produce shorter URL variants
//! - **Typed placeholders**: `<todo_id:int>`, `<slug:slug>`, `<id:uuid>` ...
//! - **Reply shaping**: return data, `(data, status)` or `(data, status, headers)`
//! - **CORS everywhere**: success, error and fallback responses alike
//! - **Interceptors**: decorate every route of an api
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use simple_restful::prelude::*;
//!
//! #[derive(Default)]
//! pub struct TodoResource;
//!
//! #[resource(path = "/todos")]
//! impl TodoResource {
//!     // GET /v0.9/todos and GET /v0.9/todos/<todo_id:int>
//!     async fn get(&self, todo_id: Option<i64>) -> Value {
//!         json!({ "id": todo_id })
//!     }
//!
//!     // POST /v0.9/todos/<todo_id:int>
//!     async fn post(&self, todo_id: i64) -> (Value, u16) {
//!         (json!({ "id": todo_id }), 201)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> simple_restful::Result<()> {
//!     let config = ServerConfig::default();
//!     let router = Api::new("/v0.9")
//!         .resource(TodoResource)
//!         .into_router()?;
//!
//!     simple_restful::server::serve(router, &config).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod cors;
pub mod error;
pub mod exception;
pub mod interceptor;
pub mod request;
pub mod resource;
pub mod response;
pub mod route;
pub mod server;

// Re-export core types
pub use api::{Api, HTTP_METHODS, RouteEntry, RouteTable};
pub use config::{ConfigService, ServerConfig};
pub use cors::{CorsLayer, CorsPolicy};
pub use error::{RestfulError, Result};
pub use request::{PathArgs, Request};
pub use resource::{Endpoint, Resource};
pub use response::{IntoHeaders, IntoReply, IntoStatus, Reply};
pub use route::{ParamSpec, ParamType, Params, PathParam, RawSegment, RouteTemplate};

// Re-export macros
pub use simple_restful_macro::resource;

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;
pub use axum::http;

/// Prelude module for convenient imports
///
/// ```
/// use simple_restful::prelude::*;
/// ```
pub mod prelude {
    pub use crate::api::{Api, RouteTable};
    pub use crate::config::{ConfigService, ServerConfig};
    pub use crate::cors::CorsPolicy;
    pub use crate::error::{RestfulError, Result};
    pub use crate::exception::{ExceptionFilter, http::HttpExceptionFilter};
    pub use crate::interceptor::{Interceptor, InterceptorResult, LoggingInterceptor, Next};
    pub use crate::request::{PathArgs, Request};
    pub use crate::resource::{Endpoint, Resource};
    pub use crate::response::{IntoReply, Reply};
    pub use crate::route::{ParamType, Params, RawSegment};
    pub use crate::resource;
    pub use async_trait::async_trait;
    pub use axum::{
        Json, Router,
        http::{HeaderMap, Method, StatusCode},
        response::{IntoResponse, Response},
    };
    pub use serde_json::{Value, json};
    pub use std::sync::Arc;
}
