use axum::response::Response;

use crate::error::RestfulError;

pub mod http;

/// The ExceptionFilter trait
///
/// Filters turn errors raised while routing or running a handler into the
/// response sent to the client. They must return a valid Response.
pub trait ExceptionFilter: Send + Sync + 'static {
    /// Catch an exception and return a response
    fn catch(&self, error: RestfulError) -> Response;
}
