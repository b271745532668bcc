use axum::http::{Method, StatusCode};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RestfulError>;

#[derive(Debug, Error)]
pub enum RestfulError {
    #[error("Invalid route template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("Route conflict: {name}")]
    RouteConflict { name: String },

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(Method),

    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("Path parameter '{name}' is not captured by this route")]
    MissingParam { name: String },

    #[error("Invalid value '{value}' for path parameter '{name}'")]
    InvalidParam { name: String, value: String },

    #[error("Invalid request body: {reason}")]
    InvalidBody { reason: String },

    #[error("{message}")]
    Http { status: StatusCode, message: String },

    #[error("Invalid status code: {0}")]
    InvalidStatus(i64),

    #[error("Invalid response header '{name}'")]
    InvalidHeader { name: String },

    #[error("Failed to serialize response body: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration value for {key}: '{value}'")]
    Config { key: String, value: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl RestfulError {
    /// Error carrying a status chosen by the handler, e.g. a 404 for a missing record.
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        RestfulError::Http {
            status,
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RestfulError::NotFound { .. } => StatusCode::NOT_FOUND,
            RestfulError::InvalidParam { .. } | RestfulError::InvalidBody { .. } => {
                StatusCode::BAD_REQUEST
            }
            RestfulError::Http { status, .. } => *status,
            RestfulError::InvalidTemplate { .. }
            | RestfulError::RouteConflict { .. }
            | RestfulError::UnsupportedMethod(_)
            | RestfulError::MissingParam { .. }
            | RestfulError::InvalidStatus(_)
            | RestfulError::InvalidHeader { .. }
            | RestfulError::Serialization(_)
            | RestfulError::Config { .. }
            | RestfulError::Io(_)
            | RestfulError::Watch(_)
            | RestfulError::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn template(template: &str, reason: impl Into<String>) -> Self {
        RestfulError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.into(),
        }
    }
}

impl axum::response::IntoResponse for RestfulError {
    fn into_response(self) -> axum::response::Response {
        use crate::exception::ExceptionFilter;

        crate::exception::http::HttpExceptionFilter::default().catch(self)
    }
}
