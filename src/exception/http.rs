use crate::error::RestfulError;
use crate::exception::ExceptionFilter;
use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// A default exception filter rendering errors as JSON
#[derive(Debug, Clone, Default)]
pub struct HttpExceptionFilter {
    debug: bool,
}

impl HttpExceptionFilter {
    /// In debug mode the body also carries the error's debug representation.
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }
}

impl ExceptionFilter for HttpExceptionFilter {
    fn catch(&self, error: RestfulError) -> Response {
        let status = error.status_code();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %error, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %error, "Request rejected");
        }

        let message = if status.is_server_error() && !self.debug {
            status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string()
        } else {
            error.to_string()
        };

        let mut body = json!({
            "statusCode": status.as_u16(),
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        if self.debug {
            body["detail"] = json!(format!("{:?}", error));
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_client_error_keeps_message() {
        let response = HttpExceptionFilter::default().catch(RestfulError::NotFound {
            path: "/v0.9/todos/x".into(),
        });
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_of(response).await;
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["message"], "Not found: /v0.9/todos/x");
        assert!(body["timestamp"].is_string());
        assert!(body.get("detail").is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_masked_unless_debug() {
        let masked = HttpExceptionFilter::default()
            .catch(anyhow::anyhow!("connection string leaked").into());
        assert_eq!(masked.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(masked).await["message"], "Internal Server Error");

        let verbose =
            HttpExceptionFilter::new(true).catch(anyhow::anyhow!("connection string leaked").into());
        let body = body_of(verbose).await;
        assert_eq!(body["message"], "connection string leaked");
        assert!(body["detail"].is_string());
    }
}
