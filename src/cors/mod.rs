//! Permissive CORS headers on every outgoing response.
//!
//! The headers are written after the inner service has produced its
//! response, so routing errors, handler errors and passthrough responses are
//! covered the same way as regular replies.

use axum::http::{HeaderMap, HeaderValue, header};

mod layer;

pub use layer::{CorsLayer, CorsService};

pub const DEFAULT_ALLOW_METHODS: &str = "POST, PUT, PATCH, DELETE, OPTIONS, GET";
pub const DEFAULT_ALLOW_HEADERS: &str =
    "X-Requested-With,X-Prototype-Version,Content-Type,Cache-Control,Pragma,Origin,Cookie";
pub const DEFAULT_MAX_AGE: u64 = 3600;

/// Values written into the `Access-Control-*` response headers.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    pub allow_credentials: bool,
    pub allow_methods: HeaderValue,
    pub allow_headers: HeaderValue,
    pub max_age: u64,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allow_credentials: true,
            allow_methods: HeaderValue::from_static(DEFAULT_ALLOW_METHODS),
            allow_headers: HeaderValue::from_static(DEFAULT_ALLOW_HEADERS),
            max_age: DEFAULT_MAX_AGE,
        }
    }
}

impl CorsPolicy {
    /// Overwrite the CORS headers of `headers`, echoing `origin` or `*`.
    pub fn apply(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        let origin = origin
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("*"));
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static(if self.allow_credentials { "true" } else { "false" }),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            self.allow_methods.clone(),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            self.allow_headers.clone(),
        );
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(self.max_age));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_without_origin() {
        let mut headers = HeaderMap::new();
        CorsPolicy::default().apply(None, &mut headers);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_METHODS],
            DEFAULT_ALLOW_METHODS
        );
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
            DEFAULT_ALLOW_HEADERS
        );
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "3600");
    }

    #[test]
    fn test_origin_is_reflected_and_overwrites() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("https://stale.example"),
        );
        let origin = HeaderValue::from_static("https://app.example");
        CorsPolicy::default().apply(Some(&origin), &mut headers);
        assert_eq!(
            headers.get_all(header::ACCESS_CONTROL_ALLOW_ORIGIN).iter().count(),
            1
        );
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example"
        );
    }
}
