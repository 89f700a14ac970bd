//! Envelope response format for all API responses.
//!
//! Every response is wrapped in a consistent envelope:
//! ```json
//! {
//!   "data": { ... },
//!   "meta": { "request_id": "...", "timestamp": "...", "response_time_ms": 5 },
//!   "errors": [],
//!   "_links": { "self": "..." }
//! }
//! ```

use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Envelope response wrapping all API data.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// The main response payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Request metadata.
    pub meta: ApiMeta,

    /// Error list (empty on success).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ApiErrorDetail>,

    /// HATEOAS-style links for discoverability.
    #[serde(rename = "_links", skip_serializing_if = "HashMap::is_empty")]
    pub links: HashMap<String, String>,
}

/// Metadata included in every response.
#[derive(Debug, Serialize)]
pub struct ApiMeta {
    /// Unique request identifier for tracing.
    pub request_id: String,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
    /// Response time in milliseconds.
    pub response_time_ms: u64,
}

/// Individual error detail.
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

fn meta(request_id: String, response_time_ms: u64) -> ApiMeta {
    ApiMeta {
        request_id,
        timestamp: chrono::Utc::now().to_rfc3339(),
        response_time_ms,
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response with data.
    pub fn success(data: T, request_id: String, response_time_ms: u64) -> Self {
        Self {
            data: Some(data),
            meta: meta(request_id, response_time_ms),
            errors: Vec::new(),
            links: HashMap::new(),
        }
    }

    /// Add a HATEOAS link.
    pub fn with_link(mut self, rel: &str, href: &str) -> Self {
        self.links.insert(rel.to_string(), href.to_string());
        self
    }
}

impl ApiResponse<()> {
    /// Create an error response (no data).
    pub fn error(code: &str, message: &str, details: Option<serde_json::Value>) -> Self {
        Self {
            data: None,
            meta: meta(uuid::Uuid::now_v7().to_string(), 0),
            errors: vec![ApiErrorDetail {
                code: code.to_string(),
                message: message.to_string(),
                details,
            }],
            links: HashMap::new(),
        }
    }
}

/// HTTP status for an envelope error code.
pub fn status_for_code(code: &str) -> StatusCode {
    match code {
        "SESSION_NOT_FOUND" | "NOT_FOUND" => StatusCode::NOT_FOUND,
        "SESSION_NOT_EDITABLE" | "CONFLICT" => StatusCode::CONFLICT,
        "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
        "TRANSPORT_ERROR" => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self
            .errors
            .first()
            .map(|e| status_for_code(&e.code))
            .unwrap_or(StatusCode::OK);

        let body = serde_json::to_string(&self).unwrap_or_else(|_| {
            r#"{"errors":[{"code":"SERIALIZATION_ERROR","message":"Failed to serialize response"}]}"#.to_string()
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let resp = ApiResponse::success(vec![1, 2], "req-1".to_string(), 4)
            .with_link("self", "/api/v1/sessions");
        let value = serde_json::to_value(&resp).unwrap();

        assert_eq!(value["data"], serde_json::json!([1, 2]));
        assert_eq!(value["meta"]["request_id"], "req-1");
        assert_eq!(value["_links"]["self"], "/api/v1/sessions");
        assert!(value.get("errors").is_none());
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(status_for_code("SESSION_NOT_FOUND"), StatusCode::NOT_FOUND);
        assert_eq!(status_for_code("SESSION_NOT_EDITABLE"), StatusCode::CONFLICT);
        assert_eq!(status_for_code("VALIDATION_ERROR"), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for_code("STORAGE_ERROR"),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        let resp = ApiResponse::error("CONFLICT", "taken", None).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }
}
