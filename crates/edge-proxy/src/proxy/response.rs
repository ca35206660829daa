//! Backend response decoding and translation back to the caller.

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::error::ForwardError;

const TEXT_FALLBACK_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Decoded backend reply.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub payload: BackendPayload,
}

/// Body of a backend reply, decoded according to its content type.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendPayload {
    Json(serde_json::Value),
    Text(String),
}

/// Whether a content-type header value announces JSON.
///
/// Substring check, so parameters such as `; charset=utf-8` are accepted.
pub fn is_json_content_type(value: &str) -> bool {
    value.to_ascii_lowercase().contains("application/json")
}

impl BackendResponse {
    /// Read and decode the full body of a backend response.
    ///
    /// The decision is driven by the content type alone; error statuses are
    /// decoded the same way as successes. An empty body under a JSON content
    /// type (HEAD replies, 204) is kept as empty text.
    pub async fn read(response: reqwest::Response) -> Result<Self, ForwardError> {
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let is_json = content_type.as_deref().is_some_and(is_json_content_type);
        let text = response.text().await?;

        let payload = if is_json && !text.trim().is_empty() {
            BackendPayload::Json(serde_json::from_str(&text).map_err(ForwardError::MalformedJson)?)
        } else {
            BackendPayload::Text(text)
        };

        Ok(Self {
            status,
            content_type,
            payload,
        })
    }
}

impl IntoResponse for BackendResponse {
    fn into_response(self) -> Response {
        match self.payload {
            BackendPayload::Json(value) => (self.status, Json(value)).into_response(),
            BackendPayload::Text(text) => {
                let content_type = self
                    .content_type
                    .as_deref()
                    .and_then(|ct| HeaderValue::from_str(ct).ok())
                    .unwrap_or_else(|| HeaderValue::from_static(TEXT_FALLBACK_CONTENT_TYPE));

                Response::builder()
                    .status(self.status)
                    .header(CONTENT_TYPE, content_type)
                    .body(Body::from(text))
                    .unwrap_or_else(|e| {
                        tracing::error!(error = %e, "Failed to build response");
                        (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
                    })
            }
        }
    }
}
