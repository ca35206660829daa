//! Forward failures and their gateway error responses.

use std::error::Error as _;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Message returned to the caller when the backend is too slow.
pub const GATEWAY_TIMEOUT_MESSAGE: &str =
    "The backend did not respond in time. Please try again later.";

/// Why a forward produced no backend response.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("backend did not respond within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("backend request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("backend returned malformed JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),
}

impl ForwardError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ForwardError::Timeout { .. })
    }

    /// Status code reported to the caller.
    pub fn status(&self) -> StatusCode {
        if self.is_timeout() {
            StatusCode::GATEWAY_TIMEOUT
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Messages of every error in the source chain, outermost first.
    pub fn chain(&self) -> Vec<String> {
        let mut chain = vec![self.to_string()];
        let mut source = self.source();
        while let Some(err) = source {
            chain.push(err.to_string());
            source = err.source();
        }
        chain
    }

    /// Build the JSON error response for the caller.
    pub fn to_response(&self, include_stack: bool) -> Response {
        let body = if self.is_timeout() {
            json!({
                "success": false,
                "error": "Gateway Timeout",
                "message": GATEWAY_TIMEOUT_MESSAGE,
            })
        } else {
            let mut body = json!({
                "success": false,
                "error": "Proxy Error",
                "message": self.to_string(),
            });
            if include_stack {
                body["stack"] = json!(self.chain());
            }
            body
        };

        (self.status(), Json(body)).into_response()
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> Response {
        self.to_response(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn malformed() -> ForwardError {
        let err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        ForwardError::MalformedJson(err)
    }

    #[tokio::test]
    async fn test_timeout_is_504() {
        let response = ForwardError::Timeout { timeout_ms: 15_000 }.into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            body_json(response).await,
            json!({
                "success": false,
                "error": "Gateway Timeout",
                "message": GATEWAY_TIMEOUT_MESSAGE,
            })
        );
    }

    #[tokio::test]
    async fn test_other_errors_are_500() {
        let response = malformed().into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Proxy Error");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("backend returned malformed JSON"));
        assert!(body.get("stack").is_none());
    }

    #[tokio::test]
    async fn test_stack_included_on_request() {
        let body = body_json(malformed().to_response(true)).await;
        let stack = body["stack"].as_array().unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack[0], body["message"]);
    }

    #[tokio::test]
    async fn test_timeout_never_carries_stack() {
        let body = body_json(ForwardError::Timeout { timeout_ms: 1 }.to_response(true)).await;
        assert!(body.get("stack").is_none());
    }
}
