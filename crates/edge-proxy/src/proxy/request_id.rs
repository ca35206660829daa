//! Request ID generation for correlating logs with responses.

use uuid::Uuid;

/// Response header carrying the ID of the forward that produced it.
pub const REQUEST_ID_HEADER: &str = "x-edge-request-id";

/// Generate a new request ID (UUID v4).
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
