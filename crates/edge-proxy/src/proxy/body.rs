//! Method-aware outbound body policy.

use axum::http::Method;
use bytes::Bytes;

const EMPTY_OBJECT: &[u8] = b"{}";

/// Whether requests with this method are forwarded without a body.
pub fn is_bodyless(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

/// Decide the body sent to the backend.
///
/// GET and HEAD never carry one. Any other method gets the inbound body
/// re-serialized as JSON, or `{}` when none arrived and
/// `default_when_missing` is set.
pub fn outbound_body(
    method: &Method,
    inbound: Option<&Bytes>,
    default_when_missing: bool,
) -> Option<Bytes> {
    if is_bodyless(method) {
        return None;
    }

    match inbound.filter(|bytes| !is_blank(bytes)) {
        Some(bytes) => Some(reserialize(bytes)),
        None if default_when_missing => Some(Bytes::from_static(EMPTY_OBJECT)),
        None => None,
    }
}

/// Serialize the inbound body as JSON text.
///
/// Valid JSON is re-encoded compactly; anything else is sent as a JSON
/// string literal holding the (lossily decoded) text.
fn reserialize(bytes: &Bytes) -> Bytes {
    let value = serde_json::from_slice::<serde_json::Value>(bytes).unwrap_or_else(|_| {
        serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
    });
    Bytes::from(value.to_string())
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}
