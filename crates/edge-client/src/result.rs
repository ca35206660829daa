//! Normalized outcome of a client request.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Value};

pub const NO_DOMAIN_CODE: &str = "NO_DOMAIN";
pub const NO_DOMAIN_MESSAGE: &str = "client domain is not configured";
pub const INVALID_JSON_MESSAGE: &str = "response is not valid JSON";
pub const UNREACHABLE_MESSAGE: &str = "failed to reach server";

/// Why the backend could not be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureReason {
    Timeout,
    NetworkFail,
    SslError,
    Unknown,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::Timeout => "TIMEOUT",
            FailureReason::NetworkFail => "NETWORK_FAIL",
            FailureReason::SslError => "SSL_ERROR",
            FailureReason::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one client call. Never an error: every failure mode is a
/// variant.
#[derive(Debug, Clone, PartialEq)]
pub enum SafeResult {
    /// The backend replied with parseable JSON (whatever its status).
    Success { http_status: u16, body: Value },
    /// The backend replied but the body is not JSON.
    InvalidJson { raw: String, http_status: u16 },
    /// No reply was received.
    Unreachable { reason: FailureReason, error: String },
    /// No base URL is configured; nothing was sent.
    ConfigMissing,
    /// A required argument was missing; nothing was sent.
    MissingArgument { message: &'static str },
}

impl SafeResult {
    /// HTTP status of the backend reply, if one was received.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            SafeResult::Success { http_status, .. }
            | SafeResult::InvalidJson { http_status, .. } => Some(*http_status),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            SafeResult::Unreachable { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Parsed backend JSON, if any.
    pub fn body(&self) -> Option<&Value> {
        match self {
            SafeResult::Success { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Render the flat object shape callers of the JSON surface expect.
    ///
    /// A JSON object reply gets `httpStatus` merged in (overriding any
    /// backend field of that name); other JSON values are wrapped as
    /// `{httpStatus, data}`.
    pub fn to_value(&self) -> Value {
        match self {
            SafeResult::Success { http_status, body } => match body {
                Value::Object(fields) => {
                    let mut merged = fields.clone();
                    merged.insert("httpStatus".to_string(), json!(http_status));
                    Value::Object(merged)
                }
                other => {
                    let mut wrapped = Map::new();
                    wrapped.insert("httpStatus".to_string(), json!(http_status));
                    wrapped.insert("data".to_string(), other.clone());
                    Value::Object(wrapped)
                }
            },
            SafeResult::InvalidJson { raw, http_status } => json!({
                "success": false,
                "message": INVALID_JSON_MESSAGE,
                "raw": raw,
                "httpStatus": http_status,
            }),
            SafeResult::Unreachable { reason, error } => json!({
                "success": false,
                "message": format!("{UNREACHABLE_MESSAGE}: {error}"),
                "reason": reason,
            }),
            SafeResult::ConfigMissing => json!({
                "success": false,
                "message": NO_DOMAIN_MESSAGE,
                "code": NO_DOMAIN_CODE,
            }),
            SafeResult::MissingArgument { message } => json!({
                "success": false,
                "message": message,
            }),
        }
    }
}

impl Serialize for SafeResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}
