//! Bounded-wait requests against the configured base.

use std::error::Error as _;

use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::{json, Value};
use tracing::Instrument;

use crate::config::{ClientConfig, ConfigSnapshot};
use crate::error::ClientError;
use crate::result::{FailureReason, SafeResult};
use crate::url::build_url;

/// Body of an outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Sent as-is.
    Text(String),
    /// Serialized as JSON text.
    Json(Value),
}

impl RequestBody {
    fn into_text(self) -> String {
        match self {
            RequestBody::Text(text) => text,
            RequestBody::Json(value) => value.to_string(),
        }
    }
}

impl From<Value> for RequestBody {
    fn from(value: Value) -> Self {
        RequestBody::Json(value)
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

/// Method, headers and body of one request. Defaults to a bare GET.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub method: Method,
    /// Merged over the default `content-type: application/json`.
    pub headers: HeaderMap,
    /// Ignored for GET and HEAD.
    pub body: Option<RequestBody>,
}

impl FetchOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: impl Into<RequestBody>) -> Self {
        Self {
            method: Method::POST,
            body: Some(body.into()),
            ..Self::default()
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Client for the edge proxy (or any backend speaking the same contract).
#[derive(Clone)]
pub struct EdgeClient {
    http: reqwest::Client,
    config: ClientConfig,
    base: Option<String>,
}

impl EdgeClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().build()?;
        Self::with_http_client(config, http)
    }

    /// Build a client around an existing `reqwest::Client`.
    pub fn with_http_client(
        config: ClientConfig,
        http: reqwest::Client,
    ) -> Result<Self, ClientError> {
        if config.timeout_ms == 0 {
            return Err(ClientError::ZeroTimeout);
        }

        let base = config.resolve_base();
        match &base {
            Some(base) => tracing::info!(base = %base, "Edge client loaded"),
            None => tracing::warn!("Edge client loaded without a domain, requests are disabled"),
        }

        Ok(Self { http, config, base })
    }

    /// The resolved base URL, if a domain is configured.
    pub fn get_base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn config(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            config: self.config.clone(),
            base: self.base.clone(),
        }
    }

    /// Send one request and normalize whatever happens into a `SafeResult`.
    pub async fn safe_fetch(&self, path: &str, options: FetchOptions) -> SafeResult {
        let Some(base) = self.base.as_deref() else {
            return SafeResult::ConfigMissing;
        };

        let url = build_url(base, path);
        let FetchOptions {
            method,
            headers: extra_headers,
            body,
        } = options;
        let span = edge_tracing::client_fetch_span!(method, url);

        async {
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            headers.extend(extra_headers);

            let mut req_builder = self.http.request(method.clone(), &url).headers(headers);
            if !is_bodyless(&method) {
                if let Some(body) = body {
                    req_builder = req_builder.body(body.into_text());
                }
            }

            tracing::debug!("Sending request");

            let exchange = async {
                let response = req_builder.send().await?;
                let status = response.status().as_u16();
                let text = response.text().await?;
                Ok::<_, reqwest::Error>((status, text))
            };

            let result = match tokio::time::timeout(self.config.timeout(), exchange).await {
                Ok(Ok((status, text))) => {
                    tracing::Span::current().record("status", status);
                    return normalize(status, text);
                }
                Ok(Err(e)) => SafeResult::Unreachable {
                    reason: classify(&e),
                    error: error_chain(&e),
                },
                Err(_) => SafeResult::Unreachable {
                    reason: FailureReason::Timeout,
                    error: format!("no response within {} ms", self.config.timeout_ms),
                },
            };

            if let SafeResult::Unreachable { reason, error } = &result {
                tracing::Span::current().record("reason", reason.as_str());
                tracing::warn!(reason = %reason, error = %error, "Fetch failed");
            }
            result
        }
        .instrument(span)
        .await
    }

    /// GET `/`.
    pub async fn status(&self) -> SafeResult {
        self.safe_fetch("/", FetchOptions::get()).await
    }

    /// POST `/connect` with the session name and phone number.
    pub async fn connect(&self, name: &str, phone: &str) -> SafeResult {
        if is_blank(name) || is_blank(phone) {
            return SafeResult::MissingArgument {
                message: "name & phone required",
            };
        }
        self.safe_fetch(
            "/connect",
            FetchOptions::post(json!({ "name": name, "phone": phone })),
        )
        .await
    }

    /// POST `/disconnect` for the named session.
    pub async fn disconnect(&self, name: &str) -> SafeResult {
        if is_blank(name) {
            return SafeResult::MissingArgument {
                message: "name required",
            };
        }
        self.safe_fetch("/disconnect", FetchOptions::post(json!({ "name": name })))
            .await
    }

    /// POST `/send`: send `text` to `to` from the named session.
    pub async fn send_message(&self, name: &str, to: &str, text: &str) -> SafeResult {
        if is_blank(name) || is_blank(to) || is_blank(text) {
            return SafeResult::MissingArgument {
                message: "name,to,text required",
            };
        }
        self.safe_fetch(
            "/send",
            FetchOptions::post(json!({ "name": name, "to": to, "text": text })),
        )
        .await
    }

    /// GET `/sessions`.
    pub async fn list_sessions(&self) -> SafeResult {
        self.safe_fetch("/sessions", FetchOptions::get()).await
    }
}

fn is_bodyless(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Read the body as JSON if it is JSON; otherwise keep the raw text.
fn normalize(http_status: u16, text: String) -> SafeResult {
    match serde_json::from_str::<Value>(&text) {
        Ok(body) => SafeResult::Success { http_status, body },
        Err(_) => SafeResult::InvalidJson {
            raw: text,
            http_status,
        },
    }
}

/// Map a transport error to the reason reported to the caller.
///
/// TLS detection only looks at the sources, since the outer message carries
/// the request URL.
fn classify(err: &reqwest::Error) -> FailureReason {
    if err.is_timeout() {
        FailureReason::Timeout
    } else if is_tls_failure(&source_chain(err)) {
        FailureReason::SslError
    } else if err.is_connect() || err.is_request() {
        FailureReason::NetworkFail
    } else {
        FailureReason::Unknown
    }
}

fn is_tls_failure(text: &str) -> bool {
    let text = text.to_ascii_lowercase();
    ["certificate", "tls", "ssl", "handshake"]
        .iter()
        .any(|needle| text.contains(needle))
}

/// Messages of the error's sources, joined with `": "`.
fn source_chain(err: &reqwest::Error) -> String {
    let mut parts = Vec::new();
    let mut source = err.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}

/// The error followed by its sources.
fn error_chain(err: &reqwest::Error) -> String {
    let sources = source_chain(err);
    if sources.is_empty() {
        err.to_string()
    } else {
        format!("{err}: {sources}")
    }
}
