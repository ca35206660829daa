//! Forwarding of one inbound request to the backend origin.
//!
//! One `Forwarder` serves every request: it rewrites the path, applies the
//! body and header policy, bounds the backend exchange with a timer and
//! translates the reply (or the failure) into the caller's response.

use std::time::Instant;

use axum::http::header::{ACCEPT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, HOST};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::Instrument;

use super::body::outbound_body;
use super::error::ForwardError;
use super::request_id::REQUEST_ID_HEADER;
use super::response::BackendResponse;
use super::rewrite::{is_under_prefix, rewrite_path, target_url};
use crate::config::ForwardConfig;

/// Headers that should NOT be forwarded (hop-by-hop headers).
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "transfer-encoding",
    "keep-alive",
    "upgrade",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
];

/// One request as it will be sent to the backend, before body policy.
#[derive(Debug, Clone)]
pub struct ForwardSpec {
    pub method: Method,
    /// Rewritten path including the query string.
    pub path: String,
    pub headers: HeaderMap,
    /// Inbound body; `None` when the request arrived without one.
    pub body: Option<Bytes>,
}

impl ForwardSpec {
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
            body: (!body.is_empty()).then_some(body),
        }
    }
}

/// Forwards requests to a fixed backend base URL.
#[derive(Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    backend_base: String,
    config: ForwardConfig,
}

impl Forwarder {
    pub fn new(
        client: reqwest::Client,
        backend_base: impl Into<String>,
        config: ForwardConfig,
    ) -> Self {
        let backend_base = backend_base.into().trim_end_matches('/').to_string();
        Self {
            client,
            backend_base,
            config,
        }
    }

    /// Derive the forward spec for an inbound request.
    pub fn spec_for(
        &self,
        method: Method,
        uri: &Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> ForwardSpec {
        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        ForwardSpec::new(
            method,
            rewrite_path(&self.config.prefix, path_and_query),
            headers,
            body,
        )
    }

    /// Whether the inbound request falls under the routing prefix.
    pub fn routes(&self, uri: &Uri) -> bool {
        is_under_prefix(&self.config.prefix, uri.path())
    }

    /// Full backend URL for a spec.
    pub fn target(&self, spec: &ForwardSpec) -> String {
        target_url(&self.backend_base, &spec.path)
    }

    /// Send the spec to the backend and decode its reply.
    ///
    /// The whole exchange (send and body read) runs under the configured
    /// bound. On expiry the in-flight request future is dropped, which
    /// aborts the connection.
    pub async fn forward(&self, spec: &ForwardSpec) -> Result<BackendResponse, ForwardError> {
        let url = self.target(spec);

        let mut req_builder = self.client.request(spec.method.clone(), &url);

        for (name, value) in spec.headers.iter() {
            if !should_forward_header(name) {
                continue;
            }
            req_builder = req_builder.header(name, value);
        }
        req_builder =
            req_builder.header(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(body) = outbound_body(
            &spec.method,
            spec.body.as_ref(),
            self.config.default_body_when_missing,
        ) {
            req_builder = req_builder.body(body);
        }

        let exchange = async {
            let response = req_builder.send().await?;
            BackendResponse::read(response).await
        };

        match self.config.timeout() {
            Some(limit) => tokio::time::timeout(limit, exchange)
                .await
                .map_err(|_| ForwardError::Timeout {
                    timeout_ms: self.config.timeout_ms,
                })?,
            None => exchange.await,
        }
    }

    /// Forward the spec and build the caller's response, including the
    /// gateway error bodies for timeouts and failures.
    pub async fn handle(&self, spec: ForwardSpec, request_id: &str) -> Response {
        let target = self.target(&spec);
        let span = edge_tracing::forward_span!(request_id, spec.method, target);
        let start = Instant::now();

        let mut response = async {
            let result = self.forward(&spec).await;
            let latency = start.elapsed().as_millis() as u64;
            tracing::Span::current().record("latency_ms", latency);

            match result {
                Ok(backend) => {
                    tracing::Span::current().record("status", backend.status.as_u16());
                    tracing::info!(
                        status = backend.status.as_u16(),
                        latency_ms = latency,
                        "Forward complete"
                    );
                    backend.into_response()
                }
                Err(e) => {
                    let status = e.status();
                    tracing::Span::current().record("status", status.as_u16());
                    if e.is_timeout() {
                        tracing::error!(error = %e, latency_ms = latency, "Backend timeout");
                    } else {
                        tracing::error!(error = %e, latency_ms = latency, "Forward failed");
                    }
                    e.to_response(self.config.include_stack_in_error)
                }
            }
        }
        .instrument(span)
        .await;

        if let Ok(value) = HeaderValue::from_str(request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
}

/// Inbound headers the forwarder sets or drops itself.
const REPLACED_HEADERS: [HeaderName; 4] = [HOST, CONTENT_LENGTH, CONTENT_TYPE, ACCEPT_ENCODING];

/// Inbound headers passed through to the backend.
///
/// `host` and `content-length` are recomputed for the outbound request and
/// `content-type` is always overridden. `accept-encoding` is dropped because
/// the reply body is decoded here and re-encoded for the caller.
fn should_forward_header(name: &HeaderName) -> bool {
    if REPLACED_HEADERS.contains(name) {
        return false;
    }
    !HOP_BY_HOP_HEADERS.contains(&name.as_str())
}
