//! Span builder helpers for edge-proxy and edge-client instrumentation.

/// Create a tracing span for one forward from the proxy to the backend.
///
/// Usage: `let span = forward_span!(request_id, method, target);`
///
/// `status` and `latency_ms` are recorded once the backend exchange ends.
#[macro_export]
macro_rules! forward_span {
    ($request_id:expr, $method:expr, $target:expr) => {
        tracing::info_span!(
            "forward",
            request_id = %$request_id,
            method = %$method,
            target = %$target,
            status = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
        )
    };
}

/// Create a tracing span for one client helper fetch.
#[macro_export]
macro_rules! client_fetch_span {
    ($method:expr, $url:expr) => {
        tracing::debug_span!(
            "client_fetch",
            method = %$method,
            url = %$url,
            status = tracing::field::Empty,
            reason = tracing::field::Empty,
        )
    };
}
