//! Inbound path to backend URL mapping.

/// Strip the routing `prefix` from the start of `path_and_query`.
///
/// Only a literal match at the very start is removed; anything else passes
/// through unchanged. An empty remainder becomes `/`.
pub fn rewrite_path(prefix: &str, path_and_query: &str) -> String {
    let rest = path_and_query
        .strip_prefix(prefix)
        .unwrap_or(path_and_query);
    if rest.is_empty() {
        "/".to_string()
    } else {
        rest.to_string()
    }
}

/// Whether `path` is routed to the backend at all.
pub fn is_under_prefix(prefix: &str, path: &str) -> bool {
    path.starts_with(prefix)
}

/// Join the backend base URL with an already rewritten path.
pub fn target_url(base: &str, rewritten: &str) -> String {
    format!("{}{rewritten}", base.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "/api/proxy";

    #[test]
    fn test_strips_prefix() {
        assert_eq!(rewrite_path(PREFIX, "/api/proxy/sessions"), "/sessions");
        assert_eq!(rewrite_path(PREFIX, "/api/proxy/a/b/c"), "/a/b/c");
    }

    #[test]
    fn test_bare_prefix_becomes_root() {
        assert_eq!(rewrite_path(PREFIX, "/api/proxy"), "/");
        assert_eq!(rewrite_path(PREFIX, "/api/proxy/"), "/");
    }

    #[test]
    fn test_query_is_kept() {
        assert_eq!(
            rewrite_path(PREFIX, "/api/proxy/send?dry=1&x=y"),
            "/send?dry=1&x=y"
        );
        assert_eq!(rewrite_path(PREFIX, "/api/proxy?x=1"), "?x=1");
    }

    #[test]
    fn test_prefix_only_matches_at_start() {
        assert_eq!(rewrite_path(PREFIX, "/other/api/proxy"), "/other/api/proxy");
        assert_eq!(rewrite_path(PREFIX, "/health"), "/health");
    }

    #[test]
    fn test_prefix_is_stripped_once() {
        assert_eq!(
            rewrite_path(PREFIX, "/api/proxy/api/proxy/x"),
            "/api/proxy/x"
        );
    }

    #[test]
    fn test_empty_prefix_is_identity() {
        assert_eq!(rewrite_path("", "/connect"), "/connect");
        assert_eq!(rewrite_path("", ""), "/");
    }

    #[test]
    fn test_under_prefix() {
        assert!(is_under_prefix(PREFIX, "/api/proxy"));
        assert!(is_under_prefix(PREFIX, "/api/proxy/sessions"));
        assert!(!is_under_prefix(PREFIX, "/sessions"));
        assert!(!is_under_prefix(PREFIX, "/api"));
        assert!(is_under_prefix("", "/anything"));
    }

    #[test]
    fn test_target_url() {
        assert_eq!(
            target_url("http://backend:22271", "/sessions"),
            "http://backend:22271/sessions"
        );
        assert_eq!(target_url("http://backend:22271/", "/"), "http://backend:22271/");
        assert_eq!(
            target_url("http://backend:22271", "?x=1"),
            "http://backend:22271?x=1"
        );
    }
}
