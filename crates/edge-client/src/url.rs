//! Request URL construction.

/// Join `base` and `path` into a request URL.
///
/// An empty path means `/`, and a leading `/` is added when missing. Runs of
/// slashes are then collapsed to one, except right after a `:` so the
/// scheme separator survives.
pub fn build_url(base: &str, path: &str) -> String {
    let path = if path.is_empty() { "/" } else { path };
    let joined = if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    };
    collapse_slashes(&joined)
}

fn collapse_slashes(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        if c == '/' && out.ends_with('/') {
            let before = out[..out.len() - 1].chars().next_back();
            if before.is_some_and(|b| b != ':') {
                continue;
            }
        }
        out.push(c);
    }
    out
}
