//! Client configuration and base URL resolution.

use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Where the client sends requests and how long it waits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Base URL, e.g. `https://example.com/api/proxy`. `None` disables all
    /// requests.
    #[serde(default)]
    pub domain: Option<String>,

    /// Appended as `:<port>` when the domain carries no port of its own.
    #[serde(default)]
    pub port: Option<String>,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Configuration plus the base URL resolved from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSnapshot {
    #[serde(flatten)]
    pub config: ClientConfig,
    pub base: Option<String>,
}

fn default_timeout_ms() -> u64 {
    7_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            domain: None,
            port: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ClientConfig {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Load configuration from a TOML file and `EDGE_CLIENT_` environment
    /// variables (environment wins).
    pub fn load(config_path: &str) -> Result<Self, ClientError> {
        let config: ClientConfig = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("EDGE_CLIENT_"))
            .extract()?;

        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolve the base URL requests are built against.
    ///
    /// Trailing slashes are trimmed. The port is only appended when the
    /// domain, scheme removed, has no `:` yet.
    pub fn resolve_base(&self) -> Option<String> {
        let domain = self.domain.as_deref()?.trim();
        if domain.is_empty() {
            return None;
        }

        let mut base = domain.trim_end_matches('/').to_string();
        if let Some(port) = self.port.as_deref().filter(|p| !p.is_empty()) {
            if !strip_scheme(&base).contains(':') {
                base = format!("{base}:{port}");
            }
        }
        Some(base)
    }
}

fn strip_scheme(url: &str) -> &str {
    for scheme in ["https://", "http://"] {
        if let Some(head) = url.get(..scheme.len()) {
            if head.eq_ignore_ascii_case(scheme) {
                return &url[scheme.len()..];
            }
        }
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_no_domain_no_base() {
        assert_eq!(ClientConfig::default().resolve_base(), None);
        assert_eq!(ClientConfig::new("   ").resolve_base(), None);
    }

    #[test]
    fn test_trailing_slashes_trimmed() {
        let config = ClientConfig::new("https://example.com/api/proxy///");
        assert_eq!(
            config.resolve_base().as_deref(),
            Some("https://example.com/api/proxy")
        );
    }

    #[test]
    fn test_port_appended_when_absent() {
        let config = ClientConfig::new("http://bot.example.com").with_port("22271");
        assert_eq!(
            config.resolve_base().as_deref(),
            Some("http://bot.example.com:22271")
        );

        let config = ClientConfig::new("HTTPS://bot.example.com/").with_port("8443");
        assert_eq!(
            config.resolve_base().as_deref(),
            Some("HTTPS://bot.example.com:8443")
        );
    }

    #[test]
    fn test_existing_port_wins() {
        let config = ClientConfig::new("http://bot.example.com:9000").with_port("22271");
        assert_eq!(
            config.resolve_base().as_deref(),
            Some("http://bot.example.com:9000")
        );
    }

    #[test]
    fn test_empty_port_ignored() {
        let config = ClientConfig::new("https://example.com/api/proxy").with_port("");
        assert_eq!(
            config.resolve_base().as_deref(),
            Some("https://example.com/api/proxy")
        );
    }

    #[test]
    fn test_load_file_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "edge-client.toml",
                r#"
                domain = "https://example.com/api/proxy"
                timeout_ms = 6000
                "#,
            )?;
            jail.set_env("EDGE_CLIENT_PORT", "8080");

            let config = ClientConfig::load("edge-client.toml").unwrap();
            assert_eq!(config.domain.as_deref(), Some("https://example.com/api/proxy"));
            assert_eq!(config.port.as_deref(), Some("8080"));
            assert_eq!(config.timeout(), Duration::from_millis(6000));
            Ok(())
        });
    }

    #[test]
    fn test_load_defaults() {
        Jail::expect_with(|_jail| {
            let config = ClientConfig::load("absent.toml").unwrap();
            assert_eq!(config, ClientConfig::default());
            assert_eq!(config.timeout_ms, 7_000);
            Ok(())
        });
    }
}
