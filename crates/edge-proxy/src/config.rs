//! Configuration types and loading logic.

use std::time::Duration;

use edge_tracing::TracingConfig;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

/// Top-level proxy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub forward: ForwardConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
}

/// Server listen configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Largest inbound body accepted before the request is rejected.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Answer CORS preflights locally with a permissive policy.
    #[serde(default)]
    pub cors: bool,
}

/// The fixed backend origin every request is forwarded to.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend, e.g. `http://10.0.0.5:22271`.
    /// Can also be set with `--backend-url`.
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Behavior of a single forward.
#[derive(Debug, Clone, Deserialize)]
pub struct ForwardConfig {
    /// Routing prefix stripped from inbound paths.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default = "default_true")]
    pub enable_timeout: bool,

    #[serde(default = "default_forward_timeout_ms")]
    pub timeout_ms: u64,

    /// Send `{}` for non-GET/HEAD requests that arrive without a body.
    #[serde(default = "default_true")]
    pub default_body_when_missing: bool,

    /// Add the error source chain to 500 response bodies.
    #[serde(default)]
    pub include_stack_in_error: bool,
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),

    #[error("backend.base_url is not set (config file, EDGE_BACKEND__BASE_URL or --backend-url)")]
    MissingBackendUrl,

    #[error("backend.base_url {0:?} is not a valid http(s) URL")]
    InvalidBackendUrl(String),

    #[error("forward.timeout_ms must be greater than zero")]
    ZeroTimeout,

    #[error("forward.prefix {0:?} must be empty or start with '/'")]
    InvalidPrefix(String),
}

fn default_listen_address() -> String {
    "0.0.0.0:3080".to_string()
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_prefix() -> String {
    "/api/proxy".to_string()
}

fn default_true() -> bool {
    true
}

fn default_forward_timeout_ms() -> u64 {
    15_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            max_body_bytes: default_max_body_bytes(),
            cors: false,
        }
    }
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            enable_timeout: true,
            timeout_ms: default_forward_timeout_ms(),
            default_body_when_missing: true,
            include_stack_in_error: false,
        }
    }
}

impl ForwardConfig {
    /// The bound on one backend exchange, or `None` when timeouts are disabled.
    pub fn timeout(&self) -> Option<Duration> {
        self.enable_timeout
            .then(|| Duration::from_millis(self.timeout_ms))
    }
}

impl ProxyConfig {
    /// Load configuration from TOML file and environment variables.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (EDGE_ prefix, __ for nesting)
    /// 2. TOML config file
    /// 3. Defaults
    pub fn load(config_path: &str) -> Result<Self, ConfigError> {
        let config: ProxyConfig = Figment::new()
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("EDGE_").split("__"))
            .extract()?;

        Ok(config)
    }

    /// Check the invariants the forwarder relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self
            .backend
            .base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingBackendUrl)?;

        match reqwest::Url::parse(base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => return Err(ConfigError::InvalidBackendUrl(base_url.to_string())),
        }

        if self.forward.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let prefix = &self.forward.prefix;
        if !prefix.is_empty() && !prefix.starts_with('/') {
            return Err(ConfigError::InvalidPrefix(prefix.clone()));
        }

        Ok(())
    }

    /// The validated backend base URL.
    pub fn backend_url(&self) -> Result<&str, ConfigError> {
        self.validate()?;
        self.backend
            .base_url
            .as_deref()
            .ok_or(ConfigError::MissingBackendUrl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = ProxyConfig::load("missing.toml").unwrap();
            assert_eq!(config.server.listen_address, "0.0.0.0:3080");
            assert_eq!(config.forward.prefix, "/api/proxy");
            assert_eq!(config.forward.timeout_ms, 15_000);
            assert!(config.forward.enable_timeout);
            assert!(config.forward.default_body_when_missing);
            assert!(!config.forward.include_stack_in_error);
            assert!(config.backend.base_url.is_none());
            Ok(())
        });
    }

    #[test]
    fn test_toml_then_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "edge-proxy.toml",
                r#"
                [server]
                listen_address = "127.0.0.1:9000"

                [backend]
                base_url = "http://10.0.0.5:22271"

                [forward]
                prefix = "/relay"
                timeout_ms = 2000

                [tracing]
                log_level = "debug"
                format = "json"
                "#,
            )?;
            jail.set_env("EDGE_FORWARD__TIMEOUT_MS", "500");

            let config = ProxyConfig::load("edge-proxy.toml").unwrap();
            assert_eq!(config.server.listen_address, "127.0.0.1:9000");
            assert_eq!(config.backend_url().unwrap(), "http://10.0.0.5:22271");
            assert_eq!(config.forward.prefix, "/relay");
            assert_eq!(config.forward.timeout_ms, 500);
            assert_eq!(config.tracing.format, edge_tracing::LogFormat::Json);
            Ok(())
        });
    }

    #[test]
    fn test_timeout_disabled() {
        let config = ForwardConfig {
            enable_timeout: false,
            ..ForwardConfig::default()
        };
        assert_eq!(config.timeout(), None);
        assert_eq!(
            ForwardConfig::default().timeout(),
            Some(Duration::from_millis(15_000))
        );
    }

    fn config_with_backend(url: Option<&str>) -> ProxyConfig {
        ProxyConfig {
            server: ServerConfig::default(),
            backend: BackendConfig {
                base_url: url.map(str::to_string),
            },
            forward: ForwardConfig::default(),
            tracing: TracingConfig::default(),
        }
    }

    #[test]
    fn test_validate_requires_backend() {
        let err = config_with_backend(None).validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingBackendUrl));

        let err = config_with_backend(Some("  ")).validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingBackendUrl));
    }

    #[test]
    fn test_validate_rejects_non_http_backend() {
        let err = config_with_backend(Some("ftp://example.com"))
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBackendUrl(_)));

        let err = config_with_backend(Some("not a url")).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBackendUrl(_)));
    }

    #[test]
    fn test_validate_zero_timeout_and_prefix() {
        let mut config = config_with_backend(Some("http://localhost:8080"));
        config.validate().unwrap();

        config.forward.timeout_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroTimeout)));

        config.forward.timeout_ms = 10;
        config.forward.prefix = "api".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPrefix(_))
        ));

        config.forward.prefix = String::new();
        config.validate().unwrap();
    }
}
