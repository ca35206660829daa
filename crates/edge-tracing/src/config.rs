//! Tracing configuration types.

use serde::Deserialize;

/// Configuration for the logging subsystem.
#[derive(Debug, Clone, Deserialize)]
pub struct TracingConfig {
    /// Log level filter (e.g. "info", "debug", "edge_proxy=debug,info").
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format of the stderr log layer.
    #[serde(default)]
    pub format: LogFormat,
}

/// Log line format.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}
