//! Logging setup and span helpers shared by edge-proxy and edge-client.

pub mod config;
pub mod init;
pub mod spans;

pub use config::{LogFormat, TracingConfig};
pub use init::init_tracing;
