//! edge-proxy: forwards requests under a routing prefix to a fixed backend
//! origin and translates the backend's JSON or text reply back to the caller.

mod config;
mod proxy;
mod server;

use config::ProxyConfig;
use proxy::forward::Forwarder;
use server::AppState;

fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1).cloned())
        .or_else(|| args.get(1).filter(|a| !a.starts_with('-')).cloned())
        .or_else(|| std::env::var("EDGE_PROXY_CONFIG").ok())
        .unwrap_or_else(|| "edge-proxy.toml".to_string());

    let backend_url_override = args
        .iter()
        .position(|a| a == "--backend-url")
        .and_then(|i| args.get(i + 1).cloned());

    // Load configuration
    let mut config = ProxyConfig::load(&config_path)?;

    // CLI overrides take precedence over TOML and env vars
    if let Some(url) = backend_url_override {
        config.backend.base_url = Some(url);
    }
    config.validate()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        edge_tracing::init_tracing(&config.tracing);

        tracing::info!(
            config_path = %config_path,
            listen_address = %config.server.listen_address,
            backend_url = ?config.backend.base_url,
            prefix = %config.forward.prefix,
            timeout_ms = ?config.forward.timeout().map(|t| t.as_millis()),
            "Starting edge-proxy"
        );

        run(config).await
    })
}

async fn run(config: ProxyConfig) -> anyhow::Result<()> {
    // No client-level timeout: the forwarder bounds each exchange itself
    let client = reqwest::Client::builder().build()?;

    let forwarder = Forwarder::new(client, config.backend_url()?, config.forward.clone());

    let state = AppState { config, forwarder };

    server::run(state).await
}
