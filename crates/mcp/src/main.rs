//! Tienda Nube MCP server binary.
//!
//! ```bash
//! # Credentials from the environment
//! TIENDANUBE_STORE_ID=123456 TIENDANUBE_ACCESS_TOKEN=... tiendanube-mcp
//!
//! # Without credentials; the client calls tiendanube_authenticate first
//! tiendanube-mcp
//! ```

use std::sync::Arc;

use anyhow::Result;
use tiendanube_client::StoreClient;
use tiendanube_core::{AppConfig, LoadOptions, LogFormat};
use tiendanube_mcp::TiendanubeMcpServer;
use tracing_subscriber::EnvFilter;

/// Logs go to stderr; stdout carries the protocol.
fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let client = StoreClient::from_config(&config)?;
    let server = TiendanubeMcpServer::new(Arc::new(client))?;

    tracing::info!(
        event_name = "system.mcp.started",
        correlation_id = "bootstrap",
        tools = server.registry().len(),
        has_credentials = config.store.has_credentials(),
        base_url = %config.api.base_url,
        "tiendanube-mcp started"
    );

    server.run_stdio().await
}
