use std::path::PathBuf;

use lead_relay_core::config::load_config;
use lead_relay_core::relay::RelayServer;

pub async fn run(config_path: Option<PathBuf>, port_override: Option<u16>) -> anyhow::Result<()> {
    // Load configuration
    let mut config = load_config(config_path)?;

    // Apply port override if provided
    if let Some(port) = port_override {
        config.server.port = port;
    }

    tracing::info!("Starting Lead Relay...");
    tracing::info!("  Service: {}", config.server.service_name);
    tracing::info!("  Port: {}", config.server.port);
    tracing::info!("  Host: {}", config.server.host);
    tracing::info!("  Model: {}", config.completion.model);
    tracing::info!("  Telegram recipients: {}", config.telegram.chat_ids.len());
    tracing::info!("  Lead forwarding: {}", if config.lead.forward_url.is_some() { "on" } else { "off" });

    let host = config.server.host.clone();
    let port = config.server.port;
    let server = RelayServer::new(config)?;

    tracing::info!("Relay server starting on http://{}:{}", host, port);
    tracing::info!("Press Ctrl+C to stop");

    // Run server (blocks until shutdown)
    server.run().await?;

    Ok(())
}
