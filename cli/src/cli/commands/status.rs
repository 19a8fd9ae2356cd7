use std::path::PathBuf;

use lead_relay_core::config::{default_config_path, load_config, mask_secret};
use lead_relay_core::relay::config::describe_proxy;

pub async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    println!("Lead Relay Status");
    println!("=================");
    println!();
    println!("Configuration:");
    println!("  Default config file: {:?}", default_config_path());
    println!();
    println!("Server settings:");
    println!("  Service: {}", config.server.service_name);
    println!("  Host: {}", config.server.host);
    println!("  Port: {}", config.server.port);
    println!();
    println!("Completion API:");
    println!("  Base URL: {}", config.completion.base_url);
    println!("  Model: {}", config.completion.model);
    println!("  API key: {}", mask_secret(&config.completion.api_key));
    println!("  Streaming endpoint: {}", config.completion.enable_streaming);
    println!("  Retry timeouts (s): {:?}", config.retry.attempt_timeouts_secs);
    println!("  Outbound routing: {}", describe_proxy(&config.proxy));
    println!();
    println!("Leads:");
    println!("  Bot token: {}", mask_secret(&config.telegram.bot_token));
    println!("  Recipients: {}", config.telegram.chat_ids.len());
    println!("  Forward URL: {}", config.lead.forward_url.as_deref().unwrap_or("(not set)"));

    // Check if server is reachable
    println!();
    let host = if config.server.host == "0.0.0.0" { "127.0.0.1" } else { config.server.host.as_str() };
    let url = format!("http://{}:{}/health", host, config.server.port);
    match reqwest::get(&url).await {
        Ok(resp) if resp.status().is_success() => {
            let body: serde_json::Value = resp.json().await.unwrap_or_default();
            println!("Server: RUNNING ✓ (version {})", body["version"].as_str().unwrap_or("?"));
        }
        _ => {
            println!("Server: NOT RUNNING");
        }
    }

    Ok(())
}
