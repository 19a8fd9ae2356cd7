use std::path::PathBuf;

use lead_relay_core::config::load_config;
use lead_relay_core::relay::config::build_http_client;

pub fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let mut problems = Vec::new();

    if !config.completion.has_api_key() {
        problems.push("OPENAI_API_KEY is not set".to_string());
    }
    if let Err(e) = build_http_client(&config.proxy) {
        problems.push(e.to_string());
    }
    if config.telegram.bot_token.is_empty() || config.telegram.chat_ids.is_empty() {
        tracing::warn!("Telegram is not fully configured; leads will not be notified");
    }

    if problems.is_empty() {
        println!("Configuration OK");
        return Ok(());
    }

    for problem in &problems {
        eprintln!("  - {}", problem);
    }
    anyhow::bail!("{} configuration problem(s) found", problems.len())
}
