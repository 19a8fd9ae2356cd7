use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Relay configuration, built once at startup and never mutated afterwards
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub completion: CompletionConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub lead: LeadConfig,

    #[serde(default)]
    pub keepalive: KeepaliveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_service_name")]
    pub service_name: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            service_name: default_service_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_true")]
    pub enable_streaming: bool,

    #[serde(default = "default_stream_timeout")]
    pub stream_timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt(),
            enable_streaming: true,
            stream_timeout_secs: default_stream_timeout(),
        }
    }
}

impl CompletionConfig {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// One entry per attempt of the non-streaming chat call
    #[serde(default = "default_attempt_timeouts")]
    pub attempt_timeouts_secs: Vec<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempt_timeouts_secs: default_attempt_timeouts(),
        }
    }
}

/// Outbound forward proxy settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_proxy_scheme")]
    pub scheme: String,

    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scheme: default_proxy_scheme(),
            host: String::new(),
            port: None,
            user: String::new(),
            password: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,

    #[serde(default)]
    pub chat_ids: Vec<String>,

    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,

    #[serde(default = "default_outbound_timeout")]
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_ids: Vec::new(),
            api_base: default_telegram_api_base(),
            timeout_secs: default_outbound_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadConfig {
    #[serde(default)]
    pub forward_url: Option<String>,

    #[serde(default = "default_outbound_timeout")]
    pub timeout_secs: u64,
}

impl Default for LeadConfig {
    fn default() -> Self {
        Self {
            forward_url: None,
            timeout_secs: default_outbound_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeepaliveConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_keepalive_interval")]
    pub interval_secs: u64,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            url: None,
            interval_secs: default_keepalive_interval(),
        }
    }
}

// Default value functions
fn default_port() -> u16 { 3000 }
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_service_name() -> String { "creditmanager".to_string() }
fn default_base_url() -> String { "https://api.openai.com/v1".to_string() }
fn default_model() -> String { "gpt-4o-mini-2024-07-18".to_string() }
fn default_max_output_tokens() -> u32 { 80 }
fn default_temperature() -> f32 { 0.7 }
fn default_true() -> bool { true }
fn default_stream_timeout() -> u64 { 30 }
fn default_attempt_timeouts() -> Vec<u64> { vec![25, 30] }
fn default_proxy_scheme() -> String { "http".to_string() }
fn default_telegram_api_base() -> String { "https://api.telegram.org".to_string() }
fn default_outbound_timeout() -> u64 { 15 }
fn default_keepalive_interval() -> u64 { 240 }

fn default_system_prompt() -> String {
    "You are a credit manager helping entrepreneurs and companies obtain credit products. \
     Be polite and confident. Find out whether the client is a business, ask for the company \
     tax number and a contact phone, then confirm the request was passed on. \
     Answer briefly, in 1-2 sentences."
        .to_string()
}

/// Get default config file path
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("lead-relay")
        .join("config.toml")
}

/// Load config from file, or return defaults if not found.
///
/// Loading order:
/// 1. Specified path (if provided)
/// 2. ./config.toml (if exists)
/// 3. default_config_path() (usually ~/.config/lead-relay/config.toml)
///
/// Environment overrides are applied on top of whichever file was used.
pub fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    let mut config = load_config_file(path)?;
    config.apply_env_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

fn load_config_file(path: Option<PathBuf>) -> anyhow::Result<Config> {
    if let Some(config_path) = path {
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            tracing::info!("Loaded config from specified path {:?}", config_path);
            return Ok(config);
        } else {
            anyhow::bail!("Specified config file not found: {:?}", config_path);
        }
    }

    let local_config = PathBuf::from("config.toml");
    if local_config.exists() {
        match std::fs::read_to_string(&local_config) {
            Ok(content) => {
                match toml::from_str::<Config>(&content) {
                    Ok(config) => {
                        tracing::info!("Loaded config from current directory {:?}", local_config);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse ./config.toml: {}. Falling back to default path.", e);
                    }
                }
            }
            Err(e) => {
                tracing::error!("Failed to read ./config.toml: {}. Falling back to default path.", e);
            }
        }
    }

    let default_path = default_config_path();
    if default_path.exists() {
        let content = std::fs::read_to_string(&default_path)?;
        let config: Config = toml::from_str(&content)?;
        tracing::info!("Loaded config from default path {:?}", default_path);
        Ok(config)
    } else {
        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }
}

impl Config {
    /// Apply the deployment's environment variables on top of file values.
    /// Empty variables are ignored, except `LEAD_FORWARD_URL` and
    /// `KEEPALIVE_URL` where empty means "disabled".
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(port) = get("PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {}", port),
            }
        }
        if let Some(host) = get("HOST") {
            self.server.host = host;
        }

        if let Some(key) = get("OPENAI_API_KEY") {
            self.completion.api_key = key;
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.completion.base_url = url;
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.completion.model = model;
        }
        if let Some(prompt) = get("SYSTEM_PROMPT") {
            self.completion.system_prompt = prompt;
        }

        if let Some(host) = get("PROXY_HOST") {
            self.proxy.host = host;
            self.proxy.enabled = true;
        }
        if let Some(port) = get("PROXY_PORT") {
            match port.parse() {
                Ok(p) => self.proxy.port = Some(p),
                Err(_) => tracing::warn!("Ignoring invalid PROXY_PORT value: {}", port),
            }
        }
        if let Some(user) = get("PROXY_USER") {
            self.proxy.user = user;
        }
        if let Some(pass) = get("PROXY_PASS") {
            self.proxy.password = pass;
        }
        if let Some(scheme) = get("PROXY_SCHEME") {
            self.proxy.scheme = scheme.to_lowercase();
        }
        if let Some(disable) = get("DISABLE_PROXY") {
            if disable.eq_ignore_ascii_case("true") {
                self.proxy.enabled = false;
            }
        }

        if let Some(token) = get("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(ids) = get("TELEGRAM_CHAT_IDS") {
            self.telegram.chat_ids = parse_chat_ids(&ids);
        }

        if let Some(url) = lookup("LEAD_FORWARD_URL") {
            let url = url.trim();
            self.lead.forward_url = (!url.is_empty()).then(|| url.to_string());
        }
        if let Some(url) = lookup("KEEPALIVE_URL") {
            let url = url.trim();
            self.keepalive.url = (!url.is_empty()).then(|| url.to_string());
        }
    }

    /// Address the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Split a comma separated recipient list, dropping blanks
pub fn parse_chat_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Mask a secret for display, keeping a short prefix
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return "(not set)".to_string();
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{}****", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_match_deployed_service() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.retry.attempt_timeouts_secs, vec![25, 30]);
        assert_eq!(config.completion.max_output_tokens, 80);
        assert_eq!(config.completion.stream_timeout_secs, 30);
        assert_eq!(config.keepalive.interval_secs, 240);
        assert!(!config.proxy.enabled);
        assert!(!config.completion.has_api_key());
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8080

            [telegram]
            bot_token = "123:abc"
            chat_ids = ["1", "2"]
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.telegram.chat_ids, vec!["1", "2"]);
        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
        assert!(config.completion.enable_streaming);
    }

    #[test]
    fn env_overrides_file_values() {
        let vars = env(&[
            ("PORT", "4000"),
            ("OPENAI_API_KEY", "sk-test"),
            ("PROXY_HOST", "proxy.local"),
            ("PROXY_PORT", "8080"),
            ("PROXY_SCHEME", "SOCKS5"),
            ("TELEGRAM_CHAT_IDS", " 1803, ,9399 ,"),
            ("LEAD_FORWARD_URL", "https://hooks.example/lead"),
        ]);
        let mut config = Config::default();
        config.apply_env_overrides(|k| vars.get(k).cloned());

        assert_eq!(config.server.port, 4000);
        assert_eq!(config.completion.api_key, "sk-test");
        assert!(config.proxy.enabled);
        assert_eq!(config.proxy.host, "proxy.local");
        assert_eq!(config.proxy.port, Some(8080));
        assert_eq!(config.proxy.scheme, "socks5");
        assert_eq!(config.telegram.chat_ids, vec!["1803", "9399"]);
        assert_eq!(config.lead.forward_url.as_deref(), Some("https://hooks.example/lead"));
    }

    #[test]
    fn disable_proxy_wins_over_proxy_host() {
        let vars = env(&[("PROXY_HOST", "proxy.local"), ("DISABLE_PROXY", "TRUE")]);
        let mut config = Config::default();
        config.apply_env_overrides(|k| vars.get(k).cloned());
        assert!(!config.proxy.enabled);
    }

    #[test]
    fn invalid_port_is_ignored() {
        let vars = env(&[("PORT", "not-a-port")]);
        let mut config = Config::default();
        config.apply_env_overrides(|k| vars.get(k).cloned());
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn empty_forward_url_disables_forwarding() {
        let vars = env(&[("LEAD_FORWARD_URL", "  ")]);
        let mut config = Config::default();
        config.lead.forward_url = Some("https://old.example".to_string());
        config.apply_env_overrides(|k| vars.get(k).cloned());
        assert!(config.lead.forward_url.is_none());
    }

    #[test]
    fn mask_secret_hides_tail() {
        assert_eq!(mask_secret(""), "(not set)");
        assert_eq!(mask_secret("sk-abcdef"), "sk-a****");
    }
}
