//! Outbound connection routing
//! Builds the shared HTTP client, optionally routed through a forward proxy

use reqwest::{Client, Proxy, Url};
use tokio::time::Duration;

use crate::config::ProxyConfig;
use crate::error::RelayError;

const SUPPORTED_SCHEMES: [&str; 4] = ["http", "https", "socks5", "socks5h"];

/// Build the forward proxy URL with percent-encoded credentials.
/// Returns `None` when the proxy is disabled or has no host.
pub fn proxy_url(config: &ProxyConfig) -> Result<Option<Url>, RelayError> {
    if !config.enabled {
        return Ok(None);
    }
    if config.host.trim().is_empty() {
        tracing::warn!("Proxy enabled but no host configured, connecting directly");
        return Ok(None);
    }

    let scheme = config.scheme.trim().to_lowercase();
    if !SUPPORTED_SCHEMES.contains(&scheme.as_str()) {
        return Err(RelayError::Config(format!("Unsupported proxy scheme: {}", scheme)));
    }

    let mut url = Url::parse(&format!("{}://{}", scheme, config.host.trim()))
        .map_err(|e| RelayError::Config(format!("Invalid proxy host {}: {}", config.host, e)))?;

    if let Some(port) = config.port {
        url.set_port(Some(port))
            .map_err(|_| RelayError::Config(format!("Invalid proxy port: {}", port)))?;
    }
    if !config.user.is_empty() {
        url.set_username(&config.user)
            .map_err(|_| RelayError::Config("Proxy URL cannot carry credentials".to_string()))?;
        url.set_password(Some(&config.password))
            .map_err(|_| RelayError::Config("Proxy URL cannot carry credentials".to_string()))?;
    }

    Ok(Some(url))
}

/// Proxy address safe for logs
pub fn describe_proxy(config: &ProxyConfig) -> String {
    match proxy_url(config) {
        Ok(Some(url)) => format!(
            "{}://{}:{}",
            url.scheme(),
            url.host_str().unwrap_or_default(),
            url.port_or_known_default().unwrap_or_default()
        ),
        Ok(None) => "direct".to_string(),
        Err(e) => format!("invalid ({})", e),
    }
}

/// Transport error text with the request URL stripped. Bot and webhook
/// URLs carry secrets in the path or query.
pub fn log_safe_error(e: reqwest::Error) -> String {
    e.without_url().to_string()
}

/// Build the HTTP client shared by every outbound call.
/// Timeouts are applied per call, so no overall client timeout is set.
pub fn build_http_client(config: &ProxyConfig) -> Result<Client, RelayError> {
    let mut builder = Client::builder()
        .connect_timeout(Duration::from_secs(20))
        .pool_max_idle_per_host(16)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .user_agent(concat!("lead-relay/", env!("CARGO_PKG_VERSION")));

    if let Some(url) = proxy_url(config)? {
        let proxy = Proxy::all(url)
            .map_err(|e| RelayError::Config(format!("Invalid proxy: {}", e)))?;
        builder = builder.proxy(proxy);
        tracing::info!("Using upstream proxy: {}", describe_proxy(config));
    }

    builder
        .build()
        .map_err(|e| RelayError::Config(format!("Failed to create HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy(scheme: &str, host: &str) -> ProxyConfig {
        ProxyConfig {
            enabled: true,
            scheme: scheme.to_string(),
            host: host.to_string(),
            port: Some(8000),
            user: "us er".to_string(),
            password: "p@ss:word".to_string(),
        }
    }

    #[test]
    fn disabled_proxy_means_direct() {
        let config = ProxyConfig { enabled: false, ..proxy("http", "proxy.local") };
        assert!(proxy_url(&config).unwrap().is_none());
        assert_eq!(describe_proxy(&config), "direct");
    }

    #[test]
    fn missing_host_falls_back_to_direct() {
        assert!(proxy_url(&proxy("http", " ")).unwrap().is_none());
    }

    #[test]
    fn credentials_are_percent_encoded() {
        let url = proxy_url(&proxy("HTTP", "proxy.local")).unwrap().unwrap();
        assert_eq!(url.scheme(), "http");
        assert_eq!(url.port(), Some(8000));
        assert_eq!(url.username(), "us%20er");
        assert_eq!(url.password(), Some("p%40ss%3Aword"));
    }

    #[test]
    fn rejects_unknown_scheme() {
        let err = proxy_url(&proxy("ftp", "proxy.local")).unwrap_err();
        assert!(matches!(err, RelayError::Config(_)));
    }

    #[test]
    fn describe_hides_credentials() {
        let shown = describe_proxy(&proxy("socks5", "proxy.local"));
        assert_eq!(shown, "socks5://proxy.local:8000");
    }

    #[tokio::test]
    async fn log_safe_error_drops_request_url() {
        let err = Client::new()
            .post("http://127.0.0.1:9/hook?token=s3cret")
            .send()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("s3cret"));

        let shown = log_safe_error(err);
        assert!(!shown.contains("s3cret"));
        assert!(!shown.contains("/hook"));
    }

    #[test]
    fn builds_client_through_proxy() {
        assert!(build_http_client(&proxy("socks5", "proxy.local")).is_ok());
        assert!(build_http_client(&ProxyConfig::default()).is_ok());
    }
}
