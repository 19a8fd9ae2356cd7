//! Relay Server - Axum HTTP server

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tokio::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::RelayError;
use crate::relay::config::{build_http_client, describe_proxy};
use crate::relay::forward::LeadForwarder;
use crate::relay::handlers;
use crate::relay::keepalive::spawn_keepalive;
use crate::relay::notify::Notifier;
use crate::relay::retry::RetryPolicy;
use crate::relay::upstream::UpstreamClient;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across handlers. Everything in it is read-only.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub upstream: Arc<UpstreamClient>,
    pub retry: Arc<RetryPolicy>,
    pub notifier: Arc<Notifier>,
    pub forwarder: Arc<LeadForwarder>,
}

impl AppState {
    /// Build every collaborator from configuration. All outbound calls share
    /// one HTTP client, and with it the forward proxy routing.
    pub fn from_config(config: Config) -> Result<Self, RelayError> {
        let http_client = build_http_client(&config.proxy)?;

        let upstream = UpstreamClient::new(http_client.clone(), config.completion.clone());
        let retry = RetryPolicy::from_timeouts_secs(&config.retry.attempt_timeouts_secs);
        let notifier = Notifier::new(http_client.clone(), &config.telegram);
        let forwarder = LeadForwarder::new(http_client, &config.lead);

        Ok(Self {
            config: Arc::new(config),
            upstream: Arc::new(upstream),
            retry: Arc::new(retry),
            notifier: Arc::new(notifier),
            forwarder: Arc::new(forwarder),
        })
    }
}

/// Build the router with every endpoint and middleware layer
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .max_age(Duration::from_secs(86400));

    let mut app = Router::new()
        // Health check
        .route("/", get(handlers::health::handle_root).post(handlers::chat::handle_chat))
        .route("/health", get(handlers::health::handle_health))

        // Chat relay
        .route("/api/chat", post(handlers::chat::handle_chat))

        // Leads
        .route("/lead", post(handlers::lead::handle_lead));

    if state.config.completion.enable_streaming {
        app = app.route("/api/chat-stream", post(handlers::stream::handle_chat_stream));
    }

    app.layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Outermost boundary: a panicking handler still answers with JSON
fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("Handler panicked: {}", details);
    RelayError::Internal(details).into_response()
}

/// Relay server instance
pub struct RelayServer {
    state: AppState,
}

impl RelayServer {
    pub fn new(config: Config) -> Result<Self, RelayError> {
        Ok(Self { state: AppState::from_config(config)? })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the relay server (blocking)
    pub async fn run(self) -> anyhow::Result<()> {
        let config = self.state.config.clone();

        tracing::info!("Outbound routing: {}", describe_proxy(&config.proxy));
        if !config.completion.has_api_key() {
            tracing::warn!("OPENAI_API_KEY not configured; chat requests will fail");
        }
        if !self.state.notifier.is_configured() {
            tracing::warn!("Telegram bot token or chat ids missing; leads will not be notified");
        }

        if let Some(url) = config.keepalive.url.clone() {
            tracing::info!("Keep-alive ping every {}s: {}", config.keepalive.interval_secs, url);
            spawn_keepalive(
                reqwest::Client::new(),
                url,
                Duration::from_secs(config.keepalive.interval_secs),
            );
        }

        let app = build_router(self.state);

        let addr = config.bind_address();
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        tracing::info!("Relay server {} listening on {}", config.server.service_name, addr);

        // Handle graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Relay server stopped");
        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
