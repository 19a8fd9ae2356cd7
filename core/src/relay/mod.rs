//! Relay module - HTTP server, handlers and outbound calls

pub mod config;
pub mod server;
pub mod handlers;
pub mod mappers;
pub mod upstream;
pub mod retry;
pub mod notify;
pub mod forward;
pub mod lead;
pub mod keepalive;

pub use server::{AppState, RelayServer};
pub use retry::RetryPolicy;
pub use notify::{DeliveryStatus, Notifier, NotifyOutcome};
pub use forward::{ForwardOutcome, LeadForwarder};
pub use lead::LeadRecord;
