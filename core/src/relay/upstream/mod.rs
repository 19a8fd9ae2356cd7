// Upstream module
pub mod client;

pub use client::{StreamOpenError, UpstreamClient, UpstreamReply};
