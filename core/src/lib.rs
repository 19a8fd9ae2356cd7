//! Lead Relay Core Library
//! Chat completion relay, lead intake and notification fan-out

pub mod config;
pub mod error;
pub mod relay;

pub use error::RelayError;
