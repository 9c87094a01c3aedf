//! # Gateway Module
//!
//! Query execution against the document database's REST gateway using
//! master-key authentication.

pub mod auth;
pub mod client;

pub use auth::MasterKey;
pub use client::CosmosGatewayClient;

use thiserror::Error;

/// Errors building the gateway client
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Account key is not valid base64
    #[error("Account key is not valid base64")]
    InvalidKey,

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
