//! cosmos-sidecar - parameterized document database queries over HTTP
//!
//! Accepts a query request, runs one page of it against a container, and
//! resolves every outcome into a uniform JSON envelope with provider
//! diagnostics.

pub mod cli;
pub mod config;
pub mod gateway;
pub mod http_server;
pub mod observability;
pub mod query;
