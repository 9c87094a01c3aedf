//! # HTTP Server Module
//!
//! # Endpoints
//!
//! - `POST /cosmos/v1/query/{container}` - Run one page of a query
//! - `/health` - Health check
//! - `/metrics` - Query counters

pub mod observability_routes;
pub mod query_routes;
pub mod server;

pub use server::HttpServer;
