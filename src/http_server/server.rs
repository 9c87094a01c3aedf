//! # HTTP Server
//!
//! Combines the query, health, and metrics routers and serves them until
//! Ctrl-C.

use std::sync::Arc;

use axum::http::HeaderName;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::propagate_header::PropagateHeaderLayer;

use super::observability_routes::{health_routes, metrics_routes};
use super::query_routes::{query_routes, QueryState, REQUEST_ID_HEADER};
use crate::config::ServerConfig;
use crate::observability::{log_event, log_event_with_fields, Event};
use crate::query::QueryService;

/// HTTP server for the query sidecar
pub struct HttpServer {
    config: ServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server for `service` bound per `config`
    pub fn new(service: Arc<QueryService>, config: ServerConfig) -> Self {
        let router = Self::build_router(service);
        Self { config, router }
    }

    /// Build the combined router with all endpoints
    pub fn build_router(service: Arc<QueryService>) -> Router {
        let metrics = service.metrics().clone();
        let query_state = Arc::new(QueryState::new(service));

        Router::new()
            .merge(health_routes())
            .merge(metrics_routes(metrics))
            .nest("/cosmos/v1", query_routes(query_state))
            // Echo the caller's correlation id; absent stays absent
            .layer(PropagateHeaderLayer::new(HeaderName::from_static(
                REQUEST_ID_HEADER,
            )))
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Start the HTTP server, returning after a graceful shutdown
    pub async fn start(self) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(self.config.socket_addr()).await?;
        let addr = listener.local_addr()?.to_string();

        log_event_with_fields(Event::Serving, &[("addr", addr.as_str())]);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        log_event(Event::ShutdownComplete);
        Ok(())
    }
}

async fn shutdown_signal() {
    // If the handler cannot be installed, serve until the process is killed
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::executor::{MockQueryExecutor, Page};

    fn service() -> Arc<QueryService> {
        let page = Page {
            items: vec![],
            request_charge: 1.0,
            activity_id: "act".to_string(),
            continuation_token: None,
        };
        Arc::new(QueryService::new(Arc::new(MockQueryExecutor::returning(page))))
    }

    #[test]
    fn test_server_with_custom_port() {
        let server = HttpServer::new(service(), ServerConfig::with_port(9191));
        assert_eq!(server.socket_addr(), "0.0.0.0:9191");
    }

    #[test]
    fn test_router_builds() {
        let server = HttpServer::new(service(), ServerConfig::default());
        let _router = server.router();
    }
}
