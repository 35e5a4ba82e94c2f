use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Bob publishing and serving server.
pub struct BobServer {
    state: AppState,
}

impl BobServer {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Connect the configured backends.
    pub async fn from_config(config: ServerConfig) -> ServerResult<Self> {
        Ok(Self::new(AppState::from_config(config).await?))
    }

    pub fn config(&self) -> &ServerConfig {
        self.state.config()
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let addr = self.config().bind_addr;
        let app = self.router();
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, static_prefix = %self.config().static_prefix, "bob server listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_construction() {
        let server = BobServer::new(AppState::in_memory(ServerConfig::default()));
        assert_eq!(server.config().bind_addr, "127.0.0.1:8787".parse().unwrap());
    }

    #[test]
    fn router_builds() {
        let server = BobServer::new(AppState::in_memory(ServerConfig::default()));
        let _router = server.router();
    }

    #[test]
    fn router_builds_with_custom_static_prefix() {
        let config = ServerConfig {
            static_prefix: "/assets/bob".into(),
            ..ServerConfig::default()
        };
        let _router = BobServer::new(AppState::in_memory(config)).router();
    }
}
