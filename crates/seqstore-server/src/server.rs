use seqstore_core::SequenceStore;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;

/// Sequence store HTTP server.
pub struct SequenceServer {
    config: ServerConfig,
    store: SequenceStore,
}

impl SequenceServer {
    /// Serve an already-open store.
    pub fn new(config: ServerConfig, store: SequenceStore) -> Self {
        Self { config, store }
    }

    /// Validate `config` and open the store it describes.
    pub async fn open(config: ServerConfig) -> ServerResult<Self> {
        config.validate()?;
        let store = SequenceStore::open(&config.store).await?;
        Ok(Self::new(config, store))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn store(&self) -> &SequenceStore {
        &self.store
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.store.clone(), self.config.max_body_bytes)
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!("sequence server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
