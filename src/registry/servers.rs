use crate::config::{ConfigStore, ServerConnection};
use std::sync::Arc;

/// Read-only view over the configured server connections.
#[derive(Debug, Clone)]
pub struct ServerRegistry {
    store: Arc<ConfigStore>,
}

impl ServerRegistry {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    /// Exact, case-sensitive alias lookup. No fuzzy matching.
    pub async fn resolve(&self, alias: &str) -> Option<ServerConnection> {
        self.store
            .servers()
            .await
            .into_iter()
            .find(|server| server.name == alias)
    }

    /// Every registered connection in stored order, for fan-out operations.
    pub async fn all(&self) -> Vec<ServerConnection> {
        self.store.servers().await
    }
}
