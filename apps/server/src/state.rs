//! Shared application state.

use std::sync::Arc;

use kasir_db::Database;

use crate::config::ServerConfig;

/// State handed to every handler.
///
/// `Database` is a cheap pool handle, so the state is cloned per request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServerConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}
