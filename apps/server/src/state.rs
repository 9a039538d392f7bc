//! Shared application state injected into every handler.

use meridian_db::Database;

use crate::config::ServerConfig;

/// Cloneable handler state: the database handle (itself a cheap pool
/// clone) plus the startup configuration.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
}

impl AppState {
    /// Creates application state from an initialized database.
    pub fn new(db: Database, config: ServerConfig) -> Self {
        AppState { db, config }
    }
}
