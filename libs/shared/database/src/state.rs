use shared_config::AppConfig;

use crate::pool::DbPool;

/// Shared handler state: configuration plus the injected storage handle.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Self {
        Self { config, db }
    }
}
