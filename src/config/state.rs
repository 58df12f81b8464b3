// Application state module
// Shared, read-only state handed to every connection

use crate::error::Result;
use crate::handler::Router;

use super::types::Config;

/// Application state
pub struct AppState {
    pub config: Config,
    pub router: Router,
}

impl AppState {
    /// Build the mount table from configuration
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            router: Router::from_config(&config.mounts)?,
        })
    }

    /// Router-only state, mostly for tests
    pub const fn with_router(config: Config, router: Router) -> Self {
        Self { config, router }
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.config.logging.access_log
    }

    pub fn access_log_format(&self) -> &str {
        &self.config.logging.access_log_format
    }
}
