// Configuration module entry point
// Loads application configuration and turns file entries into middleware

mod state;
mod types;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::middleware::{StaticFile, StaticFileOptions};

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, FileConfig, HeaderEntry, LoggingConfig, MountConfig, PerformanceConfig, ServerConfig,
};

/// Default config file (without extension)
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from the default `config.toml`
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from specified file path (extension optional)
    pub fn load_from(config_path: &str) -> Result<Self> {
        let settings = with_defaults(config::Config::builder())?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("STATIC")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Parse configuration from a TOML string, defaults applied
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings = with_defaults(config::Config::builder())?
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

fn with_defaults(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("logging.access_log", true)?
        .set_default("logging.access_log_format", "combined")?
        .set_default("performance.keep_alive", true)?
        .set_default("performance.connection_timeout", 60)
}

impl FileConfig {
    /// Options for the middleware, unset keys keep their defaults
    pub fn to_options(&self) -> StaticFileOptions {
        let defaults = StaticFileOptions::default();
        StaticFileOptions {
            encoded: self.encoded.clone(),
            headers: self
                .headers
                .iter()
                .map(|h| (h.name.clone(), h.value.clone()))
                .collect(),
            etag: self.etag.unwrap_or(defaults.etag),
            last_modified: self.last_modified.unwrap_or(defaults.last_modified),
            max_age: self.max_age.map_or(defaults.max_age, Duration::from_millis),
            extensions: self.extensions.clone().unwrap_or(defaults.extensions),
            accept_ranges: self.accept_ranges.unwrap_or(defaults.accept_ranges),
            cache_control: self.cache_control.unwrap_or(defaults.cache_control),
            immutable: self.immutable.unwrap_or(defaults.immutable),
        }
    }

    /// Build the middleware; relative paths are resolved against the working directory
    pub fn build(&self) -> Result<StaticFile> {
        let path = PathBuf::from(&self.path);
        let path = if path.is_absolute() {
            path
        } else {
            std::env::current_dir().map_or(path.clone(), |cwd| cwd.join(&path))
        };
        StaticFile::new(path, self.to_options())
    }
}
