// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    /// Mounted file chains, matched in declaration order
    #[serde(default)]
    pub mounts: Vec<MountConfig>,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Seconds a client may take to send a request head
    pub connection_timeout: u64,
    pub max_connections: Option<u64>,
}

/// A route prefix and the files tried for it, in order
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct MountConfig {
    pub route: String,
    #[serde(default)]
    pub files: Vec<FileConfig>,
}

/// One single-file middleware
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FileConfig {
    pub path: String,
    /// Content-coding the file is stored in
    #[serde(default)]
    pub encoded: Option<String>,
    /// Extra response headers, applied in this order
    #[serde(default)]
    pub headers: Vec<HeaderEntry>,
    #[serde(default)]
    pub etag: Option<bool>,
    #[serde(default)]
    pub last_modified: Option<bool>,
    /// `Cache-Control` max-age in milliseconds
    #[serde(default)]
    pub max_age: Option<u64>,
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub accept_ranges: Option<bool>,
    #[serde(default)]
    pub cache_control: Option<bool>,
    #[serde(default)]
    pub immutable: Option<bool>,
}

/// Response header name/value pair
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}
