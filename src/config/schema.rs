//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::lcd::types::BroadcastMode;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend connection settings.
    pub lcd: LcdConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// LCD backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LcdConfig {
    /// Base URL of the LCD REST API (e.g., "http://localhost:1317").
    pub api_url: String,

    /// How eagerly broadcasts return.
    pub broadcast_mode: BroadcastMode,

    /// Total request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for LcdConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:1317".to_string(),
            broadcast_mode: BroadcastMode::Block,
            request_timeout_secs: 30,
            connect_timeout_secs: 5,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
