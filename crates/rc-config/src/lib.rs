//! TOML-based configuration with environment variable override support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mongodb: MongoConfig,
    pub redis: RedisConfig,
    pub bus: BusConfig,
    pub dispatch: DispatchConfig,
    pub scheduler: SchedulerConfig,
    pub ingress: IngressConfig,

    /// Data directory for local scratch state.
    pub data_dir: String,
    pub dev_mode: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mongodb: MongoConfig::default(),
            redis: RedisConfig::default(),
            bus: BusConfig::default(),
            dispatch: DispatchConfig::default(),
            scheduler: SchedulerConfig::default(),
            ingress: IngressConfig::default(),
            data_dir: "./data".to_string(),
            dev_mode: false,
        }
    }
}

/// MongoDB configuration: order/driver persistence (spec.md §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017/?replicaSet=rs0&directConnection=true".to_string(),
            database: "ordercore".to_string(),
        }
    }
}

/// Redis configuration: event bus transport (spec.md §4.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub url: String,
    pub pool_size: usize,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            pool_size: 10,
        }
    }
}

/// Event bus behavior: topic names and inbound-message dedup window (spec.md §4.1, §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub order_status_topic: String,
    pub card_update_topic: String,
    pub msg_update_topic: String,
    pub dedup_ttl_secs: u64,
    pub reconnect_backoff_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            order_status_topic: "order.status".to_string(),
            card_update_topic: "ui.card.update".to_string(),
            msg_update_topic: "ui.msg.update".to_string(),
            dedup_ttl_secs: 300,
            reconnect_backoff_ms: 1000,
        }
    }
}

/// Notification dispatch pool sizing and back-pressure (spec.md §4.4/§9).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub workers: usize,
    pub queue_size: usize,
    pub shutdown_drain_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 8,
            queue_size: 1024,
            shutdown_drain_secs: 30,
        }
    }
}

/// Scheduled-order activation scanner (spec.md §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub poll_interval_ms: u64,
    pub activation_window_mins: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_ms: 15_000,
            activation_window_mins: 30,
        }
    }
}

/// Ingress text-parsing and slash-command glue (spec.md §4.8/§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngressConfig {
    pub require_known_fleet: bool,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            require_known_fleet: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides applied.
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Generate an example TOML configuration.
    pub fn example_toml() -> String {
        r#"# OrderCore Configuration
# Environment variables (ORDERCORE_*) override these settings

[mongodb]
uri = "mongodb://localhost:27017/?replicaSet=rs0&directConnection=true"
database = "ordercore"

[redis]
url = "redis://localhost:6379"
pool_size = 10

[bus]
order_status_topic = "order.status"
card_update_topic = "ui.card.update"
msg_update_topic = "ui.msg.update"
dedup_ttl_secs = 300
reconnect_backoff_ms = 1000

[dispatch]
workers = 8
queue_size = 1024
shutdown_drain_secs = 30

[scheduler]
enabled = true
poll_interval_ms = 15000
activation_window_mins = 30

[ingress]
require_known_fleet = true

data_dir = "./data"
dev_mode = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let config = AppConfig::default();
        assert_eq!(config.mongodb.database, "ordercore");
        assert_eq!(config.scheduler.activation_window_mins, 30);
    }

    #[test]
    fn example_toml_round_trips() {
        let toml_str = AppConfig::example_toml();
        let parsed: AppConfig = toml::from_str(&toml_str).expect("example toml must parse");
        assert_eq!(parsed.bus.dedup_ttl_secs, 300);
    }
}
