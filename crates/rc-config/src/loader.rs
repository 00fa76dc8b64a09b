//! Configuration loader with file and environment variable support.

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "application.toml",
    "ordercore.toml",
    "./config/config.toml",
    "./config/application.toml",
    "/etc/ordercore/config.toml",
];

pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        self.apply_env_overrides(&mut config);

        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Ok(path) = env::var("ORDERCORE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        for path in CONFIG_PATHS {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    fn apply_env_overrides(&self, config: &mut AppConfig) {
        if let Ok(val) = env::var("ORDERCORE_MONGODB_URI") {
            config.mongodb.uri = val;
        }
        if let Ok(val) = env::var("ORDERCORE_MONGODB_DATABASE") {
            config.mongodb.database = val;
        }

        if let Ok(val) = env::var("ORDERCORE_REDIS_URL") {
            config.redis.url = val;
        }
        if let Ok(val) = env::var("ORDERCORE_REDIS_POOL_SIZE") {
            if let Ok(size) = val.parse() {
                config.redis.pool_size = size;
            }
        }

        if let Ok(val) = env::var("ORDERCORE_BUS_DEDUP_TTL_SECS") {
            if let Ok(ttl) = val.parse() {
                config.bus.dedup_ttl_secs = ttl;
            }
        }
        if let Ok(val) = env::var("ORDERCORE_BUS_RECONNECT_BACKOFF_MS") {
            if let Ok(ms) = val.parse() {
                config.bus.reconnect_backoff_ms = ms;
            }
        }

        if let Ok(val) = env::var("ORDERCORE_DISPATCH_WORKERS") {
            if let Ok(workers) = val.parse() {
                config.dispatch.workers = workers;
            }
        }
        if let Ok(val) = env::var("ORDERCORE_DISPATCH_QUEUE_SIZE") {
            if let Ok(size) = val.parse() {
                config.dispatch.queue_size = size;
            }
        }

        if let Ok(val) = env::var("ORDERCORE_SCHEDULER_ENABLED") {
            config.scheduler.enabled = val.parse().unwrap_or(true);
        }
        if let Ok(val) = env::var("ORDERCORE_SCHEDULER_POLL_INTERVAL_MS") {
            if let Ok(interval) = val.parse() {
                config.scheduler.poll_interval_ms = interval;
            }
        }
        if let Ok(val) = env::var("ORDERCORE_SCHEDULER_ACTIVATION_WINDOW_MINS") {
            if let Ok(mins) = val.parse() {
                config.scheduler.activation_window_mins = mins;
            }
        }

        if let Ok(val) = env::var("ORDERCORE_INGRESS_REQUIRE_KNOWN_FLEET") {
            config.ingress.require_known_fleet = val.parse().unwrap_or(true);
        }

        if let Ok(val) = env::var("ORDERCORE_DATA_DIR") {
            config.data_dir = val;
        }
        if let Ok(val) = env::var("ORDERCORE_DEV_MODE") {
            config.dev_mode = val.parse().unwrap_or(false);
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_override_applies() {
        env::set_var("ORDERCORE_MONGODB_DATABASE", "ordercore_test");
        let config = ConfigLoader::new().load().expect("load must succeed");
        assert_eq!(config.mongodb.database, "ordercore_test");
        env::remove_var("ORDERCORE_MONGODB_DATABASE");
    }
}
