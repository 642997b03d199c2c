// Layered runtime configuration: defaults file, local overrides, environment

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for the accumulation scheduler and its storage backends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub storage: StorageConfig,
    pub object_store: ObjectStoreConfig,
    pub scheduler: SchedulerConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for the local accumulation file backend
    pub local_root: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub poll_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub metrics_port: u16,
    pub tracing_endpoint: Option<String>,
}

impl Settings {
    /// Load from the default `config/` directory
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load with layered precedence: default.toml, then local.toml, then
    /// `APP__`-prefixed environment variables.
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // local.toml stays out of version control
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Reject settings the scheduler cannot run with
    pub fn validate(&self) -> Result<(), String> {
        if self.storage.local_root.is_empty() {
            return Err("Storage local_root cannot be empty".to_string());
        }

        if self.object_store.endpoint.is_empty() {
            return Err("Object store endpoint cannot be empty".to_string());
        }
        if self.object_store.region.is_empty() {
            return Err("Object store region cannot be empty".to_string());
        }

        if self.scheduler.poll_interval_seconds == 0 {
            return Err("Scheduler poll_interval_seconds must be greater than 0".to_string());
        }

        if self.observability.metrics_port == 0 {
            return Err("Metrics port must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                local_root: "/tmp/payer_accumulation".to_string(),
            },
            object_store: ObjectStoreConfig {
                endpoint: "http://localhost:9000".to_string(),
                access_key: "minioadmin".to_string(),
                secret_key: "minioadmin".to_string(),
                region: "us-east-1".to_string(),
            },
            scheduler: SchedulerConfig {
                poll_interval_seconds: 30,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                metrics_port: 9090,
                tracing_endpoint: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_catches_empty_local_root() {
        let mut settings = Settings::default();
        settings.storage.local_root = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_empty_endpoint() {
        let mut settings = Settings::default();
        settings.object_store.endpoint = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_zero_poll_interval() {
        let mut settings = Settings::default();
        settings.scheduler.poll_interval_seconds = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_missing_dir_falls_back_to_env_only() {
        // Both files are optional, so loading from a nonexistent directory
        // fails on missing required fields, not on the missing files.
        let result = Settings::load_from_path("/nonexistent/config/dir");
        assert!(result.is_err());
    }
}
