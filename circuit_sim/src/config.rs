//! Harness configuration.

use crate::error::SimError;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the master seed.
pub const SEED_ENV: &str = "CIRCUIT_SIM_SEED";

/// Environment variable overriding the log level.
pub const LOG_ENV: &str = "CIRCUIT_SIM_LOG";

/// Configuration for a simulation harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Master seed for actor keys and the contract address
    pub seed: u64,

    /// Default log level when `RUST_LOG` is unset
    pub log_level: String,

    /// Emit logs as JSON lines
    pub json_logs: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl SimConfig {
    /// Defaults overlaid with `CIRCUIT_SIM_SEED` and `CIRCUIT_SIM_LOG`.
    pub fn from_env() -> Result<Self, SimError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SimError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(seed) = lookup(SEED_ENV) {
            config.seed = seed
                .trim()
                .parse()
                .map_err(|e| SimError::Config(format!("{}={:?}: {}", SEED_ENV, seed, e)))?;
        }
        if let Some(level) = lookup(LOG_ENV) {
            config.log_level = level;
        }
        Ok(config)
    }

    /// Sets the master seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the default log level.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Switches JSON log output on or off.
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_overrides_defaults() {
        let config = SimConfig::from_lookup(|key| match key {
            SEED_ENV => Some(" 7 ".to_string()),
            LOG_ENV => Some("debug".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.log_level, "debug");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_invalid_seed_is_config_error() {
        let err = SimConfig::from_lookup(|key| (key == SEED_ENV).then(|| "abc".to_string())).unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn test_builders() {
        let config = SimConfig::default().with_seed(9).with_log_level("warn").with_json_logs(true);
        assert_eq!(config.seed, 9);
        assert_eq!(config.log_level, "warn");
        assert!(config.json_logs);
    }
}
