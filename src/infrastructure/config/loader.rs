use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid min_emotions: {0}. Must be at least 1")]
    InvalidMinEmotions(usize),

    #[error("Invalid loop_similarity_threshold: {0}. Must be within (0.0, 1.0]")]
    InvalidSimilarityThreshold(f64),

    #[error("Invalid recent_message_window: {0}. Must be at least 2 for loop detection")]
    InvalidMessageWindow(usize),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must not exceed max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid max_tokens: {0}. Must be at least 1")]
    InvalidMaxTokens(u32),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. cairn.yaml (project config)
    /// 3. Environment variables (`CAIRN_*` prefix, `__` as section separator)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file("cairn.yaml"))
            .merge(Env::prefixed("CAIRN_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("CAIRN_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.policy.min_emotions == 0 {
            return Err(ConfigError::InvalidMinEmotions(config.policy.min_emotions));
        }

        let threshold = config.policy.loop_similarity_threshold;
        if threshold <= 0.0 || threshold > 1.0 {
            return Err(ConfigError::InvalidSimilarityThreshold(threshold));
        }

        if config.policy.recent_message_window < 2 {
            return Err(ConfigError::InvalidMessageWindow(
                config.policy.recent_message_window,
            ));
        }

        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        if config.model.max_tokens == 0 {
            return Err(ConfigError::InvalidMaxTokens(config.model.max_tokens));
        }

        if config.model.initial_backoff_ms > config.model.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.model.initial_backoff_ms,
                config.model.max_backoff_ms,
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.policy.min_emotions, 4);
        assert_eq!(config.database.path, ".cairn/cairn.db");
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cairn.yaml");
        std::fs::write(
            &path,
            "policy:\n  min_emotions: 3\ndatabase:\n  path: /custom/path.db\n",
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.policy.min_emotions, 3);
        assert_eq!(config.database.path, "/custom/path.db");
        // untouched sections keep defaults
        assert_eq!(config.policy.min_topic_turns, 2);
    }

    #[test]
    fn test_invalid_threshold_is_rejected() {
        let mut config = Config::default();
        config.policy.loop_similarity_threshold = 1.5;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidSimilarityThreshold(_))
        ));
    }

    #[test]
    fn test_zero_min_emotions_is_rejected() {
        let mut config = Config::default();
        config.policy.min_emotions = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMinEmotions(0))
        ));
    }
}
