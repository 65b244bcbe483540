use serde::{Deserialize, Serialize};

/// Main configuration structure for Cairn
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Evidence and loop-detection policy constants
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Language model configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::default(),
            model: ModelConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Evidence thresholds and validator tuning.
///
/// These are policy constants, not law: the methodology tunes them over time,
/// so every one of them is overridable via config file or `CAIRN_POLICY__*`
/// environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PolicyConfig {
    /// Emotion words required to leave the emotions stage
    #[serde(default = "default_min_emotions")]
    pub min_emotions: usize,

    /// Minimum user turns spent exploring the topic (a floor, waivable)
    #[serde(default = "default_min_topic_turns")]
    pub min_topic_turns: u32,

    /// Gains required to leave the gains/losses stage
    #[serde(default = "default_min_pair")]
    pub min_gains: usize,

    /// Losses required to leave the gains/losses stage
    #[serde(default = "default_min_pair")]
    pub min_losses: usize,

    /// Values required to leave the values/abilities stage
    #[serde(default = "default_min_pair")]
    pub min_values: usize,

    /// Abilities required to leave the values/abilities stage
    #[serde(default = "default_min_pair")]
    pub min_abilities: usize,

    /// Token-set similarity at or above which two coach messages count as
    /// the same question (0.0-1.0)
    #[serde(default = "default_loop_similarity")]
    pub loop_similarity_threshold: f64,

    /// Backward stage moves are blocked once this many turns have elapsed
    /// in the current stage
    #[serde(default = "default_backward_block")]
    pub backward_block_after_turns: u32,

    /// How many rendered coach messages the record retains
    #[serde(default = "default_message_window")]
    pub recent_message_window: usize,
}

const fn default_min_emotions() -> usize {
    4
}

const fn default_min_topic_turns() -> u32 {
    2
}

const fn default_min_pair() -> usize {
    2
}

const fn default_loop_similarity() -> f64 {
    0.8
}

const fn default_backward_block() -> u32 {
    2
}

const fn default_message_window() -> usize {
    4
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            min_emotions: default_min_emotions(),
            min_topic_turns: default_min_topic_turns(),
            min_gains: default_min_pair(),
            min_losses: default_min_pair(),
            min_values: default_min_pair(),
            min_abilities: default_min_pair(),
            loop_similarity_threshold: default_loop_similarity(),
            backward_block_after_turns: default_backward_block(),
            recent_message_window: default_message_window(),
        }
    }
}

/// Language model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ModelConfig {
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (0.0-1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum retries for transient API errors
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial retry backoff in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum retry backoff in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key; usually supplied via `CAIRN_MODEL__API_KEY` or left unset
    /// when a mock model is injected
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_model() -> String {
    "claude-3-5-sonnet-20241022".to_string()
}

const fn default_max_tokens() -> u32 {
    1024
}

const fn default_temperature() -> f32 {
    0.7
}

const fn default_timeout_secs() -> u64 {
    60
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    15_000
}

fn default_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            base_url: default_base_url(),
            api_key: None,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".cairn/cairn.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_policy() {
        let config = Config::default();
        assert_eq!(config.policy.min_emotions, 4);
        assert_eq!(config.policy.min_topic_turns, 2);
        assert_eq!(config.policy.min_gains, 2);
        assert_eq!(config.policy.min_values, 2);
        assert!(config.policy.loop_similarity_threshold > 0.0);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"policy": {"min_emotions": 3}}"#).unwrap();
        assert_eq!(config.policy.min_emotions, 3);
        assert_eq!(config.policy.min_topic_turns, 2);
        assert_eq!(config.database.max_connections, 5);
    }
}
