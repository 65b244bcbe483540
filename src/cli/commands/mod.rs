//! CLI command implementations.

pub mod chat;
pub mod insights;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::sqlite::{create_pool, PoolConfig, SqliteRecordRepository};
use crate::domain::models::Config;
use crate::infrastructure::{AnthropicCoachModel, ConfigLoader};
use crate::services::TurnOrchestrator;

/// Load configuration, honoring an explicit `--config` path when given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Wire the production orchestrator: sqlite persistence plus the
/// Anthropic-backed model adapter.
pub async fn build_orchestrator(config: &Config) -> Result<TurnOrchestrator> {
    let pool = create_pool(
        &config.database.path,
        Some(PoolConfig {
            max_connections: config.database.max_connections,
            ..PoolConfig::default()
        }),
    )
    .await
    .context("Failed to open the conversation database")?;

    let repo = Arc::new(SqliteRecordRepository::new(pool));
    let model = Arc::new(AnthropicCoachModel::new(&config.model)?);

    Ok(TurnOrchestrator::new(repo, model, config))
}
