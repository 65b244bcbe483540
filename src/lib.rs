//! Cairn - Staged Coaching Dialogue Engine
//!
//! Cairn drives a turn-by-turn coaching conversation through a fixed stage
//! protocol, extracting structured facts from each user message and deciding
//! when the dialogue has earned the right to move forward.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Stage protocol, cognitive record, ports
//! - **Service Layer** (`services`): Reasoner, accumulator, safety net, talker
//!   and the turn orchestrator tying them together
//! - **Adapters** (`adapters`): Persistence implementations of the record port
//! - **Infrastructure Layer** (`infrastructure`): Model API client, config
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use cairn::services::TurnOrchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Wire a repository and model, then drive turns through the
//!     // orchestrator.
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    CognitiveFields, CognitiveRecord, Config, DatabaseConfig, Decision, LoggingConfig,
    ModelConfig, PolicyConfig, ProcessMetrics, Stage, TurnDecision,
};
pub use domain::ports::{CoachModel, ModelRequest, RecordRepository};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{InsightStatus, Insights, TurnOrchestrator, TurnReply};
