pub mod config;
pub mod decision;
pub mod record;
pub mod stage;

pub use config::{Config, DatabaseConfig, LoggingConfig, ModelConfig, PolicyConfig};
pub use decision::{Critique, Decision, ExtractedFields, TurnDecision};
pub use record::{CognitiveFields, CognitiveRecord, EventCriteria, ProcessMetrics};
pub use stage::{Stage, ALL_STAGES};
