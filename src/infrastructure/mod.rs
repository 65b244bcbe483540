//! Infrastructure layer module
//!
//! This module contains external integrations:
//! - Anthropic Messages API client (`CoachModel` port)
//! - Configuration management
//!
//! Infrastructure implementations satisfy the port traits defined in the
//! domain layer; persistence adapters live in `crate::adapters`.

pub mod anthropic;
pub mod config;

pub use anthropic::AnthropicCoachModel;
pub use config::{ConfigError, ConfigLoader};
