//! Anthropic Messages API adapter for the `CoachModel` port.

pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use client::AnthropicCoachModel;
pub use error::ModelApiError;
pub use retry::RetryPolicy;
