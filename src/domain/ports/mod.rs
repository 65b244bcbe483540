//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that infrastructure adapters
//! must implement:
//! - `RecordRepository`: persistence of cognitive records
//! - `CoachModel`: the language-model collaborator (extraction + rendering)
//!
//! These traits define the contracts that allow the domain to be independent
//! of specific infrastructure implementations.

pub mod coach_model;
pub mod record_repository;

pub use coach_model::{CoachModel, ModelRequest};
pub use record_repository::RecordRepository;
