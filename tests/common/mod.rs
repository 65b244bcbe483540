//! Shared fixtures for engine integration tests.
//!
//! The scripted model replays canned extraction payloads in order and refuses
//! render calls, so every coach message comes from the engine's deterministic
//! fallback templates and assertions stay byte-stable.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use cairn::adapters::InMemoryRecordRepository;
use cairn::domain::models::Config;
use cairn::domain::ports::{CoachModel, ModelRequest};
use cairn::services::TurnOrchestrator;

pub struct ScriptedCoachModel {
    extractions: Mutex<VecDeque<String>>,
    default_extraction: Option<String>,
}

impl ScriptedCoachModel {
    /// Replays the given payloads in order; errors once the script runs out.
    pub fn new(extractions: &[&str]) -> Self {
        Self {
            extractions: Mutex::new(extractions.iter().map(ToString::to_string).collect()),
            default_extraction: None,
        }
    }

    /// A model that answers every extraction call with the same payload.
    pub fn repeating(extraction: &str) -> Self {
        Self {
            extractions: Mutex::new(VecDeque::new()),
            default_extraction: Some(extraction.to_string()),
        }
    }
}

#[async_trait]
impl CoachModel for ScriptedCoachModel {
    async fn extract(&self, _request: ModelRequest) -> Result<String> {
        let next = self.extractions.lock().expect("lock poisoned").pop_front();
        match next.or_else(|| self.default_extraction.clone()) {
            Some(payload) => Ok(payload),
            None => Err(anyhow!("extraction script exhausted")),
        }
    }

    async fn render(&self, _request: ModelRequest) -> Result<String> {
        // Forces the canned-template path for deterministic assertions.
        Err(anyhow!("render disabled in tests"))
    }
}

/// Orchestrator over in-memory persistence and the scripted model. The
/// repository handle is returned so tests can seed and inspect records.
pub fn scripted_orchestrator(
    model: ScriptedCoachModel,
) -> (TurnOrchestrator, Arc<InMemoryRecordRepository>) {
    let repo = Arc::new(InMemoryRecordRepository::new());
    let orchestrator = TurnOrchestrator::new(repo.clone(), Arc::new(model), &Config::default());
    (orchestrator, repo)
}
