//! Per-message entry point sequencing the whole turn.
//!
//! Order per turn: load/create record -> stage/question reconciliation ->
//! reasoner (short-circuits, then model) -> accumulation onto a working copy
//! -> safety-net validation -> verdict applied to stage and metrics ->
//! rendering -> single persist as the last step. A failure before the persist
//! leaves the stored record exactly as it was, so a cancelled or failed turn
//! never commits a half-merged record.
//!
//! Turns within one conversation are strictly sequential by contract with the
//! transport collaborator; conversations scale by fan-out with no shared
//! mutable state between them.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::error::{EngineError, EngineResult};
use crate::domain::models::{
    CognitiveFields, CognitiveRecord, Config, Decision, PolicyConfig, Stage,
};
use crate::domain::ports::{CoachModel, RecordRepository};
use crate::services::accumulator;
use crate::services::reasoner::Reasoner;
use crate::services::safety_net::SafetyNet;
use crate::services::talker::Talker;

/// What the transport collaborator gets back for one user message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnReply {
    /// Rendered coach message; streaming/chunking is the transport's concern.
    pub coach_message: String,
    /// Stage after the turn committed.
    pub stage: Stage,
}

/// Whether the current stage's data is still being collected or confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightStatus {
    /// Last decision for the current stage was loop: still collecting.
    Draft,
    /// Last decision was advance: confirmed.
    Final,
}

/// Read-only projection for the UI/insights collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insights {
    pub current_stage: Stage,
    pub fields: CognitiveFields,
    pub status: InsightStatus,
}

/// The turn orchestrator wiring reasoner, accumulator, safety net and talker
/// over the persistence and model ports.
pub struct TurnOrchestrator {
    repo: Arc<dyn RecordRepository>,
    reasoner: Reasoner,
    safety_net: SafetyNet,
    talker: Talker,
    policy: PolicyConfig,
}

impl TurnOrchestrator {
    pub fn new(repo: Arc<dyn RecordRepository>, model: Arc<dyn CoachModel>, config: &Config) -> Self {
        Self {
            repo,
            reasoner: Reasoner::new(Arc::clone(&model), config.model.clone()),
            safety_net: SafetyNet::new(config.policy.clone()),
            talker: Talker::new(model, config.model.clone()),
            policy: config.policy.clone(),
        }
    }

    /// Processes one user message and returns the rendered coach reply.
    ///
    /// At most two model calls happen per turn (extraction + render), fewer
    /// when a deterministic short-circuit or bypass applies. The only error
    /// surfaced is persistence failure; model misbehavior is absorbed inside.
    #[instrument(skip_all, fields(conversation_id = %conversation_id))]
    pub async fn process_turn(
        &self,
        conversation_id: Uuid,
        user_message: &str,
        language: &str,
    ) -> EngineResult<TurnReply> {
        let stored = self
            .repo
            .load(conversation_id)
            .await
            .map_err(|e| EngineError::Persistence(e.to_string()))?;
        let mut record = stored.unwrap_or_else(|| CognitiveRecord::new(conversation_id));

        // Rule 4: state follows the question actually asked last turn.
        self.safety_net.reconcile_stage(&mut record);
        record.metrics.turns_in_stage += 1;

        let decision = self.reasoner.decide(&record, user_message, language).await;
        debug!(
            stage = %record.current_stage,
            proposed = ?decision.decision,
            "reasoner proposal"
        );

        // Atomic per turn: everything below mutates the working copy only;
        // the single save at the end commits all of it or none of it.
        let mut working = accumulator::merge(&record, &decision.extracted);
        let verdict = self.safety_net.validate(&working, &decision);

        match verdict.final_decision {
            Decision::Advance => {
                if verdict.next_stage != working.current_stage {
                    working.enter_stage(verdict.next_stage);
                }
                working.metrics.last_decision = Decision::Advance;
            }
            Decision::Loop => {
                if verdict.next_stage != working.current_stage {
                    // Honored early regression, already logged by the net.
                    working.enter_stage(verdict.next_stage);
                }
                working.metrics.loop_count += 1;
                working.metrics.last_decision = Decision::Loop;
            }
        }

        let coach_message = self
            .talker
            .render(&working, &verdict, decision.critique, language)
            .await;

        working.push_coach_message(coach_message.clone(), self.policy.recent_message_window);
        working.updated_at = chrono::Utc::now();

        self.repo
            .save(&working)
            .await
            .map_err(|e| EngineError::Persistence(e.to_string()))?;

        info!(
            stage = %working.current_stage,
            decision = ?verdict.final_decision,
            overrides = verdict.overrides.len(),
            "turn committed"
        );

        Ok(TurnReply {
            coach_message,
            stage: working.current_stage,
        })
    }

    /// Read-only projection for the UI: current stage, collected fields, and
    /// the single draft/final bit derived from the last validated decision.
    pub async fn get_insights(&self, conversation_id: Uuid) -> EngineResult<Insights> {
        let record = self
            .repo
            .load(conversation_id)
            .await
            .map_err(|e| EngineError::Persistence(e.to_string()))?
            .ok_or(EngineError::ConversationNotFound(conversation_id))?;

        let status = match record.metrics.last_decision {
            Decision::Advance => InsightStatus::Final,
            Decision::Loop => InsightStatus::Draft,
        };

        Ok(Insights {
            current_stage: record.current_stage,
            fields: record.fields,
            status,
        })
    }
}
