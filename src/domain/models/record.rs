//! The per-conversation cognitive record.
//!
//! One conversation owns exactly one record for its whole lifetime. The record
//! holds the current stage, every structured fact collected so far, and the
//! process metrics the validator reasons about. Mutation happens through the
//! accumulator (fields) and the orchestrator applying a validated verdict
//! (stage + metrics); nothing else writes here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::decision::Decision;
use super::stage::Stage;

/// The four criteria a described event must satisfy before the event stage
/// can be left: a recent timeframe, the user's own active involvement, an
/// emotional signature, and at least one other person involved.
///
/// Flags are OR-merged across turns so they never flip back to false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCriteria {
    /// The event happened recently enough to recall in detail.
    #[serde(default)]
    pub recent: bool,
    /// The user was an active participant, not an observer.
    #[serde(default)]
    pub self_involved: bool,
    /// The event carried a noticeable emotional charge.
    #[serde(default)]
    pub emotional: bool,
    /// Another person was involved.
    #[serde(default)]
    pub other_person: bool,
}

impl EventCriteria {
    /// All four criteria, not any one.
    pub fn all_met(self) -> bool {
        self.recent && self.self_involved && self.emotional && self.other_person
    }

    /// Monotone union with another observation.
    pub fn union(self, other: Self) -> Self {
        Self {
            recent: self.recent || other.recent,
            self_involved: self.self_involved || other.self_involved,
            emotional: self.emotional || other.emotional,
            other_person: self.other_person || other.other_person,
        }
    }
}

/// Every semantic slot the protocol collects.
///
/// Scalar slots follow latest-non-null-wins; list slots are append/union-only
/// within a stage (a later turn must never hold a smaller set than an earlier
/// one). The merge policy itself lives in the accumulator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CognitiveFields {
    /// Explicit consent to run the process (contract stage gate).
    #[serde(default)]
    pub consent_given: bool,
    /// What the user wants to work on.
    pub topic: Option<String>,
    /// Short description of the concrete event.
    pub event_summary: Option<String>,
    /// Event-stage gate criteria.
    #[serde(default)]
    pub event_criteria: EventCriteria,
    /// Emotion words named so far (union across turns).
    #[serde(default)]
    pub emotions: Vec<String>,
    /// The automatic thought in the event.
    pub thought: Option<String>,
    /// What the user actually did.
    pub action_actual: Option<String>,
    /// What the user wanted to do instead.
    pub action_desired: Option<String>,
    /// Name of the gap between actual and desired.
    pub gap_name: Option<String>,
    /// Severity of the gap, 0-10.
    pub gap_score: Option<u8>,
    /// The recurring pattern behind the gap.
    pub pattern: Option<String>,
    /// Whether the user confirmed the pattern as theirs.
    #[serde(default)]
    pub pattern_confirmed: bool,
    /// What the pattern gives (union across turns).
    #[serde(default)]
    pub gains: Vec<String>,
    /// What the pattern costs (union across turns).
    #[serde(default)]
    pub losses: Vec<String>,
    /// Values served by changing (union across turns).
    #[serde(default)]
    pub values: Vec<String>,
    /// Abilities available for changing (union across turns).
    #[serde(default)]
    pub abilities: Vec<String>,
    /// The explicit choice the user made.
    pub choice: Option<String>,
    /// The picture of life with the new behavior.
    pub vision: Option<String>,
    /// The concrete first commitment.
    pub commitment: Option<String>,
}

/// Process metrics the safety net reasons about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessMetrics {
    /// Consecutive loop decisions in the current stage; reset on advance.
    #[serde(default)]
    pub loop_count: u32,
    /// User turns spent in the current stage; reset on stage change.
    #[serde(default)]
    pub turns_in_stage: u32,
    /// Depth of reflection, monotone non-decreasing within a stage.
    #[serde(default)]
    pub depth_score: f32,
    /// The last validated decision; drives the draft/final insight status.
    pub last_decision: Decision,
}

impl Default for ProcessMetrics {
    fn default() -> Self {
        Self {
            loop_count: 0,
            turns_in_stage: 0,
            depth_score: 0.0,
            last_decision: Decision::Loop,
        }
    }
}

/// Per-conversation mutable aggregate: stage, collected facts, metrics, and a
/// bounded tail of rendered coach messages used for loop detection and
/// stage/question reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveRecord {
    /// Owning conversation.
    pub conversation_id: Uuid,
    /// Current protocol stage. Only the validated verdict moves this.
    pub current_stage: Stage,
    /// Accumulated structured facts.
    #[serde(default)]
    pub fields: CognitiveFields,
    /// Process metrics.
    #[serde(default)]
    pub metrics: ProcessMetrics,
    /// Last few rendered coach messages, newest last.
    #[serde(default)]
    pub recent_coach_messages: Vec<String>,
    /// Creation timestamp (first user message of the conversation).
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl CognitiveRecord {
    /// Creates a fresh record at the initial stage.
    pub fn new(conversation_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            conversation_id,
            current_stage: Stage::Contract,
            fields: CognitiveFields::default(),
            metrics: ProcessMetrics::default(),
            recent_coach_messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The most recent rendered coach message, if any.
    pub fn last_coach_message(&self) -> Option<&str> {
        self.recent_coach_messages.last().map(String::as_str)
    }

    /// The two most recent coach messages (older, newer), if present.
    pub fn last_two_coach_messages(&self) -> Option<(&str, &str)> {
        let n = self.recent_coach_messages.len();
        if n < 2 {
            return None;
        }
        Some((
            self.recent_coach_messages[n - 2].as_str(),
            self.recent_coach_messages[n - 1].as_str(),
        ))
    }

    /// Appends a rendered coach message, keeping at most `window` entries.
    pub fn push_coach_message(&mut self, message: String, window: usize) {
        self.recent_coach_messages.push(message);
        if self.recent_coach_messages.len() > window {
            let excess = self.recent_coach_messages.len() - window;
            self.recent_coach_messages.drain(..excess);
        }
    }

    /// Moves the record into `stage`, resetting per-stage metrics.
    ///
    /// Callers must only pass stages sanctioned by the safety net.
    pub fn enter_stage(&mut self, stage: Stage) {
        self.current_stage = stage;
        self.metrics.loop_count = 0;
        self.metrics.turns_in_stage = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_starts_at_contract() {
        let record = CognitiveRecord::new(Uuid::new_v4());
        assert_eq!(record.current_stage, Stage::Contract);
        assert_eq!(record.metrics.last_decision, Decision::Loop);
        assert!(record.fields.emotions.is_empty());
    }

    #[test]
    fn test_coach_message_window_is_bounded() {
        let mut record = CognitiveRecord::new(Uuid::new_v4());
        for i in 0..6 {
            record.push_coach_message(format!("message {i}"), 4);
        }
        assert_eq!(record.recent_coach_messages.len(), 4);
        assert_eq!(record.last_coach_message(), Some("message 5"));
        let (older, newer) = record.last_two_coach_messages().unwrap();
        assert_eq!(older, "message 4");
        assert_eq!(newer, "message 5");
    }

    #[test]
    fn test_enter_stage_resets_per_stage_metrics() {
        let mut record = CognitiveRecord::new(Uuid::new_v4());
        record.metrics.loop_count = 3;
        record.metrics.turns_in_stage = 5;
        record.enter_stage(Stage::Topic);
        assert_eq!(record.current_stage, Stage::Topic);
        assert_eq!(record.metrics.loop_count, 0);
        assert_eq!(record.metrics.turns_in_stage, 0);
    }

    #[test]
    fn test_event_criteria_union_is_monotone() {
        let a = EventCriteria {
            recent: true,
            ..Default::default()
        };
        let b = EventCriteria {
            emotional: true,
            other_person: true,
            ..Default::default()
        };
        let merged = a.union(b);
        assert!(merged.recent && merged.emotional && merged.other_person);
        assert!(!merged.all_met());
        let full = merged.union(EventCriteria {
            self_involved: true,
            ..Default::default()
        });
        assert!(full.all_met());
        // union never clears a flag
        assert_eq!(full.union(EventCriteria::default()), full);
    }
}
