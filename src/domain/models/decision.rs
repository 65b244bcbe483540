//! Per-turn decision values.
//!
//! A `TurnDecision` is ephemeral: produced by the reasoner, inspected and
//! possibly overridden by the safety net, folded into the record, then
//! discarded. It is never persisted on its own.

use serde::{Deserialize, Serialize};

use super::record::EventCriteria;
use super::stage::Stage;

/// Advance to the next stage or stay and keep collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Move to the next stage this turn.
    Advance,
    /// Stay in the current stage.
    Loop,
}

/// Deterministic signal tags attached to a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Critique {
    /// The user asked what this process is; answer with the fixed
    /// explanation instead of consulting the model.
    Clarify,
}

/// Facts newly stated this turn, as reported by the reasoner.
///
/// List slots carry only the items mentioned this turn; the accumulator owns
/// the union with history. Every field is optional so a partial model payload
/// deserializes cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractedFields {
    pub consent_given: bool,
    pub topic: Option<String>,
    pub event_summary: Option<String>,
    pub event_criteria: EventCriteria,
    pub emotions: Vec<String>,
    pub thought: Option<String>,
    pub action_actual: Option<String>,
    pub action_desired: Option<String>,
    pub gap_name: Option<String>,
    pub gap_score: Option<u8>,
    pub pattern: Option<String>,
    pub pattern_confirmed: bool,
    pub gains: Vec<String>,
    pub losses: Vec<String>,
    pub values: Vec<String>,
    pub abilities: Vec<String>,
    pub choice: Option<String>,
    pub vision: Option<String>,
    pub commitment: Option<String>,
    /// Reasoner's estimate of reflection depth this turn (0.0-1.0).
    pub depth_score: Option<f32>,
}

impl ExtractedFields {
    /// True when the extraction carries no new information at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The reasoner's proposal for one turn, advisory until validated.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnDecision {
    /// Proposed advance-vs-loop.
    pub decision: Decision,
    /// Stage the model believes should come next, if it said so.
    pub proposed_next_stage: Option<Stage>,
    /// Facts newly stated this turn.
    pub extracted: ExtractedFields,
    /// Deterministic signal tag, if a short-circuit fired.
    pub critique: Option<Critique>,
}

impl TurnDecision {
    /// The fail-soft decision: stay in place, extract nothing, so a malformed
    /// or absent model response can never erase prior data.
    pub fn fail_soft(current_stage: Stage) -> Self {
        Self {
            decision: Decision::Loop,
            proposed_next_stage: Some(current_stage),
            extracted: ExtractedFields::default(),
            critique: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_soft_stays_and_extracts_nothing() {
        let decision = TurnDecision::fail_soft(Stage::Event);
        assert_eq!(decision.decision, Decision::Loop);
        assert_eq!(decision.proposed_next_stage, Some(Stage::Event));
        assert!(decision.extracted.is_empty());
        assert!(decision.critique.is_none());
    }

    #[test]
    fn test_extracted_fields_deserialize_from_partial_json() {
        let extracted: ExtractedFields =
            serde_json::from_str(r#"{"emotions": ["anger", "shame"], "depth_score": 0.4}"#)
                .unwrap();
        assert_eq!(extracted.emotions, vec!["anger", "shame"]);
        assert_eq!(extracted.depth_score, Some(0.4));
        assert!(extracted.topic.is_none());
        assert!(!extracted.is_empty());
    }
}
