//! Deterministic transition validator.
//!
//! The model's decision is advisory only; this layer is the sole writer of
//! `current_stage`. Rules, in priority order:
//!
//! 1. content-based loop detection: the same key question asked twice forces
//!    progression, because asking it a third time is strictly worse;
//! 2. evidence-gated advance: no advance without the stage's evidence
//!    predicate, however insistent the model or the user;
//! 3. illegal transition blocking: only "stay" or the single next stage;
//!    backward moves are blocked once the stage has had two or more turns;
//! 4. stage/question mismatch: when the rendered question belongs to another
//!    stage, the declared stage is realigned to the question actually asked;
//! 5. already-answered: turn-count floors are waived once the substantive
//!    evidence exists.
//!
//! Every override is logged with the original and final decision; none is
//! silently dropped.

use std::collections::HashSet;
use std::fmt;

use tracing::warn;

use crate::domain::models::{
    CognitiveRecord, Decision, PolicyConfig, Stage, TurnDecision, ALL_STAGES,
};
use crate::services::evidence::{self, EvidenceClause};
use crate::services::templates;

/// Why the validator changed the model's proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideReason {
    /// The last two coach messages asked the same question; progression forced.
    StuckLoop { stage: Stage },
    /// Advance proposed without the stage's evidence.
    InsufficientEvidence { stage: Stage },
    /// Multi-stage skip proposed.
    IllegalJump { from: Stage, to: Stage },
    /// Backward move proposed after the stage had settled.
    BackwardBlocked { from: Stage, to: Stage },
    /// Backward move honored early in a stage, logged as explicit regression.
    EarlyRegress { from: Stage, to: Stage },
    /// Declared stage realigned to the question actually asked.
    StageQuestionMismatch { from: Stage, to: Stage },
    /// Turn-count floor waived because substantive evidence already exists.
    FloorWaived { stage: Stage },
}

impl fmt::Display for OverrideReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StuckLoop { stage } => write!(f, "stuck loop in {stage}"),
            Self::InsufficientEvidence { stage } => write!(f, "insufficient evidence in {stage}"),
            Self::IllegalJump { from, to } => write!(f, "illegal jump {from} -> {to}"),
            Self::BackwardBlocked { from, to } => write!(f, "backward move blocked {from} -> {to}"),
            Self::EarlyRegress { from, to } => write!(f, "early regression {from} -> {to}"),
            Self::StageQuestionMismatch { from, to } => {
                write!(f, "stage/question mismatch {from} -> {to}")
            }
            Self::FloorWaived { stage } => write!(f, "turn floor waived in {stage}"),
        }
    }
}

/// The validated outcome of a turn: what actually happens, regardless of what
/// the model proposed.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Final advance-vs-loop after all overrides.
    pub final_decision: Decision,
    /// Stage the record will be in after this turn.
    pub next_stage: Stage,
    /// Overrides applied, empty when the proposal passed untouched.
    pub overrides: Vec<OverrideReason>,
    /// Unsatisfied clauses of the current stage, for the loop follow-up.
    pub missing: Vec<EvidenceClause>,
    /// Set when the talker must render a deterministic redirect to this
    /// stage's question instead of consulting the model.
    pub redirect: Option<Stage>,
}

impl Verdict {
    fn passthrough(decision: Decision, next_stage: Stage, missing: Vec<EvidenceClause>) -> Self {
        Self {
            final_decision: decision,
            next_stage,
            overrides: Vec::new(),
            missing,
            redirect: None,
        }
    }
}

/// Tokenized form of a message for near-duplicate comparison.
fn token_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Two messages count as the same question when their normalized text is
/// identical or their token sets overlap at or above the threshold.
pub(crate) fn near_duplicate(a: &str, b: &str, threshold: f64) -> bool {
    let a_trim = a.trim().to_lowercase();
    let b_trim = b.trim().to_lowercase();
    if a_trim.is_empty() || b_trim.is_empty() {
        return false;
    }
    if a_trim == b_trim {
        return true;
    }
    let set_a = token_set(a);
    let set_b = token_set(b);
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        return false;
    }
    #[allow(clippy::cast_precision_loss)]
    let jaccard = intersection as f64 / union as f64;
    jaccard >= threshold
}

/// The deterministic rule layer overriding the model when it misbehaves.
pub struct SafetyNet {
    policy: PolicyConfig,
}

impl SafetyNet {
    pub fn new(policy: PolicyConfig) -> Self {
        Self { policy }
    }

    /// Rule 4, applied before the turn is processed: if the last rendered
    /// coach message asked a LATER stage's canonical question, realign
    /// `current_stage` forward to the question actually asked so state and
    /// dialogue stop diverging.
    ///
    /// Forward only: the failure mode is a declared stage lagging behind the
    /// rendered question. A message that merely echoes earlier-stage phrasing
    /// must never regress the record (regression happens only through the
    /// explicit rule-3 early path). When several later stages match, the
    /// latest one wins.
    pub fn reconcile_stage(&self, record: &mut CognitiveRecord) -> Option<OverrideReason> {
        let last = record.last_coach_message()?.to_lowercase();
        let current = record.current_stage;

        let matched = ALL_STAGES
            .into_iter()
            .filter(|stage| stage.ordinal() > current.ordinal())
            .filter(|stage| {
                templates::question_markers(*stage)
                    .iter()
                    .any(|marker| last.contains(marker))
            })
            .last()?;

        warn!(
            from = %current,
            to = %matched,
            "safety net: declared stage contradicts rendered question, realigning"
        );
        record.enter_stage(matched);
        Some(OverrideReason::StageQuestionMismatch {
            from: current,
            to: matched,
        })
    }

    /// Validates the reasoner's proposal against the merged record. Never
    /// fails: every path yields a renderable verdict.
    pub fn validate(&self, record: &CognitiveRecord, decision: &TurnDecision) -> Verdict {
        let current = record.current_stage;
        let unmet = evidence::missing(current, record, &self.policy);

        // Rule 1: a repeated question means the model is stuck; repeating it
        // again is strictly worse than moving on with available data.
        // Clarify turns are exempt: the deterministic explanation repeats
        // because the user asked again, and forcing progression there would
        // skip the consent gate.
        if decision.critique.is_none() && !current.is_terminal() {
            if let Some((older, newer)) = record.last_two_coach_messages() {
                if near_duplicate(older, newer, self.policy.loop_similarity_threshold) {
                    let target = current.next().unwrap_or(current);
                    let reason = OverrideReason::StuckLoop { stage: current };
                    warn!(
                        proposed = ?decision.decision,
                        forced = ?Decision::Advance,
                        %reason,
                        "safety net override"
                    );
                    return Verdict {
                        final_decision: Decision::Advance,
                        next_stage: target,
                        overrides: vec![reason],
                        missing: unmet,
                        redirect: None,
                    };
                }
            }
        }

        let proposed = match decision.decision {
            Decision::Advance => decision
                .proposed_next_stage
                .filter(|stage| *stage != current)
                .or_else(|| current.next())
                .unwrap_or(current),
            Decision::Loop => decision.proposed_next_stage.unwrap_or(current),
        };

        // Rule 3: only "stay" or the single next stage is legal forward.
        if proposed.ordinal() > current.ordinal() + 1 {
            let reason = OverrideReason::IllegalJump {
                from: current,
                to: proposed,
            };
            warn!(proposed = ?decision.decision, forced = ?Decision::Loop, %reason, "safety net override");
            return Verdict {
                final_decision: Decision::Loop,
                next_stage: current,
                overrides: vec![reason],
                missing: unmet,
                redirect: current.next(),
            };
        }

        // Rule 3, backward half: regression is blocked once the stage has had
        // a couple of turns; before that it is honored but logged.
        if proposed < current {
            if record.metrics.turns_in_stage >= self.policy.backward_block_after_turns {
                let reason = OverrideReason::BackwardBlocked {
                    from: current,
                    to: proposed,
                };
                warn!(proposed = ?decision.decision, forced = ?Decision::Loop, %reason, "safety net override");
                return Verdict {
                    final_decision: Decision::Loop,
                    next_stage: current,
                    overrides: vec![reason],
                    missing: unmet,
                    redirect: None,
                };
            }
            let reason = OverrideReason::EarlyRegress {
                from: current,
                to: proposed,
            };
            warn!(%reason, "safety net: honoring early regression");
            let missing_after = evidence::missing(proposed, record, &self.policy);
            return Verdict {
                final_decision: Decision::Loop,
                next_stage: proposed,
                overrides: vec![reason],
                missing: missing_after,
                redirect: None,
            };
        }

        match decision.decision {
            Decision::Loop => Verdict::passthrough(Decision::Loop, current, unmet),
            Decision::Advance => {
                let Some(target) = current.next() else {
                    // Terminal stage: nowhere to advance to.
                    return Verdict::passthrough(Decision::Loop, current, unmet);
                };

                // Rule 2: evidence-gated advance.
                if unmet.is_empty() {
                    return Verdict::passthrough(Decision::Advance, target, unmet);
                }

                // Rule 5: floors are minimums, not requirements, once the
                // substantive facts exist.
                if unmet.iter().all(EvidenceClause::is_floor) {
                    let reason = OverrideReason::FloorWaived { stage: current };
                    warn!(%reason, "safety net: waiving turn floor, evidence already present");
                    return Verdict {
                        final_decision: Decision::Advance,
                        next_stage: target,
                        overrides: vec![reason],
                        missing: Vec::new(),
                        redirect: None,
                    };
                }

                let reason = OverrideReason::InsufficientEvidence { stage: current };
                warn!(proposed = ?Decision::Advance, forced = ?Decision::Loop, %reason, "safety net override");
                Verdict {
                    final_decision: Decision::Loop,
                    next_stage: current,
                    overrides: vec![reason],
                    missing: unmet,
                    redirect: None,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Critique, EventCriteria, ExtractedFields};
    use uuid::Uuid;

    fn net() -> SafetyNet {
        SafetyNet::new(PolicyConfig::default())
    }

    fn record_at(stage: Stage) -> CognitiveRecord {
        let mut record = CognitiveRecord::new(Uuid::new_v4());
        record.current_stage = stage;
        record
    }

    fn advance_to(stage: Stage) -> TurnDecision {
        TurnDecision {
            decision: Decision::Advance,
            proposed_next_stage: Some(stage),
            extracted: ExtractedFields::default(),
            critique: None,
        }
    }

    fn loop_in_place(stage: Stage) -> TurnDecision {
        TurnDecision {
            decision: Decision::Loop,
            proposed_next_stage: Some(stage),
            extracted: ExtractedFields::default(),
            critique: None,
        }
    }

    #[test]
    fn test_near_duplicate_detection() {
        assert!(near_duplicate("What did you feel?", "what did you feel", 0.8));
        assert!(near_duplicate(
            "So, what did you feel in that moment?",
            "What did you feel in that moment?",
            0.8
        ));
        assert!(!near_duplicate(
            "What did you feel?",
            "What is one step you commit to?",
            0.8
        ));
        assert!(!near_duplicate("", "anything", 0.8));
    }

    #[test]
    fn test_rule1_forces_advance_on_repeated_question() {
        let mut record = record_at(Stage::Emotions);
        record.push_coach_message("What did you feel in that moment?".to_string(), 4);
        record.push_coach_message("What did you feel in that moment?".to_string(), 4);

        // Model wants to keep looping; evidence is not even close.
        let verdict = net().validate(&record, &loop_in_place(Stage::Emotions));
        assert_eq!(verdict.final_decision, Decision::Advance);
        assert_eq!(verdict.next_stage, Stage::Thought);
        assert_eq!(
            verdict.overrides,
            vec![OverrideReason::StuckLoop {
                stage: Stage::Emotions
            }]
        );
    }

    #[test]
    fn test_rule2_blocks_advance_without_evidence() {
        let mut record = record_at(Stage::Event);
        record.metrics.turns_in_stage = 3;
        record.fields.event_summary = Some("a fight at work".to_string());
        record.fields.event_criteria = EventCriteria {
            recent: true,
            self_involved: true,
            emotional: false,
            other_person: true,
        };

        let verdict = net().validate(&record, &advance_to(Stage::Emotions));
        assert_eq!(verdict.final_decision, Decision::Loop);
        assert_eq!(verdict.next_stage, Stage::Event);
        assert_eq!(
            verdict.overrides,
            vec![OverrideReason::InsufficientEvidence { stage: Stage::Event }]
        );
        assert_eq!(verdict.missing, vec![EvidenceClause::EventEmotional]);
    }

    #[test]
    fn test_rule2_admits_advance_with_full_evidence() {
        let mut record = record_at(Stage::Emotions);
        record.fields.emotions = ["anger", "shame", "fear", "relief"]
            .iter()
            .map(ToString::to_string)
            .collect();

        let verdict = net().validate(&record, &advance_to(Stage::Thought));
        assert_eq!(verdict.final_decision, Decision::Advance);
        assert_eq!(verdict.next_stage, Stage::Thought);
        assert!(verdict.overrides.is_empty());
    }

    #[test]
    fn test_rule3_blocks_multi_stage_skip() {
        let mut record = record_at(Stage::Topic);
        record.fields.topic = Some("being ignored".to_string());
        record.metrics.turns_in_stage = 3;

        let verdict = net().validate(&record, &advance_to(Stage::Emotions));
        assert_eq!(verdict.final_decision, Decision::Loop);
        assert_eq!(verdict.next_stage, Stage::Topic);
        assert_eq!(
            verdict.overrides,
            vec![OverrideReason::IllegalJump {
                from: Stage::Topic,
                to: Stage::Emotions
            }]
        );
        // The redirect targets the skipped intermediate stage.
        assert_eq!(verdict.redirect, Some(Stage::Event));
    }

    #[test]
    fn test_rule3_blocks_late_backward_move() {
        let mut record = record_at(Stage::Gap);
        record.metrics.turns_in_stage = 2;

        let verdict = net().validate(&record, &advance_to(Stage::Event));
        assert_eq!(verdict.final_decision, Decision::Loop);
        assert_eq!(verdict.next_stage, Stage::Gap);
        assert_eq!(
            verdict.overrides,
            vec![OverrideReason::BackwardBlocked {
                from: Stage::Gap,
                to: Stage::Event
            }]
        );
    }

    #[test]
    fn test_rule3_honors_early_backward_move_with_log() {
        let mut record = record_at(Stage::Gap);
        record.metrics.turns_in_stage = 1;

        let verdict = net().validate(&record, &loop_in_place(Stage::Pattern).clone());
        // sanity: loop-in-place at the current stage passes through
        assert!(verdict.overrides.is_empty() || verdict.next_stage == Stage::Gap);

        let mut regress = loop_in_place(Stage::Action);
        regress.proposed_next_stage = Some(Stage::Action);
        let verdict = net().validate(&record, &regress);
        assert_eq!(verdict.final_decision, Decision::Loop);
        assert_eq!(verdict.next_stage, Stage::Action);
        assert_eq!(
            verdict.overrides,
            vec![OverrideReason::EarlyRegress {
                from: Stage::Gap,
                to: Stage::Action
            }]
        );
    }

    #[test]
    fn test_rule4_realigns_stage_forward_to_question_asked() {
        let mut record = record_at(Stage::Gap);
        record.push_coach_message(
            "Does this way of reacting repeat elsewhere in your life? How would you \
             describe the pattern?"
                .to_string(),
            4,
        );

        let reason = net().reconcile_stage(&mut record);
        assert_eq!(
            reason,
            Some(OverrideReason::StageQuestionMismatch {
                from: Stage::Gap,
                to: Stage::Pattern
            })
        );
        assert_eq!(record.current_stage, Stage::Pattern);
    }

    #[test]
    fn test_rule4_never_regresses_on_earlier_stage_phrasing() {
        // Ordinary language may echo an earlier stage's question; that must
        // not move the record backward or wipe its per-stage metrics.
        let mut record = record_at(Stage::Pattern);
        record.metrics.turns_in_stage = 3;
        record.metrics.loop_count = 2;
        record.push_coach_message(
            "Looking at what happened in similar moments, does this way of reacting repeat?"
                .to_string(),
            4,
        );

        assert_eq!(net().reconcile_stage(&mut record), None);
        assert_eq!(record.current_stage, Stage::Pattern);
        assert_eq!(record.metrics.turns_in_stage, 3);
        assert_eq!(record.metrics.loop_count, 2);

        // Even the full earlier-stage question leaves the record in place.
        let mut record = record_at(Stage::Pattern);
        record.push_coach_message(
            crate::services::templates::entry_script(Stage::Gap).to_string(),
            4,
        );
        assert_eq!(net().reconcile_stage(&mut record), None);
        assert_eq!(record.current_stage, Stage::Pattern);
    }

    #[test]
    fn test_rule4_prefers_the_latest_matching_stage() {
        let mut record = record_at(Stage::Action);
        record.push_coach_message(
            "How wide is it, from 0 to 10? And how would you describe the pattern?".to_string(),
            4,
        );

        let reason = net().reconcile_stage(&mut record);
        assert_eq!(
            reason,
            Some(OverrideReason::StageQuestionMismatch {
                from: Stage::Action,
                to: Stage::Pattern
            })
        );
        assert_eq!(record.current_stage, Stage::Pattern);
    }

    #[test]
    fn test_rule4_no_correction_when_question_matches_stage() {
        let mut record = record_at(Stage::Gap);
        record.push_coach_message(
            "How would you name that gap? How wide is it from 0 to 10?".to_string(),
            4,
        );
        assert_eq!(net().reconcile_stage(&mut record), None);
        assert_eq!(record.current_stage, Stage::Gap);
    }

    #[test]
    fn test_rule1_is_suppressed_for_clarify_turns() {
        // Two identical deterministic explanations mean the user asked twice,
        // not that the model is stuck; the consent gate must hold.
        let mut record = record_at(Stage::Contract);
        record.push_coach_message("This is a structured self-reflection practice.".to_string(), 4);
        record.push_coach_message("This is a structured self-reflection practice.".to_string(), 4);

        let decision = TurnDecision {
            decision: Decision::Loop,
            proposed_next_stage: Some(Stage::Contract),
            extracted: ExtractedFields::default(),
            critique: Some(Critique::Clarify),
        };
        let verdict = net().validate(&record, &decision);
        assert_eq!(verdict.final_decision, Decision::Loop);
        assert_eq!(verdict.next_stage, Stage::Contract);
        assert!(verdict.overrides.is_empty());
    }

    #[test]
    fn test_rule5_waives_turn_floor_when_evidence_exists() {
        let mut record = record_at(Stage::Topic);
        record.fields.topic = Some("fear of conflict".to_string());
        record.metrics.turns_in_stage = 1; // below the 2-turn floor

        let verdict = net().validate(&record, &advance_to(Stage::Event));
        assert_eq!(verdict.final_decision, Decision::Advance);
        assert_eq!(verdict.next_stage, Stage::Event);
        assert_eq!(
            verdict.overrides,
            vec![OverrideReason::FloorWaived { stage: Stage::Topic }]
        );
    }

    #[test]
    fn test_loop_passes_through_untouched() {
        let record = record_at(Stage::Thought);
        let verdict = net().validate(&record, &loop_in_place(Stage::Thought));
        assert_eq!(verdict.final_decision, Decision::Loop);
        assert_eq!(verdict.next_stage, Stage::Thought);
        assert!(verdict.overrides.is_empty());
        assert_eq!(verdict.missing, vec![EvidenceClause::ThoughtCaptured]);
    }

    #[test]
    fn test_terminal_stage_never_advances() {
        let record = record_at(Stage::Complete);
        let verdict = net().validate(&record, &advance_to(Stage::Complete));
        assert_eq!(verdict.final_decision, Decision::Loop);
        assert_eq!(verdict.next_stage, Stage::Complete);
    }
}
