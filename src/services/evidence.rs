//! Declarative evidence predicates, one clause table per stage.
//!
//! Each stage lists the clauses its collected facts must satisfy before the
//! record may leave it. New rules are additions to these tables, not new
//! string-matching call sites scattered around the engine. Clauses come in
//! two kinds: substantive (a fact is genuinely missing) and floor (a
//! turn-count minimum that is waivable once the facts exist).

use crate::domain::models::{CognitiveRecord, PolicyConfig, Stage};

/// A single unsatisfied requirement of a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvidenceClause {
    ConsentGiven,
    TopicStated,
    /// Turn-count floor for topic exploration; waivable (see safety net rule 5).
    TopicExplored { have: u32, need: u32 },
    EventDescribed,
    EventRecent,
    EventSelfInvolved,
    EventEmotional,
    EventOtherPerson,
    EmotionVocabulary { have: usize, need: usize },
    ThoughtCaptured,
    ActualActionNamed,
    DesiredActionNamed,
    GapNamed,
    GapScored,
    PatternNamed,
    PatternConfirmed,
    GainsListed { have: usize, need: usize },
    LossesListed { have: usize, need: usize },
    ValuesListed { have: usize, need: usize },
    AbilitiesListed { have: usize, need: usize },
    ChoiceMade,
    VisionStated,
    CommitmentStated,
}

impl EvidenceClause {
    /// Floors are minimum turn counts, not missing facts; the safety net may
    /// waive them when the substantive evidence already exists.
    pub fn is_floor(&self) -> bool {
        matches!(self, Self::TopicExplored { .. })
    }

    /// Short human hint for loop follow-ups: what is still needed, phrased
    /// so the talker never has to repeat the original question verbatim.
    pub fn hint(&self) -> String {
        match self {
            Self::ConsentGiven => "your explicit agreement to start the process".to_string(),
            Self::TopicStated => "a topic you want to work on".to_string(),
            Self::TopicExplored { .. } => {
                "a little more exploration of why this topic matters".to_string()
            }
            Self::EventDescribed => "a description of one concrete situation".to_string(),
            Self::EventRecent => "a situation recent enough to recall in detail".to_string(),
            Self::EventSelfInvolved => {
                "a situation where you were an active participant, not an observer".to_string()
            }
            Self::EventEmotional => "a situation that actually stirred something in you".to_string(),
            Self::EventOtherPerson => "a situation involving at least one other person".to_string(),
            Self::EmotionVocabulary { have, need } => {
                format!("a few more emotion words ({have} of {need} so far)")
            }
            Self::ThoughtCaptured => "the thought that flashed through your mind".to_string(),
            Self::ActualActionNamed => "what you actually did in that moment".to_string(),
            Self::DesiredActionNamed => "what you wanted to do instead".to_string(),
            Self::GapNamed => "a name for the gap between the two".to_string(),
            Self::GapScored => "a 0-10 score for how wide the gap feels".to_string(),
            Self::PatternNamed => "a description of the recurring pattern".to_string(),
            Self::PatternConfirmed => "your confirmation that the pattern is really yours".to_string(),
            Self::GainsListed { have, need } => {
                format!("more of what the pattern gives you ({have} of {need})")
            }
            Self::LossesListed { have, need } => {
                format!("more of what the pattern costs you ({have} of {need})")
            }
            Self::ValuesListed { have, need } => {
                format!("more values that change would serve ({have} of {need})")
            }
            Self::AbilitiesListed { have, need } => {
                format!("more abilities you could lean on ({have} of {need})")
            }
            Self::ChoiceMade => "your explicit choice".to_string(),
            Self::VisionStated => "a picture of life with the new behavior".to_string(),
            Self::CommitmentStated => "one concrete committed step".to_string(),
        }
    }
}

fn has(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Clauses of `stage` that the record does not yet satisfy. Empty means the
/// stage may be left.
pub fn missing(stage: Stage, record: &CognitiveRecord, policy: &PolicyConfig) -> Vec<EvidenceClause> {
    let fields = &record.fields;
    let mut unmet = Vec::new();

    match stage {
        Stage::Contract => {
            if !fields.consent_given {
                unmet.push(EvidenceClause::ConsentGiven);
            }
        }
        Stage::Topic => {
            if !has(&fields.topic) {
                unmet.push(EvidenceClause::TopicStated);
            }
            if record.metrics.turns_in_stage < policy.min_topic_turns {
                unmet.push(EvidenceClause::TopicExplored {
                    have: record.metrics.turns_in_stage,
                    need: policy.min_topic_turns,
                });
            }
        }
        Stage::Event => {
            if !has(&fields.event_summary) {
                unmet.push(EvidenceClause::EventDescribed);
            }
            let criteria = fields.event_criteria;
            if !criteria.recent {
                unmet.push(EvidenceClause::EventRecent);
            }
            if !criteria.self_involved {
                unmet.push(EvidenceClause::EventSelfInvolved);
            }
            if !criteria.emotional {
                unmet.push(EvidenceClause::EventEmotional);
            }
            if !criteria.other_person {
                unmet.push(EvidenceClause::EventOtherPerson);
            }
        }
        Stage::Emotions => {
            let have = fields.emotions.len();
            if have < policy.min_emotions {
                unmet.push(EvidenceClause::EmotionVocabulary {
                    have,
                    need: policy.min_emotions,
                });
            }
        }
        Stage::Thought => {
            if !has(&fields.thought) {
                unmet.push(EvidenceClause::ThoughtCaptured);
            }
        }
        Stage::Action => {
            if !has(&fields.action_actual) {
                unmet.push(EvidenceClause::ActualActionNamed);
            }
            if !has(&fields.action_desired) {
                unmet.push(EvidenceClause::DesiredActionNamed);
            }
        }
        Stage::Gap => {
            if !has(&fields.gap_name) {
                unmet.push(EvidenceClause::GapNamed);
            }
            if fields.gap_score.is_none() {
                unmet.push(EvidenceClause::GapScored);
            }
        }
        Stage::Pattern => {
            if !has(&fields.pattern) {
                unmet.push(EvidenceClause::PatternNamed);
            }
            if !fields.pattern_confirmed {
                unmet.push(EvidenceClause::PatternConfirmed);
            }
        }
        Stage::GainsLosses => {
            if fields.gains.len() < policy.min_gains {
                unmet.push(EvidenceClause::GainsListed {
                    have: fields.gains.len(),
                    need: policy.min_gains,
                });
            }
            if fields.losses.len() < policy.min_losses {
                unmet.push(EvidenceClause::LossesListed {
                    have: fields.losses.len(),
                    need: policy.min_losses,
                });
            }
        }
        Stage::ValuesAbilities => {
            if fields.values.len() < policy.min_values {
                unmet.push(EvidenceClause::ValuesListed {
                    have: fields.values.len(),
                    need: policy.min_values,
                });
            }
            if fields.abilities.len() < policy.min_abilities {
                unmet.push(EvidenceClause::AbilitiesListed {
                    have: fields.abilities.len(),
                    need: policy.min_abilities,
                });
            }
        }
        Stage::Choice => {
            if !has(&fields.choice) {
                unmet.push(EvidenceClause::ChoiceMade);
            }
        }
        Stage::Vision => {
            if !has(&fields.vision) {
                unmet.push(EvidenceClause::VisionStated);
            }
        }
        Stage::Commitment => {
            if !has(&fields.commitment) {
                unmet.push(EvidenceClause::CommitmentStated);
            }
        }
        // Terminal: nothing left to collect.
        Stage::Complete => {}
    }

    unmet
}

/// Whether the record satisfies the stage's evidence predicate.
pub fn satisfied(stage: Stage, record: &CognitiveRecord, policy: &PolicyConfig) -> bool {
    missing(stage, record, policy).is_empty()
}
