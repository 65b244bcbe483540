//! The stage registry: the fixed, ordered sequence of coaching stages.
//!
//! Stages are immutable and defined once. Every transition in the engine is
//! expressed against this registry: a record may only stay where it is or move
//! to `next()`, and the terminal stage has no successor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::EngineError;

/// One ordinal step in the coaching protocol.
///
/// The order of variants is the protocol order; `ordinal()` and `next()` are
/// derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Working agreement: explain the process, obtain explicit consent.
    Contract,
    /// What the user wants to work on.
    Topic,
    /// A concrete recent situation illustrating the topic.
    Event,
    /// Emotion vocabulary for the event.
    Emotions,
    /// The automatic thought behind the emotions.
    Thought,
    /// What the user actually did, and what they wanted to do.
    Action,
    /// Naming and scoring the gap between actual and desired.
    Gap,
    /// The recurring pattern behind the gap.
    Pattern,
    /// What the pattern gives and what it costs.
    GainsLosses,
    /// Values served by change, abilities available for it.
    ValuesAbilities,
    /// The user's explicit choice.
    Choice,
    /// A picture of life with the new behavior.
    Vision,
    /// A concrete first commitment.
    Commitment,
    /// Terminal stage: the protocol is finished.
    Complete,
}

/// All stages in protocol order.
pub const ALL_STAGES: [Stage; 14] = [
    Stage::Contract,
    Stage::Topic,
    Stage::Event,
    Stage::Emotions,
    Stage::Thought,
    Stage::Action,
    Stage::Gap,
    Stage::Pattern,
    Stage::GainsLosses,
    Stage::ValuesAbilities,
    Stage::Choice,
    Stage::Vision,
    Stage::Commitment,
    Stage::Complete,
];

impl Stage {
    /// Zero-based position in the protocol order.
    pub fn ordinal(self) -> usize {
        ALL_STAGES
            .iter()
            .position(|s| *s == self)
            .unwrap_or_default()
    }

    /// Human-readable label, also the serialized id.
    pub fn label(self) -> &'static str {
        match self {
            Self::Contract => "contract",
            Self::Topic => "topic",
            Self::Event => "event",
            Self::Emotions => "emotions",
            Self::Thought => "thought",
            Self::Action => "action",
            Self::Gap => "gap",
            Self::Pattern => "pattern",
            Self::GainsLosses => "gains_losses",
            Self::ValuesAbilities => "values_abilities",
            Self::Choice => "choice",
            Self::Vision => "vision",
            Self::Commitment => "commitment",
            Self::Complete => "complete",
        }
    }

    /// The single stage reachable from this one, `None` at the terminal stage.
    pub fn next(self) -> Option<Stage> {
        ALL_STAGES.get(self.ordinal() + 1).copied()
    }

    /// Whether the protocol is finished at this stage.
    pub fn is_terminal(self) -> bool {
        self == Self::Complete
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Stage {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_STAGES
            .into_iter()
            .find(|stage| stage.label() == s.trim())
            .ok_or_else(|| EngineError::UnknownStage(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_matches_protocol() {
        assert_eq!(Stage::Contract.ordinal(), 0);
        assert_eq!(Stage::Complete.ordinal(), 13);
        assert!(Stage::Topic < Stage::Event);
        assert!(Stage::Pattern < Stage::GainsLosses);
    }

    #[test]
    fn test_next_walks_the_full_sequence() {
        let mut stage = Stage::Contract;
        let mut visited = vec![stage];
        while let Some(next) = stage.next() {
            visited.push(next);
            stage = next;
        }
        assert_eq!(visited, ALL_STAGES.to_vec());
        assert!(stage.is_terminal());
        assert_eq!(Stage::Complete.next(), None);
    }

    #[test]
    fn test_label_round_trip() {
        for stage in ALL_STAGES {
            assert_eq!(stage.label().parse::<Stage>().unwrap(), stage);
        }
        assert!("no_such_stage".parse::<Stage>().is_err());
    }
}
