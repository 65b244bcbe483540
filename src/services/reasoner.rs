//! Extraction and decision layer.
//!
//! Given the current record and the user's latest message, proposes an
//! advance-vs-loop decision plus the facts newly stated this turn. Cheap
//! deterministic short-circuits run before any model call; the model call
//! itself fails soft, so a malformed or absent completion can never erase
//! prior data or crash the turn.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::models::{
    CognitiveRecord, Critique, Decision, ExtractedFields, ModelConfig, Stage, TurnDecision,
};
use crate::domain::ports::{CoachModel, ModelRequest};
use crate::services::templates;

/// Phrases meaning "what do you mean / what is this", matched by containment
/// at the contract stage only.
const CLARIFY_PHRASES: &[&str] = &[
    "what do you mean",
    "what is this",
    "what's this",
    "how does this work",
    "i don't understand",
    "i dont understand",
    "что это",
    "не понимаю",
    "как это работает",
    "о чем это",
    "о чём это",
];

/// Affirmative tokens that advance the contract stage unconditionally.
const CONSENT_TOKENS: &[&str] = &[
    "yes",
    "yeah",
    "yep",
    "ok",
    "okay",
    "sure",
    "agreed",
    "i agree",
    "let's go",
    "lets go",
    "let's start",
    "lets start",
    "да",
    "давай",
    "давайте",
    "согласен",
    "согласна",
    "готов",
    "готова",
    "начнем",
    "начнём",
    "поехали",
];

/// Short messages only: a consent token buried in a paragraph is not consent.
const CONSENT_MAX_LEN: usize = 40;

/// True when the whole short utterance is built from affirmative tokens
/// ("yes", "да давай", "okay lets start"). A token as a raw prefix of a
/// longer word or of a free sentence ("surely not", "yeah right, as if") is
/// not consent; anything unmatched goes to the model instead.
fn is_consent(normalized: &str) -> bool {
    if normalized.is_empty() || normalized.len() > CONSENT_MAX_LEN {
        return false;
    }
    let mut rest = normalized;
    while !rest.is_empty() {
        let matched = CONSENT_TOKENS
            .iter()
            .filter(|token| {
                rest == **token
                    || (rest.starts_with(**token)
                        && rest.as_bytes().get(token.len()) == Some(&b' '))
            })
            .max_by_key(|token| token.len());
        match matched {
            Some(token) => rest = rest[token.len()..].trim_start(),
            None => return false,
        }
    }
    true
}

/// Structured payload the model is asked to return from the extraction call.
#[derive(Debug, Deserialize)]
struct ReasonerPayload {
    /// "advance" or "loop".
    decision: String,
    /// Stage id the model believes comes next.
    #[serde(default)]
    next_stage: Option<String>,
    /// Facts newly stated this turn only.
    #[serde(default)]
    extracted: ExtractedFields,
}

/// The extraction+decision component consulting the model.
pub struct Reasoner {
    model: Arc<dyn CoachModel>,
    config: ModelConfig,
}

impl Reasoner {
    pub fn new(model: Arc<dyn CoachModel>, config: ModelConfig) -> Self {
        Self { model, config }
    }

    /// Proposes a decision and extraction for this turn.
    ///
    /// Infallible by design: every failure path degrades to
    /// `TurnDecision::fail_soft`, which stays in place and extracts nothing.
    pub async fn decide(
        &self,
        record: &CognitiveRecord,
        user_message: &str,
        language: &str,
    ) -> TurnDecision {
        // Deterministic short-circuits: reproducible, zero latency, zero cost.
        if record.current_stage == Stage::Contract {
            if let Some(decision) = short_circuit_contract(record.current_stage, user_message) {
                debug!(stage = %record.current_stage, "reasoner short-circuit fired");
                return decision;
            }
        }

        let request = ModelRequest {
            system: extraction_system_prompt(language),
            prompt: self.extraction_prompt(record, user_message),
            max_tokens: self.config.max_tokens,
            temperature: 0.0, // extraction wants determinism, not creativity
        };

        let completion = match self.model.extract(request).await {
            Ok(text) => text,
            Err(error) => {
                warn!(%error, stage = %record.current_stage, "model extraction call failed, failing soft");
                return TurnDecision::fail_soft(record.current_stage);
            }
        };

        self.parse_completion(&completion, record.current_stage)
    }

    /// Parses the model's completion, degrading to fail-soft on any shape the
    /// engine does not expect. Prior accumulated fields are carried forward by
    /// the accumulator untouched in that case.
    fn parse_completion(&self, completion: &str, current_stage: Stage) -> TurnDecision {
        let json = super::extract_json_from_response(completion);
        let payload: ReasonerPayload = match serde_json::from_str(&json) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(%error, stage = %current_stage, "unparsable model payload, failing soft");
                return TurnDecision::fail_soft(current_stage);
            }
        };

        let decision = match payload.decision.trim().to_lowercase().as_str() {
            "advance" => Decision::Advance,
            "loop" => Decision::Loop,
            other => {
                warn!(decision = other, stage = %current_stage, "unknown decision token, failing soft");
                return TurnDecision::fail_soft(current_stage);
            }
        };

        let proposed_next_stage = payload.next_stage.as_deref().and_then(|raw| {
            raw.parse::<Stage>()
                .map_err(|error| warn!(%error, "model proposed unknown stage, ignoring"))
                .ok()
        });

        TurnDecision {
            decision,
            proposed_next_stage,
            extracted: payload.extracted,
            critique: None,
        }
    }

    fn extraction_prompt(&self, record: &CognitiveRecord, user_message: &str) -> String {
        let stage = record.current_stage;
        let snapshot =
            serde_json::to_string_pretty(&record.fields).unwrap_or_else(|_| "{}".to_string());
        let history = if record.recent_coach_messages.is_empty() {
            "(none yet)".to_string()
        } else {
            record
                .recent_coach_messages
                .iter()
                .map(|m| format!("- {m}"))
                .collect::<Vec<_>>()
                .join("\n")
        };

        format!(
            "## Current stage\n{stage} (stage goal: {goal})\n\n\
             ## Facts accumulated so far\n{snapshot}\n\n\
             ## Recent coach messages\n{history}\n\n\
             ## User's latest message\n{user_message}\n\n\
             Report ONLY facts newly stated in the latest message; do not \
             repeat items already present in the accumulated facts. Decide \
             whether the stage goal is met (\"advance\") or more is needed \
             (\"loop\").",
            goal = templates::entry_script(stage),
        )
    }
}

fn extraction_system_prompt(language: &str) -> String {
    format!(
        "You are the extraction component of a structured coaching dialogue \
         engine. The user speaks {language}. Respond with a single JSON object \
         and nothing else, shaped as: \
         {{\"decision\": \"advance\"|\"loop\", \
         \"next_stage\": \"<stage id>\", \
         \"extracted\": {{...newly stated facts only...}}}}. \
         Extracted list fields (emotions, gains, losses, values, abilities) \
         carry only items mentioned in the latest user message."
    )
}

/// Normalized form for token matching: casefolded, punctuation stripped.
fn normalize_utterance(message: &str) -> String {
    message
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '\'')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Contract-stage short-circuits: clarification request or explicit consent.
fn short_circuit_contract(current_stage: Stage, user_message: &str) -> Option<TurnDecision> {
    let normalized = normalize_utterance(user_message);
    if normalized.is_empty() {
        return None;
    }

    if CLARIFY_PHRASES
        .iter()
        .any(|phrase| normalized.contains(&normalize_utterance(phrase)))
    {
        return Some(TurnDecision {
            decision: Decision::Loop,
            proposed_next_stage: Some(current_stage),
            extracted: ExtractedFields::default(),
            critique: Some(Critique::Clarify),
        });
    }

    if is_consent(&normalized) {
        return Some(TurnDecision {
            decision: Decision::Advance,
            proposed_next_stage: current_stage.next(),
            extracted: ExtractedFields {
                consent_given: true,
                ..Default::default()
            },
            critique: None,
        });
    }

    None
}
