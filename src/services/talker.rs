//! Response-rendering layer.
//!
//! Selects content by the validated decision: the full stage-entry script on
//! advance, a short non-repetitive follow-up on loop. Deterministic responses
//! (clarification, skip redirects) are injected directly without a model call,
//! and a failed render call falls back to a canned stage-appropriate message
//! rather than returning nothing - every path yields a renderable message.

use std::sync::Arc;

use tracing::warn;

use crate::domain::models::{CognitiveRecord, Critique, Decision, ModelConfig};
use crate::domain::ports::{CoachModel, ModelRequest};
use crate::services::evidence::EvidenceClause;
use crate::services::safety_net::Verdict;
use crate::services::templates;

/// The response generator consulting the model for non-deterministic turns.
pub struct Talker {
    model: Arc<dyn CoachModel>,
    config: ModelConfig,
}

impl Talker {
    pub fn new(model: Arc<dyn CoachModel>, config: ModelConfig) -> Self {
        Self { model, config }
    }

    /// Renders the coach message for the validated verdict. Infallible: model
    /// failures degrade to canned templates, never to an absent reply.
    pub async fn render(
        &self,
        record: &CognitiveRecord,
        verdict: &Verdict,
        critique: Option<Critique>,
        language: &str,
    ) -> String {
        // Deterministic bypasses first: zero latency, zero cost.
        if critique == Some(Critique::Clarify) {
            return templates::clarify_message(language).to_string();
        }
        if let Some(stage) = verdict.redirect {
            return templates::redirect_message(stage, language);
        }

        match verdict.final_decision {
            Decision::Advance => self.render_stage_entry(record, verdict, language).await,
            Decision::Loop => self.render_loop_followup(record, verdict, language).await,
        }
    }

    /// Full script on stage entry: introduce the stage, say why, ask its
    /// opening question.
    async fn render_stage_entry(
        &self,
        record: &CognitiveRecord,
        verdict: &Verdict,
        language: &str,
    ) -> String {
        let stage = verdict.next_stage;
        let script = templates::entry_script(stage);
        let request = ModelRequest {
            system: render_system_prompt(language),
            prompt: format!(
                "The dialogue is entering the \"{stage}\" stage. Deliver this \
                 stage-entry script in your own warm words, keeping its \
                 structure and its closing question intact:\n\n{script}\n\n\
                 Known facts about the user so far:\n{snapshot}\n\n\
                 Acknowledge briefly what the user just gave before moving on.",
                snapshot = self.snapshot(record),
            ),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        match self.model.render(request).await {
            Ok(message) if !message.trim().is_empty() => message.trim().to_string(),
            Ok(_) => script.to_string(),
            Err(error) => {
                warn!(%error, %stage, "render call failed, using canned stage script");
                script.to_string()
            }
        }
    }

    /// Short follow-up on loop: reference what is still missing instead of
    /// re-asking the identical question.
    async fn render_loop_followup(
        &self,
        record: &CognitiveRecord,
        verdict: &Verdict,
        language: &str,
    ) -> String {
        let stage = record.current_stage;
        let hints: Vec<String> = verdict.missing.iter().map(EvidenceClause::hint).collect();
        let hint_lines = if hints.is_empty() {
            "(nothing specific - invite the user to go one level deeper)".to_string()
        } else {
            hints
                .iter()
                .map(|h| format!("- {h}"))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let request = ModelRequest {
            system: render_system_prompt(language),
            prompt: format!(
                "We are staying in the \"{stage}\" stage. Write a SHORT \
                 follow-up (2-3 sentences). Do not repeat your previous \
                 question verbatim; instead explain gently what is still \
                 needed and why it matters:\n{hint_lines}\n\n\
                 Your previous message was:\n{previous}\n\n\
                 Known facts about the user so far:\n{snapshot}",
                previous = record.last_coach_message().unwrap_or("(none)"),
                snapshot = self.snapshot(record),
            ),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        match self.model.render(request).await {
            Ok(message) if !message.trim().is_empty() => message.trim().to_string(),
            Ok(_) => templates::loop_fallback(language, &hints),
            Err(error) => {
                warn!(%error, %stage, "render call failed, using canned loop follow-up");
                templates::loop_fallback(language, &hints)
            }
        }
    }

    fn snapshot(&self, record: &CognitiveRecord) -> String {
        serde_json::to_string_pretty(&record.fields).unwrap_or_else(|_| "{}".to_string())
    }
}

fn render_system_prompt(language: &str) -> String {
    format!(
        "You are a warm, precise cognitive-reflection coach. Answer in \
         {language}. Output the message text only - no JSON, no stage labels, \
         no meta commentary. All facts you need are given in the prompt; do \
         not invent any."
    )
}
