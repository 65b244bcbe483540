//! Service layer: the stage-protocol engine proper.
//!
//! The reasoner proposes, the accumulator merges, the safety net disposes,
//! the talker speaks, and the orchestrator sequences them per turn.

pub mod accumulator;
pub mod evidence;
pub mod orchestrator;
pub mod reasoner;
pub mod safety_net;
pub mod talker;
pub mod templates;

pub use evidence::EvidenceClause;
pub use orchestrator::{InsightStatus, Insights, TurnOrchestrator, TurnReply};
pub use reasoner::Reasoner;
pub use safety_net::{OverrideReason, SafetyNet, Verdict};
pub use talker::Talker;

/// Extract JSON from a model response (handles markdown code blocks).
///
/// Models fenced-code-block their JSON often enough that parsing the raw
/// completion directly would fail soft far too eagerly. Falls back to the
/// outermost brace span, then to the trimmed input.
pub fn extract_json_from_response(response: &str) -> String {
    let trimmed = response.trim();

    if let Some(fenced) = trimmed
        .split("```json")
        .nth(1)
        .or_else(|| trimmed.split("```").nth(1))
    {
        if let Some(body) = fenced.split("```").next() {
            return body.trim().to_string();
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return trimmed[start..=end].to_string();
        }
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::extract_json_from_response;

    #[test]
    fn test_extract_json_plain() {
        let input = r#"{"decision": "loop"}"#;
        assert_eq!(extract_json_from_response(input), r#"{"decision": "loop"}"#);
    }

    #[test]
    fn test_extract_json_code_block() {
        let input = "```json\n{\"decision\": \"advance\"}\n```";
        assert_eq!(extract_json_from_response(input), r#"{"decision": "advance"}"#);
    }

    #[test]
    fn test_extract_json_with_surrounding_prose() {
        let input = "Here is my decision:\n{\"decision\": \"loop\"}\nHope that helps!";
        assert_eq!(extract_json_from_response(input), r#"{"decision": "loop"}"#);
    }

    #[test]
    fn test_free_text_passes_through() {
        let input = "the user seems ready";
        assert_eq!(extract_json_from_response(input), "the user seems ready");
    }
}
