//! Merging of per-turn extraction deltas into the cognitive record.
//!
//! Merge policy per slot kind:
//! - scalar slots: overwrite only when the new value is non-null and non-blank;
//! - list slots: union of existing + new, deduplicated by normalized text;
//! - boolean gates (consent, event criteria, pattern confirmation): OR;
//! - depth score: max of old and new, so it never decreases within a stage.
//!
//! The function is pure and idempotent: merging the same extraction twice
//! yields the same record as merging it once, and a merged record never holds
//! a smaller list than its predecessor.

use crate::domain::models::{CognitiveRecord, ExtractedFields};

/// Maximum accepted gap score; extractions above it are clamped.
const MAX_GAP_SCORE: u8 = 10;

/// Canonical form used for list deduplication: trimmed and casefolded.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Unions `new_items` into `target`, keeping first-seen order and dropping
/// entries that normalize to an existing one or to nothing.
fn union_into(target: &mut Vec<String>, new_items: &[String]) {
    for item in new_items {
        let trimmed = item.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = normalize(trimmed);
        if target.iter().any(|existing| normalize(existing) == key) {
            continue;
        }
        target.push(trimmed.to_string());
    }
}

fn overwrite_if_present(slot: &mut Option<String>, new_value: &Option<String>) {
    if let Some(value) = new_value {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            *slot = Some(trimmed.to_string());
        }
    }
}

/// Folds one turn's extraction into the record, returning the merged copy.
///
/// The input record is untouched; the orchestrator persists the returned copy
/// only after the whole turn succeeds, which keeps the merge atomic per turn.
pub fn merge(record: &CognitiveRecord, extracted: &ExtractedFields) -> CognitiveRecord {
    let mut merged = record.clone();
    let fields = &mut merged.fields;

    fields.consent_given = fields.consent_given || extracted.consent_given;
    fields.event_criteria = fields.event_criteria.union(extracted.event_criteria);
    fields.pattern_confirmed = fields.pattern_confirmed || extracted.pattern_confirmed;

    overwrite_if_present(&mut fields.topic, &extracted.topic);
    overwrite_if_present(&mut fields.event_summary, &extracted.event_summary);
    overwrite_if_present(&mut fields.thought, &extracted.thought);
    overwrite_if_present(&mut fields.action_actual, &extracted.action_actual);
    overwrite_if_present(&mut fields.action_desired, &extracted.action_desired);
    overwrite_if_present(&mut fields.gap_name, &extracted.gap_name);
    overwrite_if_present(&mut fields.pattern, &extracted.pattern);
    overwrite_if_present(&mut fields.choice, &extracted.choice);
    overwrite_if_present(&mut fields.vision, &extracted.vision);
    overwrite_if_present(&mut fields.commitment, &extracted.commitment);

    if let Some(score) = extracted.gap_score {
        fields.gap_score = Some(score.min(MAX_GAP_SCORE));
    }

    union_into(&mut fields.emotions, &extracted.emotions);
    union_into(&mut fields.gains, &extracted.gains);
    union_into(&mut fields.losses, &extracted.losses);
    union_into(&mut fields.values, &extracted.values);
    union_into(&mut fields.abilities, &extracted.abilities);

    if let Some(depth) = extracted.depth_score {
        if depth > merged.metrics.depth_score {
            merged.metrics.depth_score = depth;
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn base_record() -> CognitiveRecord {
        CognitiveRecord::new(Uuid::new_v4())
    }

    #[test]
    fn test_list_union_dedupes_by_normalized_text() {
        let mut record = base_record();
        record.fields.emotions = vec!["Anger".to_string(), "shame".to_string()];

        let extracted = ExtractedFields {
            emotions: vec![
                " anger ".to_string(),
                "SHAME".to_string(),
                "relief".to_string(),
                "".to_string(),
            ],
            ..Default::default()
        };

        let merged = merge(&record, &extracted);
        assert_eq!(merged.fields.emotions, vec!["Anger", "shame", "relief"]);
    }

    #[test]
    fn test_scalar_overwrites_only_when_present() {
        let mut record = base_record();
        record.fields.topic = Some("procrastination".to_string());

        let keep = merge(&record, &ExtractedFields::default());
        assert_eq!(keep.fields.topic.as_deref(), Some("procrastination"));

        let blank = merge(
            &record,
            &ExtractedFields {
                topic: Some("  ".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(blank.fields.topic.as_deref(), Some("procrastination"));

        let replace = merge(
            &record,
            &ExtractedFields {
                topic: Some("conflict avoidance".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(replace.fields.topic.as_deref(), Some("conflict avoidance"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut record = base_record();
        record.fields.gains = vec!["feels safe".to_string()];

        let extracted = ExtractedFields {
            gains: vec!["feels safe".to_string(), "no conflict".to_string()],
            losses: vec!["self-respect".to_string()],
            gap_score: Some(7),
            depth_score: Some(0.5),
            consent_given: true,
            ..Default::default()
        };

        let once = merge(&record, &extracted);
        let twice = merge(&once, &extracted);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_lists_never_shrink() {
        let mut record = base_record();
        record.fields.values = vec!["honesty".to_string(), "courage".to_string()];

        let merged = merge(&record, &ExtractedFields::default());
        assert_eq!(merged.fields.values, record.fields.values);
    }

    #[test]
    fn test_gap_score_is_clamped() {
        let merged = merge(
            &base_record(),
            &ExtractedFields {
                gap_score: Some(42),
                ..Default::default()
            },
        );
        assert_eq!(merged.fields.gap_score, Some(10));
    }

    #[test]
    fn test_depth_score_is_monotone() {
        let mut record = base_record();
        record.metrics.depth_score = 0.6;

        let lower = merge(
            &record,
            &ExtractedFields {
                depth_score: Some(0.3),
                ..Default::default()
            },
        );
        assert_eq!(lower.metrics.depth_score, 0.6);

        let higher = merge(
            &record,
            &ExtractedFields {
                depth_score: Some(0.9),
                ..Default::default()
            },
        );
        assert_eq!(higher.metrics.depth_score, 0.9);
    }
}
