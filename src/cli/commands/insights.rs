//! Implementation of the `cairn insights` command.

use anyhow::{Context, Result};
use clap::Args;
use uuid::Uuid;

use crate::cli::commands::{build_orchestrator, load_config};
use crate::cli::output::{output, CommandOutput};
use crate::services::{InsightStatus, Insights};

#[derive(Args, Debug)]
pub struct InsightsArgs {
    /// Conversation to inspect
    pub conversation: Uuid,
}

#[derive(Debug, serde::Serialize)]
pub struct InsightsOutput {
    pub conversation_id: Uuid,
    #[serde(flatten)]
    pub insights: Insights,
}

impl CommandOutput for InsightsOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Conversation: {}", self.conversation_id),
            format!("Stage: {}", self.insights.current_stage.label()),
            format!(
                "Status: {}",
                match self.insights.status {
                    InsightStatus::Draft => "draft",
                    InsightStatus::Final => "final",
                }
            ),
            String::new(),
        ];

        let fields = &self.insights.fields;
        push_scalar(&mut lines, "Topic", fields.topic.as_deref());
        push_scalar(&mut lines, "Event", fields.event_summary.as_deref());
        push_list(&mut lines, "Emotions", &fields.emotions);
        push_scalar(&mut lines, "Thought", fields.thought.as_deref());
        push_scalar(&mut lines, "Did", fields.action_actual.as_deref());
        push_scalar(&mut lines, "Wanted", fields.action_desired.as_deref());
        push_scalar(&mut lines, "Gap", fields.gap_name.as_deref());
        if let Some(score) = fields.gap_score {
            lines.push(format!("Gap score: {score}/10"));
        }
        push_scalar(&mut lines, "Pattern", fields.pattern.as_deref());
        push_list(&mut lines, "Gains", &fields.gains);
        push_list(&mut lines, "Losses", &fields.losses);
        push_list(&mut lines, "Values", &fields.values);
        push_list(&mut lines, "Abilities", &fields.abilities);
        push_scalar(&mut lines, "Choice", fields.choice.as_deref());
        push_scalar(&mut lines, "Vision", fields.vision.as_deref());
        push_scalar(&mut lines, "Commitment", fields.commitment.as_deref());

        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

fn push_scalar(lines: &mut Vec<String>, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        lines.push(format!("{name}: {value}"));
    }
}

fn push_list(lines: &mut Vec<String>, name: &str, values: &[String]) {
    if !values.is_empty() {
        lines.push(format!("{name}: {}", values.join(", ")));
    }
}

pub async fn execute(
    args: InsightsArgs,
    json_mode: bool,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let orchestrator = build_orchestrator(&config).await?;

    let insights = orchestrator
        .get_insights(args.conversation)
        .await
        .context("Failed to load insights")?;

    output(
        &InsightsOutput {
            conversation_id: args.conversation,
            insights,
        },
        json_mode,
    );
    Ok(())
}
