//! Implementation of the `cairn chat` command.

use anyhow::{Context, Result};
use clap::Args;
use std::io::{BufRead, Write};
use uuid::Uuid;

use crate::cli::commands::{build_orchestrator, load_config};

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Conversation to resume (a new one is started when omitted)
    #[arg(short = 'i', long)]
    pub conversation: Option<Uuid>,

    /// Language tag steering the coach replies (e.g. "en", "ru")
    #[arg(short, long, default_value = "en")]
    pub language: String,
}

pub async fn execute(
    args: ChatArgs,
    json_mode: bool,
    config_path: Option<&std::path::Path>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let orchestrator = build_orchestrator(&config).await?;

    let conversation_id = args.conversation.unwrap_or_else(Uuid::new_v4);
    if !json_mode {
        println!("Conversation: {conversation_id}");
        println!("Type your message and press Enter. Ctrl-D or \"/quit\" ends the session.\n");
    }

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut line = String::new();

    loop {
        if !json_mode {
            write!(stdout, "> ").context("Failed to write prompt")?;
            stdout.flush().context("Failed to flush stdout")?;
        }

        line.clear();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;
        if read == 0 {
            break;
        }

        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if message == "/quit" || message == "/exit" {
            break;
        }

        let reply = orchestrator
            .process_turn(conversation_id, message, &args.language)
            .await
            .context("Turn processing failed")?;

        if json_mode {
            let payload = serde_json::json!({
                "conversation_id": conversation_id,
                "stage": reply.stage.label(),
                "coach_message": reply.coach_message,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).unwrap_or_default()
            );
        } else {
            println!("\n[{}] {}\n", reply.stage.label(), reply.coach_message);
        }
    }

    if !json_mode {
        println!("\nSession ended. Resume with: cairn chat -i {conversation_id}");
    }
    Ok(())
}
