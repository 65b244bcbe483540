//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};

use crate::cli::commands::{chat::ChatArgs, insights::InsightsArgs};

#[derive(Parser)]
#[command(name = "cairn")]
#[command(about = "Cairn - staged coaching dialogue engine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Path to a configuration file (defaults to cairn.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an interactive coaching conversation on the terminal
    Chat(ChatArgs),

    /// Show the collected insights for a conversation
    Insights(InsightsArgs),
}
