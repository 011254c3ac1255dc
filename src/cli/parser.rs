//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// heartbeat-rs: hockey analytics query orchestration.
///
/// Classifies a question, gathers knowledge, statistics and video clips
/// the requester may see, and synthesizes a cited answer.
#[derive(Parser, Debug)]
#[command(name = "heartbeat-rs")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output and debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Write logs to stderr as JSON.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Requester identity flags shared by `query` and `classify`.
#[derive(clap::Args, Debug, Clone)]
pub struct IdentityArgs {
    /// Requester role (coach, player, analyst, scout, staff).
    #[arg(short, long, default_value = "analyst", env = "HEARTBEAT_ROLE")]
    pub role: String,

    /// Requester display name.
    #[arg(short, long, default_value = "Analyst", env = "HEARTBEAT_USER")]
    pub name: String,

    /// Accessible team codes (comma separated).
    #[arg(long, value_delimiter = ',', default_value = "MTL")]
    pub team: Vec<String>,

    /// Opaque session identifier.
    #[arg(long)]
    pub session: Option<String>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a question end to end.
    ///
    /// Runs classification, retrieval and synthesis. Without a configured
    /// model endpoint or API key the answer comes from the local template.
    #[command(after_help = r#"Examples:
  heartbeat-rs query "How is Suzuki performing this season?"
  heartbeat-rs query "Show me my goals" --role player --name "Cole Caufield"
  heartbeat-rs query "Explain our forecheck" --role coach --offline
  heartbeat-rs --format json query "Recap of the last game" | jq '.evidence'
"#)]
    Query {
        /// Question text.
        query: String,

        #[command(flatten)]
        identity: IdentityArgs,

        /// Directory with partitioned table files.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Directory holding the media `index.json`.
        #[arg(long)]
        media_dir: Option<PathBuf>,

        /// Directory with `<role>.md` prompt overrides.
        #[arg(long)]
        prompt_dir: Option<PathBuf>,

        /// Vocabulary JSON file replacing the built-in one.
        #[arg(long)]
        vocabulary: Option<PathBuf>,

        /// Skip the remote generation tiers.
        #[arg(long)]
        offline: bool,
    },

    /// Classify a question and show the route, without any I/O.
    #[command(after_help = r#"Examples:
  heartbeat-rs classify "Compare Suzuki versus Dach"
  heartbeat-rs --format json classify "Caufield highlights against Boston"
"#)]
    Classify {
        /// Question text.
        query: String,

        #[command(flatten)]
        identity: IdentityArgs,

        /// Vocabulary JSON file replacing the built-in one.
        #[arg(long)]
        vocabulary: Option<PathBuf>,
    },

    /// Write the default role prompts for customisation.
    ///
    /// Existing files are left untouched.
    #[command(after_help = r#"Examples:
  heartbeat-rs init-prompts                  # ~/.config/heartbeat-rs/prompts
  heartbeat-rs init-prompts ./prompts
"#)]
    InitPrompts {
        /// Target directory.
        dir: Option<PathBuf>,
    },
}
