//! CLI layer for heartbeat-rs.
//!
//! Provides the command-line interface using clap: answering a query end
//! to end, classifying without I/O, and scaffolding role prompts.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands, IdentityArgs};
