//! heartbeat-rs CLI entry point.

use clap::Parser;
use heartbeat_rs::cli::{Cli, execute};
use heartbeat_rs::telemetry::{self, LogFormat};

#[allow(clippy::print_stdout)]
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    let log_format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    telemetry::init(level, log_format);

    let output = execute(&cli)?;
    print!("{output}");
    Ok(())
}
