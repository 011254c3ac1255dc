//! CLI command implementations.
//!
//! Each command returns its full output as a string; `main` prints it.

use std::path::{Path, PathBuf};

use crate::classifier;
use crate::cli::output::{Classification, OutputFormat, format_classification, format_result};
use crate::cli::parser::{Cli, Commands, IdentityArgs};
use crate::config::{OrchestratorConfig, OrchestratorConfigBuilder};
use crate::core::{Identity, Role};
use crate::error::{CommandError, Result};
use crate::generation::FallbackChain;
use crate::synthesis::{PromptSet, ResponseSynthesizer};
use crate::workflow::{Orchestrator, router};

/// Parameters for the query command.
#[derive(Debug, Clone, Default)]
pub struct QueryParams<'a> {
    /// Question text.
    pub query: &'a str,
    /// Table directory override.
    pub data_dir: Option<&'a Path>,
    /// Media directory override.
    pub media_dir: Option<&'a Path>,
    /// Prompt directory override.
    pub prompt_dir: Option<&'a Path>,
    /// Vocabulary file override.
    pub vocabulary: Option<&'a Path>,
    /// Skip the remote generation tiers.
    pub offline: bool,
    /// Show tool diagnostics.
    pub verbose: bool,
}

/// Executes the CLI command.
///
/// # Errors
///
/// Returns an error if arguments are invalid, configuration fails to
/// build, or the async runtime cannot start.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Query {
            query,
            identity,
            data_dir,
            media_dir,
            prompt_dir,
            vocabulary,
            offline,
        } => {
            let params = QueryParams {
                query,
                data_dir: data_dir.as_deref(),
                media_dir: media_dir.as_deref(),
                prompt_dir: prompt_dir.as_deref(),
                vocabulary: vocabulary.as_deref(),
                offline: *offline,
                verbose: cli.verbose,
            };
            cmd_query(&params, identity, format)
        }
        Commands::Classify {
            query,
            identity,
            vocabulary,
        } => cmd_classify(query, identity, vocabulary.as_deref(), format),
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
    }
}

fn parse_identity(args: &IdentityArgs) -> Result<Identity> {
    let role: Role = args
        .role
        .parse()
        .map_err(CommandError::InvalidArgument)?;
    let mut identity = Identity::new(role, args.name.trim()).with_teams(&args.team);
    if let Some(session) = &args.session {
        identity = identity.with_session_id(session);
    }
    Ok(identity)
}

fn build_config(
    params: &QueryParams<'_>,
) -> std::result::Result<OrchestratorConfig, crate::error::ConfigError> {
    let mut builder: OrchestratorConfigBuilder = OrchestratorConfig::builder().from_env();
    if let Some(dir) = params.data_dir {
        builder = builder.data_dir(dir);
    }
    if let Some(dir) = params.media_dir {
        builder = builder.media_dir(dir);
    }
    if let Some(dir) = params.prompt_dir {
        builder = builder.prompt_dir(dir);
    }
    if let Some(path) = params.vocabulary {
        builder = builder.vocabulary_path(path);
    }
    builder.build()
}

fn cmd_query(params: &QueryParams<'_>, args: &IdentityArgs, format: OutputFormat) -> Result<String> {
    let identity = parse_identity(args)?;
    let config = build_config(params)?;

    let mut builder = Orchestrator::builder();
    if params.offline {
        builder = builder.synthesizer(ResponseSynthesizer::new(
            FallbackChain::offline(),
            PromptSet::load(config.prompt_dir.as_deref()),
            &config,
        ));
    }
    let orchestrator = builder.config(config).build()?;

    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}"))
    })?;
    let result = rt.block_on(orchestrator.process(params.query, identity));

    match format {
        OutputFormat::Text => Ok(format_result(&result, params.verbose)),
        OutputFormat::Json => Ok(format.to_json(&result)),
    }
}

fn cmd_classify(
    query: &str,
    args: &IdentityArgs,
    vocabulary: Option<&Path>,
    format: OutputFormat,
) -> Result<String> {
    let identity = parse_identity(args)?;
    let mut builder = OrchestratorConfig::builder();
    if let Some(path) = vocabulary {
        builder = builder.vocabulary_path(path);
    }
    let config = builder.build()?;
    let classifier = classifier::from_config(&config)?;

    let intent = classifier.classify(query, &identity);
    let plan = router::plan(&intent.required_tools);
    let classification = Classification {
        intent: &intent,
        route: router::route(&intent.required_tools),
        plan: &plan,
    };

    match format {
        OutputFormat::Text => Ok(format_classification(&classification)),
        OutputFormat::Json => Ok(format.to_json(&classification)),
    }
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine config directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                return Ok(format!(
                    "All role prompts already exist in: {}\n",
                    target_dir.display()
                ));
            }
            let mut output = format!(
                "Wrote {} role prompt(s) to: {}\n",
                written.len(),
                target_dir.display()
            );
            for path in &written {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("unknown");
                output.push_str("  ");
                output.push_str(name);
                output.push('\n');
            }
            output.push_str("\nEdit these files to customise the role system prompts.\n");
            Ok(output)
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "directory": target_dir.to_string_lossy(),
                "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
                "count": written.len()
            });
            Ok(format.to_json(&json))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run(args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(args).unwrap_or_else(|_| unreachable!());
        execute(&cli)
    }

    #[test]
    fn test_classify_text() {
        let out = run(&["heartbeat-rs", "classify", "How is Suzuki performing this season?"])
            .unwrap_or_else(|_| unreachable!());
        assert!(out.contains("player_analysis"));
        assert!(out.contains("Route:        data_only"));
    }

    #[test]
    fn test_classify_rejects_unknown_role() {
        let err = run(&["heartbeat-rs", "classify", "hi", "--role", "goalie"]);
        assert!(matches!(
            err,
            Err(crate::error::Error::Command(CommandError::InvalidArgument(_)))
        ));
    }

    #[test]
    fn test_init_prompts_writes_once() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        let path = dir.path().to_string_lossy().into_owned();

        let first = run(&["heartbeat-rs", "init-prompts", &path]).unwrap_or_else(|_| unreachable!());
        assert!(first.contains("Wrote 5 role prompt(s)"));
        assert!(dir.path().join("scout.md").exists());

        let second =
            run(&["heartbeat-rs", "init-prompts", &path]).unwrap_or_else(|_| unreachable!());
        assert!(second.contains("already exist"));
    }
}
