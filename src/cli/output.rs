//! Output formatting for CLI commands.

use std::fmt::Write;

use serde::Serialize;

use crate::core::IntentDescriptor;
use crate::workflow::{ExternalResult, NextStep, Step};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name; unknown names fall back to text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes a value as pretty JSON with a trailing newline.
    #[must_use]
    pub fn to_json<T: Serialize>(self, value: &T) -> String {
        let mut out = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
        out.push('\n');
        out
    }
}

/// Classification result printed by `classify`.
#[derive(Debug, Serialize)]
pub struct Classification<'a> {
    /// Classified intent.
    pub intent: &'a IntentDescriptor,
    /// Initial routing decision.
    pub route: NextStep,
    /// Steps the driver would execute.
    pub plan: &'a [Step],
}

fn join<T: std::fmt::Display>(items: impl IntoIterator<Item = T>, sep: &str) -> String {
    items
        .into_iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

fn or_none(s: String) -> String {
    if s.is_empty() { "(none)".to_string() } else { s }
}

/// Formats a classification for terminal output.
#[must_use]
pub fn format_classification(c: &Classification<'_>) -> String {
    let intent = c.intent;
    let mut out = String::new();
    let _ = writeln!(out, "Query type:   {}", intent.query_type);
    let _ = writeln!(out, "Complexity:   {}", intent.complexity);
    let _ = writeln!(out, "Tools:        {}", or_none(join(intent.required_tools.iter(), ", ")));
    let _ = writeln!(out, "Subjects:     {}", or_none(intent.entities.subjects.join(", ")));
    let _ = writeln!(out, "Opponents:    {}", or_none(intent.entities.opponents.join(", ")));
    let _ = writeln!(
        out,
        "Time window:  {}",
        intent.entities.time_window.as_deref().unwrap_or("(none)")
    );
    let _ = writeln!(out, "Route:        {}", c.route);
    let _ = writeln!(out, "Plan:         {}", join(c.plan, " -> "));
    out
}

/// Formats a query result for terminal output.
///
/// The answer comes first; tool diagnostics follow when `verbose` is set.
#[must_use]
pub fn format_result(result: &ExternalResult, verbose: bool) -> String {
    let mut out = format!("{}\n", result.answer_text.trim_end());

    for warning in &result.warnings {
        let _ = writeln!(out, "\nwarning: {warning}");
    }

    if verbose {
        let _ = writeln!(out, "\n---");
        let _ = writeln!(out, "Success:      {}", result.success);
        let _ = writeln!(out, "Query type:   {}", result.query_type);
        for summary in &result.tool_summaries {
            let _ = writeln!(
                out,
                "Tool:         {} ({}, {} ms, {} citations)",
                summary.tool,
                if summary.success { "ok" } else { "failed" },
                summary.duration_ms,
                summary.citation_count
            );
        }
        let _ = writeln!(out, "Evidence:     {}", or_none(result.evidence.join(", ")));
        for error in &result.errors {
            let _ = writeln!(out, "Error:        {error}");
        }
        let _ = writeln!(out, "Total time:   {} ms", result.total_duration_ms);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::core::QueryType;

    #[test]
    fn test_parse() {
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::parse("yaml"), OutputFormat::Text);
    }

    #[test]
    fn test_format_classification() {
        let intent = IntentDescriptor::general();
        let plan = [Step::IntentAnalysis, Step::Router, Step::Synthesis, Step::Done];
        let text = format_classification(&Classification {
            intent: &intent,
            route: NextStep::Synthesis,
            plan: &plan,
        });
        assert!(text.contains("Query type:   general_knowledge"));
        assert!(text.contains("Tools:        (none)"));
        assert!(text.contains("intent_analysis -> router -> synthesis -> done"));
    }

    #[test]
    fn test_format_result_verbose() {
        let result =
            ExternalResult::failure(QueryType::PlayerAnalysis, "boom", Duration::from_millis(3));
        let quiet = format_result(&result, false);
        assert!(!quiet.contains("---"));
        let loud = format_result(&result, true);
        assert!(loud.contains("Success:      false"));
        assert!(loud.contains("Error:        boom"));
    }
}
