//! Role templates and prompt construction for answer synthesis.
//!
//! Each [`Role`] has a behavioural system prompt and a fixed list of focus
//! areas. The system prompts can be overridden by `<role>.md` files in a
//! prompt directory; see [`PromptSet::load`].

use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::core::{AnalyticsPayload, MediaClip, Passage, Role};
use crate::workflow::WorkflowState;
use crate::workflow::evidence::dedup_first_seen;

/// Default prompt directory, relative to the platform config directory.
pub const DEFAULT_PROMPT_DIR: &str = "heartbeat-rs/prompts";

/// Answer given when no tool produced usable data.
pub const INSUFFICIENT_DATA_ANSWER: &str = "I don't have sufficient data to provide a comprehensive analysis for your query. \
The data sources may be temporarily unavailable, or the question may fall outside the data I can access. \
Please try rephrasing your question or check back shortly.";

/// Shared preamble appended to every role prompt.
const PREAMBLE: &str = "\
You are the analytics assistant for a professional hockey club. Combine the \
retrieved hockey knowledge, the structured statistics and the video clips \
listed in the prompt into one evidence-based answer.

Rules:
- Back every claim with the data in the prompt and cite its source tag, \
e.g. [skaters:player_performance].
- Never invent statistics that are not in the prompt.
- If the data only partly answers the question, say what is missing.
- Use authentic coaching and player terminology.";

const COACH_SYSTEM_PROMPT: &str = "\
Provide strategic insights with tactical depth suitable for game planning \
and lineup decisions. Favour concrete adjustments over general commentary.";

const PLAYER_SYSTEM_PROMPT: &str = "\
Provide performance insights and actionable feedback for skill development. \
Speak to the player directly and keep the tone encouraging and specific.";

const ANALYST_SYSTEM_PROMPT: &str = "\
Provide comprehensive data-driven insights with statistical depth and \
context. Call out sample sizes, trends and correlations explicitly.";

const SCOUT_SYSTEM_PROMPT: &str = "\
Provide detailed player evaluation insights and comparative analysis for \
recruitment decisions. Assess fit and projected potential.";

const STAFF_SYSTEM_PROMPT: &str = "\
Provide clear, accessible insights focused on team operations and player \
welfare. Avoid jargon where a plain explanation works.";

/// Number of passages included in the prompt.
const MAX_PASSAGES: usize = 3;
/// Characters kept per passage.
const PASSAGE_CHARS: usize = 200;
/// Rows rendered from an analytics frame.
const MAX_ROWS: usize = 5;
/// Clips rendered from the media results.
const MAX_CLIPS: usize = 5;

/// Focus areas for a role, used in prompts and the template answer.
#[must_use]
pub const fn focus_areas(role: Role) -> &'static [&'static str] {
    match role {
        Role::Coach => &["strategy", "matchups", "deployment", "adjustments"],
        Role::Player => &[
            "individual performance",
            "improvement",
            "comparisons",
            "goals",
        ],
        Role::Analyst => &["statistics", "trends", "correlations", "predictions"],
        Role::Scout => &[
            "player evaluation",
            "comparisons",
            "potential",
            "fit assessment",
        ],
        Role::Staff => &[
            "team operations",
            "player welfare",
            "logistics",
            "communication",
        ],
    }
}

const fn default_prompt(role: Role) -> &'static str {
    match role {
        Role::Coach => COACH_SYSTEM_PROMPT,
        Role::Player => PLAYER_SYSTEM_PROMPT,
        Role::Analyst => ANALYST_SYSTEM_PROMPT,
        Role::Scout => SCOUT_SYSTEM_PROMPT,
        Role::Staff => STAFF_SYSTEM_PROMPT,
    }
}

fn filename(role: Role) -> String {
    format!("{}.md", role.as_str())
}

/// Role-conditioned system prompts.
///
/// Loaded from external template files when available, falling back to
/// compiled-in defaults per role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    coach: String,
    player: String,
    analyst: String,
    scout: String,
    staff: String,
}

impl PromptSet {
    /// Loads prompts from `prompt_dir`, or from [`PromptSet::default_dir`]
    /// when none is given.
    ///
    /// Each file is loaded independently; a missing or blank file uses its
    /// default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir.map(Path::to_path_buf).or_else(Self::default_dir);

        let load_file = |role: Role| -> String {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename(role)))
                .and_then(|path| std::fs::read_to_string(&path).ok())
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| default_prompt(role).to_string())
        };

        let prompts = Self {
            coach: load_file(Role::Coach),
            player: load_file(Role::Player),
            analyst: load_file(Role::Analyst),
            scout: load_file(Role::Scout),
            staff: load_file(Role::Staff),
        };
        tracing::debug!(dir = ?resolved_dir, overridden = prompts.overridden(), "role prompts loaded");
        prompts
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            coach: COACH_SYSTEM_PROMPT.to_string(),
            player: PLAYER_SYSTEM_PROMPT.to_string(),
            analyst: ANALYST_SYSTEM_PROMPT.to_string(),
            scout: SCOUT_SYSTEM_PROMPT.to_string(),
            staff: STAFF_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Role-specific prompt body, without the shared preamble.
    #[must_use]
    pub fn role_prompt(&self, role: Role) -> &str {
        match role {
            Role::Coach => &self.coach,
            Role::Player => &self.player,
            Role::Analyst => &self.analyst,
            Role::Scout => &self.scout,
            Role::Staff => &self.staff,
        }
    }

    /// Full system prompt for a role.
    #[must_use]
    pub fn system_prompt(&self, role: Role) -> String {
        format!(
            "{PREAMBLE}\n\nYou are answering a {role}. {}\nFocus areas: {}.",
            self.role_prompt(role).trim(),
            focus_areas(role).join(", ")
        )
    }

    fn overridden(&self) -> usize {
        Role::ALL
            .iter()
            .filter(|role| self.role_prompt(**role) != default_prompt(**role))
            .count()
    }

    /// Writes the compiled-in role prompts to the given directory.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        for role in Role::ALL {
            let path = dir.join(filename(role));
            if !path.exists() {
                std::fs::write(&path, default_prompt(role))?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Returns the default prompt directory under the platform config dir.
    ///
    /// Returns `None` if the config directory cannot be determined.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(DEFAULT_PROMPT_DIR))
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self::defaults()
    }
}

fn clip_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn render_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

/// Formats the top passages, one per line.
#[must_use]
pub fn format_retrieved_context(passages: &[Passage]) -> String {
    if passages.is_empty() {
        return "No specific hockey context retrieved.".to_string();
    }

    passages
        .iter()
        .take(MAX_PASSAGES)
        .enumerate()
        .map(|(i, p)| {
            format!(
                "{}. [{}:{}] {}...",
                i + 1,
                p.source,
                p.category,
                clip_chars(p.text.trim(), PASSAGE_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Formats the analytics frame as a short row listing.
#[must_use]
pub fn format_analytics(analytics: Option<&AnalyticsPayload>) -> String {
    let Some(payload) = analytics.filter(|a| !a.frame.is_empty()) else {
        return "No analytics data available.".to_string();
    };

    let frame = &payload.frame;
    let mut out = format!(
        "Analysis: {} (source: {}, {} rows)\n",
        payload.kind,
        frame.source,
        frame.rows.len()
    );
    for row in frame.rows.iter().take(MAX_ROWS) {
        let cells: Vec<String> = frame
            .columns
            .iter()
            .zip(row)
            .map(|(column, value)| format!("{column}={}", render_value(value)))
            .collect();
        let _ = writeln!(out, "- {}", cells.join(", "));
    }
    if frame.rows.len() > MAX_ROWS {
        let _ = writeln!(out, "- ... {} more rows", frame.rows.len() - MAX_ROWS);
    }
    out.trim_end().to_string()
}

/// Formats the media results as a short clip listing.
#[must_use]
pub fn format_media(clips: &[MediaClip]) -> String {
    if clips.is_empty() {
        return "No video clips retrieved.".to_string();
    }

    let mut out = format!("{} clips:\n", clips.len());
    for clip in clips.iter().take(MAX_CLIPS) {
        let _ = writeln!(
            out,
            "- {} ({}, {}, {}s)",
            clip.title,
            clip.owner,
            clip.category,
            clip.duration.as_secs()
        );
    }
    out.trim_end().to_string()
}

/// Formats the evidence list, deduplicated in first-seen order.
#[must_use]
pub fn format_evidence(evidence: &[String]) -> String {
    if evidence.is_empty() {
        return "No evidence chain available.".to_string();
    }
    format!("Evidence sources: {}", dedup_first_seen(evidence).join(", "))
}

/// Builds the user message for the generation tiers.
#[must_use]
pub fn build_synthesis_prompt(state: &WorkflowState) -> String {
    let role = state.identity().role();
    format!(
        "<query>{query}</query>\n\n\
         <retrieved_context>\n{context}\n</retrieved_context>\n\n\
         <analytics>\n{analytics}\n</analytics>\n\n\
         <media>\n{media}\n</media>\n\n\
         <evidence>\n{evidence}\n</evidence>\n\n\
         Answer the query for a {role} ({query_type}, {complexity} complexity), \
         citing the evidence tags you rely on.",
        query = state.query(),
        context = format_retrieved_context(state.retrieved_context()),
        analytics = format_analytics(state.analytics()),
        media = format_media(state.media()),
        evidence = format_evidence(state.evidence()),
        query_type = state.intent().query_type,
        complexity = state.intent().complexity,
    )
}

/// Renders the deterministic answer used by the template tier.
///
/// Summarises what was gathered without any model call.
#[must_use]
pub fn render_template_answer(state: &WorkflowState) -> String {
    let role = state.identity().role();
    let mut out = format!(
        "Here is a summary from a {role} perspective, focused on {}.\n",
        focus_areas(role).join(", ")
    );

    if !state.retrieved_context().is_empty() {
        let _ = write!(
            out,
            "\nBackground:\n{}\n",
            format_retrieved_context(state.retrieved_context())
        );
    }
    if state.analytics().is_some_and(|a| !a.frame.is_empty()) {
        let _ = write!(out, "\nStatistics:\n{}\n", format_analytics(state.analytics()));
    }
    if !state.media().is_empty() {
        let _ = write!(out, "\nVideo:\n{}\n", format_media(state.media()));
    }

    out.push_str(
        "\nThe analytics model is currently unavailable, so this answer lists the gathered data without interpretation.",
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::core::{AnalysisKind, EntityFilters, Identity, TableFrame, ToolKind, ToolPayload};
    use crate::workflow::{ToolResult, evidence};

    fn passage(text: &str, source: &str) -> Passage {
        Passage {
            text: text.to_string(),
            source: source.to_string(),
            category: "rules".to_string(),
            score: 0.9,
        }
    }

    fn analytics(rows: usize) -> AnalyticsPayload {
        AnalyticsPayload {
            kind: AnalysisKind::PlayerPerformance,
            frame: TableFrame {
                columns: vec!["player".to_string(), "points".to_string()],
                rows: (0..rows)
                    .map(|i| vec![serde_json::json!(format!("P{i}")), serde_json::json!(i)])
                    .collect(),
                source: "skaters".to_string(),
            },
            filters: EntityFilters::default(),
        }
    }

    #[test]
    fn test_context_keeps_top_three() {
        let passages: Vec<Passage> = (0..5)
            .map(|i| passage(&format!("passage number {i}"), &format!("s{i}")))
            .collect();
        let text = format_retrieved_context(&passages);
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("1. [s0:rules] passage number 0..."));
        assert!(!text.contains("[s3:rules]"));
    }

    #[test]
    fn test_context_clips_long_passages() {
        let long = "x".repeat(500);
        let text = format_retrieved_context(&[passage(&long, "s")]);
        assert_eq!(text.len(), "1. [s:rules] ".len() + PASSAGE_CHARS + 3);
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(format_retrieved_context(&[]), "No specific hockey context retrieved.");
        assert_eq!(format_analytics(None), "No analytics data available.");
        assert_eq!(format_analytics(Some(&analytics(0))), "No analytics data available.");
        assert_eq!(format_evidence(&[]), "No evidence chain available.");
    }

    #[test]
    fn test_format_analytics_rows() {
        let text = format_analytics(Some(&analytics(7)));
        assert!(text.starts_with("Analysis: player_performance (source: skaters, 7 rows)"));
        assert!(text.contains("- player=P0, points=0"));
        assert!(text.contains("- ... 2 more rows"));
        assert!(!text.contains("P5"));
    }

    #[test]
    fn test_format_evidence_dedups_in_order() {
        let evidence = vec!["[b]".to_string(), "[a]".to_string(), "[b]".to_string()];
        assert_eq!(format_evidence(&evidence), "Evidence sources: [b], [a]");
    }

    #[test]
    fn test_system_prompt_per_role() {
        let prompts = PromptSet::defaults();
        let coach = prompts.system_prompt(Role::Coach);
        assert!(coach.contains("game planning"));
        assert!(coach.contains("matchups"));
        let staff = prompts.system_prompt(Role::Staff);
        assert!(staff.contains("player welfare"));
        assert_ne!(coach, staff);
    }

    #[test]
    fn test_build_synthesis_prompt() {
        let state = WorkflowState::new("How is Suzuki doing?", Identity::new(Role::Analyst, "a"));
        let state = evidence::record(
            state,
            ToolResult::succeeded(
                ToolKind::StructuredQuery,
                ToolPayload::Analytics(analytics(2)),
                vec!["[skaters:player_performance]".to_string()],
                Duration::from_millis(4),
            ),
        );
        let prompt = build_synthesis_prompt(&state);
        assert!(prompt.contains("<query>How is Suzuki doing?</query>"));
        assert!(prompt.contains("player=P1, points=1"));
        assert!(prompt.contains("Evidence sources: [skaters:player_performance]"));
        assert!(prompt.contains("No video clips retrieved."));
    }

    #[test]
    fn test_template_answer_lists_gathered_data() {
        let state = WorkflowState::new("q", Identity::new(Role::Coach, "c"));
        let state = evidence::record(
            state,
            ToolResult::succeeded(
                ToolKind::StructuredQuery,
                ToolPayload::Analytics(analytics(1)),
                vec!["[skaters:player_performance]".to_string()],
                Duration::from_millis(1),
            ),
        );
        let answer = render_template_answer(&state);
        assert!(answer.contains("coach perspective"));
        assert!(answer.contains("Statistics:"));
        assert!(!answer.contains("Background:"));
    }

    #[test]
    fn test_load_overrides_and_write_defaults() {
        let dir = tempfile::tempdir().unwrap_or_else(|_| unreachable!());
        std::fs::write(dir.path().join("coach.md"), "Custom coach prompt.")
            .unwrap_or_else(|_| unreachable!());

        let prompts = PromptSet::load(Some(dir.path()));
        assert_eq!(prompts.role_prompt(Role::Coach), "Custom coach prompt.");
        assert_eq!(prompts.role_prompt(Role::Scout), SCOUT_SYSTEM_PROMPT);

        let written = PromptSet::write_defaults(dir.path()).unwrap_or_else(|_| unreachable!());
        assert_eq!(written.len(), 4);
        let kept = std::fs::read_to_string(dir.path().join("coach.md"))
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(kept, "Custom coach prompt.");
    }
}
