//! Classifier vocabulary.
//!
//! The vocabulary is data, not code: the compiled-in default covers the
//! Montreal roster and common hockey phrasing, and deployments can swap it
//! for a JSON file via [`Vocabulary::from_path`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{QueryType, ToolKind};
use crate::error::ConfigError;

/// Maps a set of phrases to a query type and tool requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRule {
    /// Query type this rule votes for. `None` rules only contribute tools.
    #[serde(default)]
    pub query_type: Option<QueryType>,
    /// Trigger phrases, matched on whole words.
    pub phrases: Vec<String>,
    /// Tools required when any phrase matches.
    #[serde(default)]
    pub tools: Vec<ToolKind>,
    /// Whether a match calls for background knowledge.
    #[serde(default)]
    pub needs_context: bool,
}

/// A named subject and the aliases it is mentioned by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectEntry {
    /// Canonical display name.
    pub name: String,
    /// Alternate spellings (surname, nickname).
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// A time window and the regular expression that detects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Window keyword (e.g. `"last_5_games"`).
    pub name: String,
    /// Case-insensitive pattern.
    pub pattern: String,
}

/// An event category and its trigger keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCategory {
    /// Category name as stored in the media index.
    pub category: String,
    /// Trigger keywords, matched on whole words.
    pub keywords: Vec<String>,
    /// Generic words recognised but never used as a filter.
    #[serde(default)]
    pub generic: bool,
}

/// Vocabulary driving the lexical classifier and entity extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Intent rules, in priority order for tie-breaks.
    pub rules: Vec<IntentRule>,
    /// Known subjects.
    #[serde(default)]
    pub subjects: Vec<SubjectEntry>,
    /// Known opponent teams.
    #[serde(default)]
    pub opponents: Vec<String>,
    /// Time windows, first match wins.
    #[serde(default)]
    pub time_windows: Vec<TimeWindow>,
    /// Words that make a query a comparison.
    #[serde(default)]
    pub comparison_markers: Vec<String>,
    /// Words that make a query a trend question.
    #[serde(default)]
    pub trend_markers: Vec<String>,
    /// Words by which the requester refers to themself.
    #[serde(default)]
    pub self_references: Vec<String>,
    /// Event categories for media filtering.
    #[serde(default)]
    pub events: Vec<EventCategory>,
    /// Terms that mark a query as already domain-specific.
    #[serde(default)]
    pub domain_terms: Vec<String>,
    /// Suffix appended to knowledge searches lacking any domain term.
    #[serde(default)]
    pub domain_suffix: String,
}

impl Vocabulary {
    /// Loads a vocabulary from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Vocabulary`] if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Vocabulary {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| ConfigError::Vocabulary {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

fn list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn rule(query_type: Option<QueryType>, phrases: &[&str], tools: &[ToolKind], ctx: bool) -> IntentRule {
    IntentRule {
        query_type,
        phrases: list(phrases),
        tools: tools.to_vec(),
        needs_context: ctx,
    }
}

fn subject(name: &str, aliases: &[&str]) -> SubjectEntry {
    SubjectEntry {
        name: name.to_string(),
        aliases: list(aliases),
    }
}

fn window(name: &str, pattern: &str) -> TimeWindow {
    TimeWindow {
        name: name.to_string(),
        pattern: pattern.to_string(),
    }
}

fn event(category: &str, keywords: &[&str], generic: bool) -> EventCategory {
    EventCategory {
        category: category.to_string(),
        keywords: list(keywords),
        generic,
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        use QueryType as Q;
        use ToolKind as T;

        Self {
            rules: vec![
                rule(
                    Some(Q::PlayerAnalysis),
                    &[
                        "performing", "performance", "playing", "stats", "statistics",
                        "production", "how is", "how has", "season so far",
                    ],
                    &[T::StructuredQuery],
                    false,
                ),
                rule(
                    Some(Q::TeamPerformance),
                    &[
                        "team performance", "team stats", "standings", "record",
                        "win streak", "losing streak", "how are we", "our team",
                    ],
                    &[T::StructuredQuery],
                    false,
                ),
                rule(
                    Some(Q::GameAnalysis),
                    &[
                        "last game", "game recap", "recap", "box score", "game summary",
                        "what happened", "tonight's game",
                    ],
                    &[T::StructuredQuery],
                    false,
                ),
                rule(
                    Some(Q::MatchupComparison),
                    &["vs", "versus", "compare", "compared to", "matchup", "head to head"],
                    &[T::MatchupAnalysis],
                    false,
                ),
                rule(
                    Some(Q::TacticalAnalysis),
                    &[
                        "system", "systems", "strategy", "tactics", "tactical", "forecheck",
                        "breakout", "neutral zone", "trap", "deployment", "game plan",
                        "explain",
                    ],
                    &[T::VectorSearch],
                    true,
                ),
                rule(
                    Some(Q::StatisticalQuery),
                    &[
                        "how many", "total", "average", "percentage", "leader", "leaders",
                        "xg", "corsi", "fenwick", "metric", "metrics",
                    ],
                    &[T::StructuredQuery, T::MetricsCalculation],
                    false,
                ),
                rule(
                    Some(Q::GeneralKnowledge),
                    &[
                        "rule", "rules", "what is", "what does", "define", "definition",
                        "history", "offside", "icing",
                    ],
                    &[T::VectorSearch],
                    true,
                ),
                rule(
                    None,
                    &[
                        "clip", "clips", "video", "videos", "highlight", "highlights",
                        "footage", "replay", "shifts", "watch",
                    ],
                    &[T::MediaRetrieval],
                    false,
                ),
            ],
            subjects: vec![
                subject("Nick Suzuki", &["suzuki"]),
                subject("Cole Caufield", &["caufield"]),
                subject("Juraj Slafkovsky", &["slafkovsky", "slaf"]),
                subject("Kirby Dach", &["dach"]),
                subject("Alex Newhook", &["newhook"]),
                subject("Brendan Gallagher", &["gallagher", "gally"]),
                subject("Josh Anderson", &["anderson"]),
                subject("Jake Evans", &["evans"]),
                subject("Joel Armia", &["armia"]),
                subject("Christian Dvorak", &["dvorak"]),
                subject("Emil Heineman", &["heineman"]),
                subject("Oliver Kapanen", &["kapanen"]),
                subject("Owen Beck", &["beck"]),
                subject("Joshua Roy", &[]),
                subject("Rafael Harvey-Pinard", &["harvey-pinard"]),
                subject("Lane Hutson", &["hutson"]),
                subject("Kaiden Guhle", &["guhle"]),
                subject("Mike Matheson", &["matheson"]),
                subject("David Savard", &["savard"]),
                subject("Arber Xhekaj", &["xhekaj"]),
                subject("Jayden Struble", &["struble"]),
                subject("Justin Barron", &["barron"]),
                subject("Logan Mailloux", &["mailloux"]),
                subject("Adam Engstrom", &["engstrom"]),
                subject("Samuel Montembeault", &["montembeault", "monty"]),
                subject("Cayden Primeau", &["primeau"]),
                subject("Jakub Dobes", &["dobes"]),
            ],
            opponents: list(&[
                "Toronto", "Boston", "Buffalo", "Ottawa", "Detroit", "Florida", "Tampa Bay",
                "Washington", "Carolina", "Columbus", "Pittsburgh", "Philadelphia",
                "New Jersey", "NY Rangers", "NY Islanders", "Colorado", "Vegas", "Minnesota",
                "Winnipeg", "Calgary", "Edmonton", "Vancouver", "Seattle", "Anaheim",
                "Los Angeles", "San Jose", "Utah", "St Louis", "Chicago", "Dallas",
                "Nashville",
            ]),
            time_windows: vec![
                window(
                    "last_game",
                    r"last\s+game|previous\s+game|most\s+recent\s+game|tonight'?s\s+game|yesterday'?s\s+game",
                ),
                window("last_2_games", r"(last|past)\s+2\s+games|last\s+couple\s+games"),
                window("last_3_games", r"(last|past)\s+3\s+games"),
                window("last_5_games", r"(last|past)\s+5\s+games"),
                window("last_10_games", r"(last|past)\s+10\s+games"),
                window(
                    "this_season",
                    r"this\s+season|current\s+season|2024-25\s+season|2024-2025\s+season",
                ),
                window(
                    "last_season",
                    r"last\s+season|previous\s+season|2023-24\s+season|2023-2024\s+season",
                ),
                window("this_month", r"this\s+month|current\s+month|past\s+month"),
                window("this_week", r"this\s+week|past\s+week|recent\s+games"),
                window("recent", r"\brecent\b|\blately\b|\brecently\b"),
                window("playoffs", r"playoffs?|postseason|post\s+season"),
                window("regular_season", r"regular\s+season|season\s+games"),
                window("home_games", r"home\s+games?|at\s+home|bell\s+centre"),
                window("away_games", r"away\s+games?|on\s+the\s+road|road\s+games?"),
                window("overtime", r"\bovertime\b|\bot\b|extra\s+time"),
                window("shootout", r"\bshootout\b|penalty\s+shots?"),
            ],
            comparison_markers: list(&[
                "compare", "compared", "comparison", "versus", "vs", "better than",
                "worse than", "head to head",
            ]),
            trend_markers: list(&[
                "trend", "trends", "trending", "over time", "improving", "declining",
                "progression", "lately",
            ]),
            self_references: list(&["my", "me", "myself", "mine"]),
            events: vec![
                event(
                    "goals",
                    &["goal", "goals", "scoring", "scored", "tally", "tallies", "lamp", "finish"],
                    false,
                ),
                event(
                    "assists",
                    &["assist", "assists", "setup", "playmaking", "helper", "helpers", "dish", "feed"],
                    false,
                ),
                event(
                    "saves",
                    &["save", "saves", "goaltending", "stop", "stops", "denial", "robbed"],
                    false,
                ),
                event(
                    "hits",
                    &["hit", "hits", "check", "checks", "physical", "body check", "big hit"],
                    false,
                ),
                event("fights", &["fight", "fights", "scrap", "scraps", "tilt", "drop gloves"], false),
                event(
                    "penalties",
                    &["penalty", "penalties", "infraction", "infractions", "sin bin"],
                    false,
                ),
                event(
                    "powerplay",
                    &["powerplay", "power play", "pp", "man advantage", "5v4", "5 on 4"],
                    false,
                ),
                event(
                    "penalty_kill",
                    &["penalty kill", "pk", "short handed", "shorthanded", "4v5", "4 on 5"],
                    false,
                ),
                event("overtime", &["overtime", "ot", "3 on 3", "3v3"], false),
                event("shootout", &["shootout", "penalty shot", "breakaway"], false),
                event("faceoffs", &["faceoff", "faceoffs", "face-off", "draw", "draws"], false),
                event(
                    "turnovers",
                    &["turnover", "turnovers", "giveaway", "giveaways", "takeaway", "takeaways"],
                    false,
                ),
                event("blocks", &["block", "blocks", "blocked shot", "shot block"], false),
                event("zone_entries", &["zone entry", "zone entries", "carry in"], false),
                event("zone_exits", &["zone exit", "zone exits", "clearing"], false),
                event("shifts", &["shift", "shifts", "ice time", "line change"], true),
                event(
                    "highlights",
                    &["highlight", "highlights", "clip", "clips", "best", "top play"],
                    true,
                ),
            ],
            domain_terms: list(&["hockey", "nhl", "canadiens", "habs"]),
            domain_suffix: "hockey".to_string(),
        }
    }
}
