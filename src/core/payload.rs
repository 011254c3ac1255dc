//! Typed tool payloads.
//!
//! Each tool node produces exactly one [`ToolPayload`] variant, so consumers
//! match exhaustively instead of probing an untyped map.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A passage returned by knowledge retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Passage text.
    pub text: String,
    /// Originating document or collection.
    #[serde(default)]
    pub source: String,
    /// Content category (e.g. `"rules"`, `"tactics"`).
    #[serde(default)]
    pub category: String,
    /// Similarity score in `[0, 1]`.
    pub score: f32,
}

/// Column holding the player a row describes.
pub const SUBJECT_COLUMN: &str = "player";
/// Column holding the opponent a row describes.
pub const OPPONENT_COLUMN: &str = "opponent";
/// Column holding the time window a row covers.
pub const WINDOW_COLUMN: &str = "window";
/// Column holding the team code a row belongs to.
pub const TEAM_COLUMN: &str = "team";

/// A tabular result with named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableFrame {
    /// Column names.
    pub columns: Vec<String>,
    /// Row values, aligned with `columns`.
    pub rows: Vec<Vec<serde_json::Value>>,
    /// Identifier of the table the rows came from.
    pub source: String,
}

impl TableFrame {
    /// Position of a column by case-insensitive name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Returns `true` if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Analysis routine selected by the analytics node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Individual player performance.
    PlayerPerformance,
    /// Team-level performance.
    TeamPerformance,
    /// Game detail.
    GameAnalysis,
    /// Head-to-head comparison.
    MatchupAnalysis,
    /// Ad hoc statistic lookup.
    StatisticalQuery,
    /// Fallback routine.
    GeneralAnalytics,
}

impl AnalysisKind {
    /// Returns the string representation, also used as the table partition name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PlayerPerformance => "player_performance",
            Self::TeamPerformance => "team_performance",
            Self::GameAnalysis => "game_analysis",
            Self::MatchupAnalysis => "matchup_analysis",
            Self::StatisticalQuery => "statistical_query",
            Self::GeneralAnalytics => "general_analytics",
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity filters extracted from a query.
///
/// Shared by the analytics and media nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityFilters {
    /// Subject (player) names.
    #[serde(default)]
    pub subjects: Vec<String>,
    /// Event categories (e.g. `"goal"`, `"save"`).
    #[serde(default)]
    pub categories: Vec<String>,
    /// Opponent team names.
    #[serde(default)]
    pub opponents: Vec<String>,
    /// Time-window keyword (e.g. `"last_5_games"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<String>,
    /// Team codes the requester may see. Empty means unrestricted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub teams: Vec<String>,
}

/// Output of the analytics node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsPayload {
    /// Routine that produced the frame.
    pub kind: AnalysisKind,
    /// Resulting rows.
    pub frame: TableFrame,
    /// Filters the rows were selected with.
    pub filters: EntityFilters,
}

/// A media clip reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaClip {
    /// Clip identifier.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Subject the clip belongs to.
    pub owner: String,
    /// Event category.
    #[serde(default)]
    pub category: String,
    /// Playback location.
    pub uri: String,
    /// Thumbnail location.
    #[serde(default)]
    pub thumbnail_uri: Option<String>,
    /// Clip length.
    #[serde(default, with = "duration_secs")]
    pub duration: Duration,
    /// Relevance score.
    #[serde(default)]
    pub score: f32,
    /// Opponent, when the index records one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent: Option<String>,
    /// Time-window tags the clip falls into.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub windows: Vec<String>,
    /// Team code of the clip owner, when the index records one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

/// Result payload of one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ToolPayload {
    /// Passages from knowledge retrieval.
    Passages(Vec<Passage>),
    /// Rows from the analytics node.
    Analytics(AnalyticsPayload),
    /// Clips from media retrieval.
    Media(Vec<MediaClip>),
}

impl ToolPayload {
    /// Returns `true` if the payload carries nothing usable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Passages(p) => p.is_empty(),
            Self::Analytics(a) => a.frame.is_empty(),
            Self::Media(m) => m.is_empty(),
        }
    }

    /// Number of items carried.
    #[must_use]
    pub fn item_count(&self) -> usize {
        match self {
            Self::Passages(p) => p.len(),
            Self::Analytics(a) => a.frame.rows.len(),
            Self::Media(m) => m.len(),
        }
    }
}

/// Serializes a `Duration` as fractional seconds.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Ok(Duration::try_from_secs_f64(secs).unwrap_or_default())
    }
}

/// Distinct non-empty keys in first-seen order.
pub(crate) fn first_seen_groups<'a, I>(keys: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    keys.into_iter()
        .filter(|k| !k.is_empty() && seen.insert(*k))
        .collect()
}
