//! Intent descriptor types produced by the classifier.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// What kind of question was asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// Individual player performance.
    PlayerAnalysis,
    /// Team-level performance.
    TeamPerformance,
    /// A specific game or games.
    GameAnalysis,
    /// Head-to-head comparison.
    MatchupComparison,
    /// Systems, tactics and strategy.
    TacticalAnalysis,
    /// A direct statistic lookup.
    StatisticalQuery,
    /// Anything else, including unclassifiable input.
    GeneralKnowledge,
}

impl QueryType {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PlayerAnalysis => "player_analysis",
            Self::TeamPerformance => "team_performance",
            Self::GameAnalysis => "game_analysis",
            Self::MatchupComparison => "matchup_comparison",
            Self::TacticalAnalysis => "tactical_analysis",
            Self::StatisticalQuery => "statistical_query",
            Self::GeneralKnowledge => "general_knowledge",
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complexity tier derived from detected entities and qualifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    /// Zero or one entity.
    Simple,
    /// Two entities.
    Moderate,
    /// Three or more entities, or comparison/trend language.
    Complex,
}

impl Complexity {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a retrieval or analysis tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Knowledge retrieval over the vector store.
    VectorSearch,
    /// Tabular analytics query.
    StructuredQuery,
    /// Indexed media clip retrieval.
    MediaRetrieval,
    /// Derived metric calculation (served by the analytics node).
    MetricsCalculation,
    /// Matchup analysis (served by the analytics node).
    MatchupAnalysis,
}

impl ToolKind {
    /// All tool kinds, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::VectorSearch,
        Self::StructuredQuery,
        Self::MediaRetrieval,
        Self::MetricsCalculation,
        Self::MatchupAnalysis,
    ];

    /// Tools answered by the structured analytics node.
    pub const DATA_TOOLS: [Self; 3] = [
        Self::StructuredQuery,
        Self::MetricsCalculation,
        Self::MatchupAnalysis,
    ];

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VectorSearch => "vector_search",
            Self::StructuredQuery => "structured_query",
            Self::MediaRetrieval => "media_retrieval",
            Self::MetricsCalculation => "metrics_calculation",
            Self::MatchupAnalysis => "matchup_analysis",
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of required tools.
///
/// Ordered so that iteration and serialization are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolSet(BTreeSet<ToolKind>);

impl ToolSet {
    /// Empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Adds a tool.
    pub fn insert(&mut self, tool: ToolKind) {
        self.0.insert(tool);
    }

    /// Returns `true` if the tool is required.
    #[must_use]
    pub fn contains(&self, tool: ToolKind) -> bool {
        self.0.contains(&tool)
    }

    /// Returns `true` if no tool is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of required tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates in [`ToolKind`] order.
    pub fn iter(&self) -> impl Iterator<Item = ToolKind> + '_ {
        self.0.iter().copied()
    }

    /// Returns `true` if knowledge retrieval is required.
    #[must_use]
    pub fn needs_knowledge(&self) -> bool {
        self.contains(ToolKind::VectorSearch)
    }

    /// Returns `true` if media retrieval is required.
    #[must_use]
    pub fn needs_media(&self) -> bool {
        self.contains(ToolKind::MediaRetrieval)
    }

    /// Returns `true` if any tool served by the analytics node is required.
    #[must_use]
    pub fn needs_data(&self) -> bool {
        ToolKind::DATA_TOOLS.iter().any(|t| self.contains(*t))
    }
}

impl FromIterator<ToolKind> for ToolSet {
    fn from_iter<I: IntoIterator<Item = ToolKind>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[ToolKind; N]> for ToolSet {
    fn from(tools: [ToolKind; N]) -> Self {
        tools.into_iter().collect()
    }
}

/// Entities recognised in the query text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    /// Named subjects (players), in first-seen order.
    #[serde(default)]
    pub subjects: Vec<String>,
    /// Opponent teams, in first-seen order.
    #[serde(default)]
    pub opponents: Vec<String>,
    /// Time-window keyword, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<String>,
}

impl Entities {
    /// Number of distinct entities and qualifiers.
    #[must_use]
    pub fn count(&self) -> usize {
        self.subjects.len() + self.opponents.len() + usize::from(self.time_window.is_some())
    }
}

/// Structured result of intent classification.
///
/// Created once per query; nothing downstream mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentDescriptor {
    /// Classified query type.
    pub query_type: QueryType,
    /// Complexity tier.
    pub complexity: Complexity,
    /// Tools the query needs.
    pub required_tools: ToolSet,
    /// Whether background knowledge should accompany the answer.
    pub needs_context: bool,
    /// Entities recognised during classification.
    #[serde(default)]
    pub entities: Entities,
}

impl IntentDescriptor {
    /// Descriptor used for ambiguous input: no tools, straight to synthesis.
    #[must_use]
    pub fn general() -> Self {
        Self {
            query_type: QueryType::GeneralKnowledge,
            complexity: Complexity::Simple,
            required_tools: ToolSet::new(),
            needs_context: false,
            entities: Entities::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_set_categories() {
        let tools = ToolSet::from([ToolKind::MatchupAnalysis]);
        assert!(tools.needs_data());
        assert!(!tools.needs_knowledge());
        assert!(!tools.needs_media());

        let tools = ToolSet::from([ToolKind::VectorSearch, ToolKind::MediaRetrieval]);
        assert!(!tools.needs_data());
        assert!(tools.needs_knowledge());
        assert!(tools.needs_media());
    }

    #[test]
    fn test_tool_set_serializes_in_order() {
        let tools = ToolSet::from([ToolKind::MediaRetrieval, ToolKind::VectorSearch]);
        let json = serde_json::to_string(&tools).unwrap_or_default();
        assert_eq!(json, r#"["vector_search","media_retrieval"]"#);
    }

    #[test]
    fn test_entity_count() {
        let entities = Entities {
            subjects: vec!["Suzuki".to_string()],
            opponents: vec!["Toronto".to_string()],
            time_window: Some("this_season".to_string()),
        };
        assert_eq!(entities.count(), 3);
        assert_eq!(Entities::default().count(), 0);
    }

    #[test]
    fn test_general_descriptor() {
        let intent = IntentDescriptor::general();
        assert_eq!(intent.query_type, QueryType::GeneralKnowledge);
        assert!(intent.required_tools.is_empty());
        assert_eq!(intent.query_type.to_string(), "general_knowledge");
    }
}
