//! Structured analytics over the tabular store.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ToolNode, ToolOutput};
use crate::classifier::IntentClassifier;
use crate::clients::TabularStore;
use crate::core::{AnalysisKind, AnalyticsPayload, QueryType, ToolKind, ToolPayload, ToolSet};
use crate::error::ToolError;
use crate::policy;
use crate::workflow::WorkflowState;

/// Data tools in the order they name a shared analytics call.
const DATA_TOOLS: [ToolKind; 3] = [
    ToolKind::StructuredQuery,
    ToolKind::MetricsCalculation,
    ToolKind::MatchupAnalysis,
];

/// Analysis routine for a query type.
#[must_use]
pub const fn analysis_kind(query_type: QueryType) -> AnalysisKind {
    match query_type {
        QueryType::PlayerAnalysis => AnalysisKind::PlayerPerformance,
        QueryType::TeamPerformance => AnalysisKind::TeamPerformance,
        QueryType::GameAnalysis => AnalysisKind::GameAnalysis,
        QueryType::MatchupComparison => AnalysisKind::MatchupAnalysis,
        QueryType::StatisticalQuery => AnalysisKind::StatisticalQuery,
        QueryType::TacticalAnalysis | QueryType::GeneralKnowledge => {
            AnalysisKind::GeneralAnalytics
        }
    }
}

/// Tabular analytics node.
///
/// Serves every data tool (structured query, metrics, matchup) with a
/// single store call.
pub struct AnalyticsNode {
    store: Arc<dyn TabularStore>,
    classifier: Arc<dyn IntentClassifier>,
}

impl AnalyticsNode {
    /// Creates the node.
    #[must_use]
    pub fn new(store: Arc<dyn TabularStore>, classifier: Arc<dyn IntentClassifier>) -> Self {
        Self { store, classifier }
    }
}

/// Data tool the call is reported under: the first one requested.
#[must_use]
pub fn reported_tool(required: &ToolSet) -> ToolKind {
    DATA_TOOLS
        .into_iter()
        .find(|tool| required.contains(*tool))
        .unwrap_or(ToolKind::StructuredQuery)
}

#[async_trait]
impl ToolNode for AnalyticsNode {
    fn kind(&self) -> ToolKind {
        ToolKind::StructuredQuery
    }

    fn kind_for(&self, state: &WorkflowState) -> ToolKind {
        reported_tool(&state.intent().required_tools)
    }

    async fn fetch(&self, state: &WorkflowState) -> Result<ToolOutput, ToolError> {
        let identity = state.identity();
        let kind = analysis_kind(state.intent().query_type);
        policy::check_analysis(identity.role(), kind)?;

        let extracted = self.classifier.extract_filters(state.query(), identity);
        let filters = policy::scope_filters(identity, extracted)?;

        tracing::debug!(
            kind = %kind,
            subjects = ?filters.subjects,
            teams = ?filters.teams,
            store = self.store.name(),
            "analytics query"
        );
        let frame = self.store.query(&filters, kind).await?;
        let frame = policy::filter_rows(identity, frame);

        if frame.is_empty() {
            return Err(ToolError::Empty {
                message: format!("no {kind} rows matched"),
            });
        }

        let source = if frame.source.is_empty() {
            kind.as_str().to_string()
        } else {
            frame.source.clone()
        };
        Ok(ToolOutput {
            payload: ToolPayload::Analytics(AnalyticsPayload {
                kind,
                frame,
                filters,
            }),
            citations: vec![format!("[{source}:{kind}]")],
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::classifier::LexicalClassifier;
    use crate::core::{EntityFilters, Identity, Role, TableFrame};
    use crate::error::ClientError;
    use serde_json::json;
    use std::sync::Mutex;
    use test_case::test_case;

    struct Table {
        frame: TableFrame,
        seen: Mutex<Vec<EntityFilters>>,
    }

    impl Table {
        fn new(rows: Vec<Vec<serde_json::Value>>) -> Self {
            Self {
                frame: TableFrame {
                    columns: vec!["player".to_string(), "goals".to_string()],
                    rows,
                    source: "player_stats".to_string(),
                },
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TabularStore for Table {
        fn name(&self) -> &'static str {
            "table"
        }

        async fn query(
            &self,
            filters: &EntityFilters,
            _kind: AnalysisKind,
        ) -> Result<TableFrame, ClientError> {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(filters.clone());
            }
            Ok(self.frame.clone())
        }
    }

    fn node(table: Arc<Table>) -> AnalyticsNode {
        let classifier: Arc<dyn IntentClassifier> = Arc::new(
            LexicalClassifier::with_default_vocabulary().unwrap_or_else(|_| unreachable!()),
        );
        AnalyticsNode::new(table, classifier)
    }

    fn state(query: &str, identity: Identity, query_type: QueryType) -> WorkflowState {
        let mut intent = crate::core::IntentDescriptor::general();
        intent.query_type = query_type;
        WorkflowState::new(query, identity).with_intent(intent)
    }

    #[test_case(QueryType::PlayerAnalysis, AnalysisKind::PlayerPerformance)]
    #[test_case(QueryType::TeamPerformance, AnalysisKind::TeamPerformance)]
    #[test_case(QueryType::GameAnalysis, AnalysisKind::GameAnalysis)]
    #[test_case(QueryType::MatchupComparison, AnalysisKind::MatchupAnalysis)]
    #[test_case(QueryType::StatisticalQuery, AnalysisKind::StatisticalQuery)]
    #[test_case(QueryType::TacticalAnalysis, AnalysisKind::GeneralAnalytics)]
    #[test_case(QueryType::GeneralKnowledge, AnalysisKind::GeneralAnalytics)]
    fn test_analysis_kind(query_type: QueryType, expected: AnalysisKind) {
        assert_eq!(analysis_kind(query_type), expected);
    }

    #[tokio::test]
    async fn test_citation_names_source_and_kind() {
        let table = Arc::new(Table::new(vec![vec![json!("Nick Suzuki"), json!(20)]]));
        let state = state(
            "How is Suzuki performing this season?",
            Identity::new(Role::Analyst, "A"),
            QueryType::PlayerAnalysis,
        );
        let output = node(table).fetch(&state).await.unwrap_or_else(|_| unreachable!());
        assert_eq!(output.citations, vec!["[player_stats:player_performance]".to_string()]);
    }

    #[tokio::test]
    async fn test_player_without_subject_sees_only_own_rows() {
        let table = Arc::new(Table::new(vec![
            vec![json!("Nick Suzuki"), json!(20)],
            vec![json!("Cole Caufield"), json!(25)],
        ]));
        let state = state(
            "How many goals this season?",
            Identity::new(Role::Player, "Cole Caufield"),
            QueryType::StatisticalQuery,
        );
        let output = node(Arc::clone(&table))
            .fetch(&state)
            .await
            .unwrap_or_else(|_| unreachable!());

        let ToolPayload::Analytics(payload) = output.payload else {
            panic!("expected analytics");
        };
        assert_eq!(payload.frame.rows.len(), 1);
        assert_eq!(payload.frame.rows[0][0], json!("Cole Caufield"));
        assert_eq!(payload.filters.subjects, vec!["Cole Caufield".to_string()]);

        let seen = table.seen.lock().map(|s| s.clone()).unwrap_or_default();
        assert_eq!(seen[0].subjects, vec!["Cole Caufield".to_string()]);
    }

    #[tokio::test]
    async fn test_player_asking_about_teammate_is_denied() {
        let table = Arc::new(Table::new(vec![vec![json!("Nick Suzuki"), json!(20)]]));
        let state = state(
            "How is Suzuki performing?",
            Identity::new(Role::Player, "Cole Caufield"),
            QueryType::PlayerAnalysis,
        );
        let result = node(table).fetch(&state).await;
        assert!(matches!(result, Err(ToolError::PermissionDenied { .. })));
    }

    #[tokio::test]
    async fn test_matchup_requires_opponent_access() {
        let table = Arc::new(Table::new(vec![vec![json!("Nick Suzuki"), json!(20)]]));
        let state = state(
            "Compare us versus Toronto",
            Identity::new(Role::Staff, "S"),
            QueryType::MatchupComparison,
        );
        let result = node(table).fetch(&state).await;
        assert!(matches!(result, Err(ToolError::PermissionDenied { .. })));
    }

    #[tokio::test]
    async fn test_analyst_confined_to_identity_teams() {
        let table = Arc::new(Table::new(vec![vec![json!("Nick Suzuki"), json!(20)]]));
        let state = state(
            "How is Suzuki performing?",
            Identity::new(Role::Analyst, "A").with_teams(["MTL"]),
            QueryType::PlayerAnalysis,
        );
        node(Arc::clone(&table))
            .fetch(&state)
            .await
            .unwrap_or_else(|_| unreachable!());

        let seen = table.seen.lock().map(|s| s.clone()).unwrap_or_default();
        assert_eq!(seen[0].teams, vec!["MTL".to_string()]);
    }

    #[test_case(&[ToolKind::StructuredQuery], ToolKind::StructuredQuery)]
    #[test_case(&[ToolKind::MetricsCalculation], ToolKind::MetricsCalculation)]
    #[test_case(&[ToolKind::VectorSearch, ToolKind::MatchupAnalysis], ToolKind::MatchupAnalysis)]
    #[test_case(&[ToolKind::MatchupAnalysis, ToolKind::StructuredQuery], ToolKind::StructuredQuery)]
    #[test_case(&[], ToolKind::StructuredQuery)]
    fn test_reported_tool(required: &[ToolKind], expected: ToolKind) {
        let set: ToolSet = required.iter().copied().collect();
        assert_eq!(reported_tool(&set), expected);
    }

    #[tokio::test]
    async fn test_empty_frame_is_failure() {
        let table = Arc::new(Table::new(Vec::new()));
        let state = state(
            "team stats",
            Identity::new(Role::Coach, "C"),
            QueryType::TeamPerformance,
        );
        let result = node(table).fetch(&state).await;
        assert!(matches!(result, Err(ToolError::Empty { .. })));
    }
}
