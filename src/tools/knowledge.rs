//! Knowledge retrieval over the vector store.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ToolNode, ToolOutput};
use crate::classifier::IntentClassifier;
use crate::clients::VectorStore;
use crate::config::OrchestratorConfig;
use crate::core::payload::first_seen_groups;
use crate::core::{Complexity, IntentDescriptor, Passage, QueryType, ToolKind, ToolPayload};
use crate::error::ToolError;
use crate::policy::allowed_scope;
use crate::workflow::WorkflowState;

/// Passages shorter than this, once trimmed, carry no usable content.
const MIN_PASSAGE_CHARS: usize = 20;

const DEFAULT_SOURCE: &str = "hockey_knowledge";
const DEFAULT_CATEGORY: &str = "general";

/// Vector search node.
pub struct KnowledgeNode {
    store: Arc<dyn VectorStore>,
    classifier: Arc<dyn IntentClassifier>,
    events_namespace: String,
    concepts_namespace: String,
    top_k_cap: usize,
    min_relevance: f32,
}

impl KnowledgeNode {
    /// Creates the node.
    #[must_use]
    pub fn new(
        store: Arc<dyn VectorStore>,
        classifier: Arc<dyn IntentClassifier>,
        config: &OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            classifier,
            events_namespace: config.events_namespace.clone(),
            concepts_namespace: config.concepts_namespace.clone(),
            top_k_cap: config.knowledge_top_k,
            min_relevance: config.min_relevance,
        }
    }

    /// Namespace for an intent.
    ///
    /// Event-oriented query types always search the events namespace.
    /// Conceptual types, and anything flagged as needing background, search
    /// the concepts namespace.
    #[must_use]
    pub fn namespace(&self, intent: &IntentDescriptor) -> &str {
        match intent.query_type {
            QueryType::PlayerAnalysis
            | QueryType::TeamPerformance
            | QueryType::GameAnalysis
            | QueryType::MatchupComparison => &self.events_namespace,
            QueryType::TacticalAnalysis | QueryType::GeneralKnowledge => &self.concepts_namespace,
            QueryType::StatisticalQuery if intent.needs_context => &self.concepts_namespace,
            QueryType::StatisticalQuery => &self.events_namespace,
        }
    }

    /// Number of passages to request.
    #[must_use]
    pub fn top_k(&self, complexity: Complexity) -> usize {
        let wanted = match complexity {
            Complexity::Simple => 3,
            Complexity::Moderate => 5,
            Complexity::Complex => 8,
        };
        wanted.min(self.top_k_cap)
    }
}

/// One `[source:category]` tag per distinct pair, in ranking order.
fn citations(passages: &[Passage]) -> Vec<String> {
    let tags: Vec<String> = passages
        .iter()
        .map(|p| {
            let source = if p.source.is_empty() { DEFAULT_SOURCE } else { &p.source };
            let category = if p.category.is_empty() {
                DEFAULT_CATEGORY
            } else {
                &p.category
            };
            format!("[{source}:{category}]")
        })
        .collect();
    first_seen_groups(tags.iter().map(String::as_str))
        .into_iter()
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl ToolNode for KnowledgeNode {
    fn kind(&self) -> ToolKind {
        ToolKind::VectorSearch
    }

    async fn fetch(&self, state: &WorkflowState) -> Result<ToolOutput, ToolError> {
        let intent = state.intent();
        let query = self.classifier.search_query(state.query());
        let namespace = self.namespace(intent);
        let top_k = self.top_k(intent.complexity);

        tracing::debug!(namespace, top_k, store = self.store.name(), "knowledge search");
        let raw = self
            .store
            .search(&query, namespace, top_k, self.min_relevance)
            .await?;
        let returned = raw.len();

        let scope = allowed_scope(state.identity().role());
        let mut passages: Vec<Passage> = raw
            .into_iter()
            .filter(|p| p.score >= self.min_relevance)
            .filter(|p| p.text.trim().chars().count() >= MIN_PASSAGE_CHARS)
            .filter(|p| scope.permits_category(&p.category))
            .collect();
        passages.sort_by(|a, b| b.score.total_cmp(&a.score));

        if passages.is_empty() {
            return Err(ToolError::Empty {
                message: format!("{returned} passages returned, none passed relevance and access filters"),
            });
        }

        Ok(ToolOutput {
            citations: citations(&passages),
            payload: ToolPayload::Passages(passages),
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::classifier::LexicalClassifier;
    use crate::core::{Identity, Role, ToolSet};
    use crate::error::ClientError;
    use std::sync::Mutex;
    use test_case::test_case;

    #[derive(Default)]
    struct Recording {
        passages: Vec<Passage>,
        calls: Mutex<Vec<(String, String, usize)>>,
    }

    #[async_trait]
    impl VectorStore for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn search(
            &self,
            query: &str,
            namespace: &str,
            top_k: usize,
            _min_score: f32,
        ) -> Result<Vec<Passage>, ClientError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((query.to_string(), namespace.to_string(), top_k));
            }
            Ok(self.passages.clone())
        }
    }

    fn passage(text: &str, source: &str, category: &str, score: f32) -> Passage {
        Passage {
            text: text.to_string(),
            source: source.to_string(),
            category: category.to_string(),
            score,
        }
    }

    fn node(store: Arc<Recording>) -> KnowledgeNode {
        let classifier: Arc<dyn IntentClassifier> = Arc::new(
            LexicalClassifier::with_default_vocabulary().unwrap_or_else(|_| unreachable!()),
        );
        let config = OrchestratorConfig::default();
        KnowledgeNode::new(store, classifier, &config)
    }

    fn intent(query_type: QueryType, needs_context: bool) -> IntentDescriptor {
        IntentDescriptor {
            query_type,
            complexity: Complexity::Simple,
            required_tools: ToolSet::from([ToolKind::VectorSearch]),
            needs_context,
            entities: crate::core::Entities::default(),
        }
    }

    #[test_case(QueryType::PlayerAnalysis, true, "events")]
    #[test_case(QueryType::MatchupComparison, false, "events")]
    #[test_case(QueryType::TacticalAnalysis, false, "prose")]
    #[test_case(QueryType::GeneralKnowledge, false, "prose")]
    #[test_case(QueryType::StatisticalQuery, true, "prose")]
    #[test_case(QueryType::StatisticalQuery, false, "events")]
    fn test_namespace_selection(query_type: QueryType, needs_context: bool, expected: &str) {
        let node = node(Arc::new(Recording::default()));
        assert_eq!(node.namespace(&intent(query_type, needs_context)), expected);
    }

    #[test_case(Complexity::Simple, 3)]
    #[test_case(Complexity::Moderate, 5)]
    #[test_case(Complexity::Complex, 5)]
    fn test_top_k_capped(complexity: Complexity, expected: usize) {
        let node = node(Arc::new(Recording::default()));
        assert_eq!(node.top_k(complexity), expected);
    }

    #[tokio::test]
    async fn test_filters_sorts_and_cites() {
        let store = Arc::new(Recording {
            passages: vec![
                passage("Icing is called when the puck crosses both red lines.", "rules", "rules", 0.8),
                passage("too short", "rules", "rules", 0.95),
                passage("Offside occurs when an attacker precedes the puck.", "rules", "rules", 0.9),
                passage("Low scoring passage that should be dropped entirely.", "misc", "general", 0.4),
            ],
            ..Recording::default()
        });
        let node = node(Arc::clone(&store));
        let state = WorkflowState::new("What is icing?", Identity::new(Role::Analyst, "A"))
            .with_intent(intent(QueryType::GeneralKnowledge, true));

        let output = node.fetch(&state).await.unwrap_or_else(|_| unreachable!());
        let ToolPayload::Passages(passages) = output.payload else {
            panic!("expected passages");
        };
        assert_eq!(passages.len(), 2);
        assert!(passages[0].score > passages[1].score);
        assert_eq!(output.citations, vec!["[rules:rules]".to_string()]);

        let calls = store.calls.lock().map(|c| c.clone()).unwrap_or_default();
        assert_eq!(
            calls,
            vec![("What is icing? hockey".to_string(), "prose".to_string(), 3)]
        );
    }

    #[tokio::test]
    async fn test_tactical_passages_hidden_from_staff() {
        let store = Arc::new(Recording {
            passages: vec![passage(
                "The 1-3-1 neutral zone setup forces dump-ins along the wall.",
                "systems",
                "tactics",
                0.9,
            )],
            ..Recording::default()
        });
        let node = node(store);
        let state = WorkflowState::new("Explain our forecheck", Identity::new(Role::Staff, "S"))
            .with_intent(intent(QueryType::TacticalAnalysis, true));

        let result = node.fetch(&state).await;
        assert!(matches!(result, Err(ToolError::Empty { .. })));
    }

    #[test]
    fn test_citation_defaults_for_missing_fields() {
        let tags = citations(&[passage("A passage with plenty of words.", "", "", 0.9)]);
        assert_eq!(tags, vec!["[hockey_knowledge:general]".to_string()]);
    }
}
