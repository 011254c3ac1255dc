//! Orchestrator driver.
//!
//! Runs one query through the fixed topology: intent analysis, routing,
//! the required tool steps, then synthesis. The transition table lives in
//! [`router::transition`]; this module only interprets it.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::time::Instant;

use super::result::ExternalResult;
use super::router::{self, Step};
use super::state::WorkflowState;
use crate::classifier::{self, IntentClassifier};
use crate::clients::{Clients, create_clients};
use crate::config::OrchestratorConfig;
use crate::core::{Identity, QueryType};
use crate::error::{ConfigError, OrchestratorError};
use crate::synthesis::ResponseSynthesizer;
use crate::tools::{self, ToolNode, ToolNodes};

/// Maximum accepted query length in bytes.
pub const MAX_QUERY_LEN: usize = 10_000;

/// Drives queries through the workflow.
///
/// Holds only read-only handles, so one instance can serve concurrent
/// queries; each [`Orchestrator::process`] call owns its own state.
#[derive(Clone)]
pub struct Orchestrator {
    classifier: Arc<dyn IntentClassifier>,
    tools: ToolNodes,
    synthesizer: ResponseSynthesizer,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Creates a builder.
    #[must_use]
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Wires every component from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the vocabulary cannot be loaded.
    pub fn from_config(config: OrchestratorConfig) -> Result<Self, ConfigError> {
        Self::builder().config(config).build()
    }

    /// Intent classifier in use.
    #[must_use]
    pub const fn classifier(&self) -> &Arc<dyn IntentClassifier> {
        &self.classifier
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Answers a query.
    ///
    /// Never fails: a rejected query, an exhausted iteration guard or a
    /// panic inside any step yields [`ExternalResult::failure`].
    pub async fn process(&self, query: &str, identity: Identity) -> ExternalResult {
        let start = Instant::now();
        let mut query_type = QueryType::GeneralKnowledge;

        let outcome = AssertUnwindSafe(self.run(query, identity, &mut query_type))
            .catch_unwind()
            .await;
        let elapsed = start.elapsed();

        let error = match outcome {
            Ok(Ok(state)) => {
                let result = ExternalResult::from_state(&state, elapsed);
                tracing::info!(
                    query_type = %result.query_type,
                    tools = result.tool_summaries.len(),
                    evidence = result.evidence.len(),
                    warnings = result.warnings.len(),
                    tier = state.generation_tier().unwrap_or("none"),
                    total_ms = result.total_duration_ms,
                    "query processed"
                );
                return result;
            }
            Ok(Err(e)) => e,
            Err(panic) => OrchestratorError::Panicked {
                message: panic_message(panic.as_ref()),
            },
        };

        tracing::error!(error = %error, query_type = %query_type, "query failed");
        ExternalResult::failure(query_type, error.to_string(), elapsed)
    }

    async fn run(
        &self,
        query: &str,
        identity: Identity,
        query_type: &mut QueryType,
    ) -> Result<WorkflowState, OrchestratorError> {
        validate(query)?;

        let start = Instant::now();
        let deadline = start + self.config.query_timeout;
        let mut state = WorkflowState::new(query, identity);
        let mut step = Step::IntentAnalysis;

        loop {
            state = state.advance(self.config.max_iterations)?;
            tracing::debug!(step = %step, iteration = state.step(), "workflow step");

            match step {
                Step::IntentAnalysis => {
                    let intent = self.classifier.classify(state.query(), state.identity());
                    *query_type = intent.query_type;
                    tracing::info!(
                        query_type = %intent.query_type,
                        complexity = %intent.complexity,
                        tools = ?intent.required_tools,
                        role = %state.identity().role(),
                        "intent classified"
                    );
                    state = state.with_intent(intent);
                }
                Step::Router => {
                    let decision = router::route(&state.intent().required_tools);
                    tracing::debug!(decision = %decision, "route selected");
                }
                Step::KnowledgeRetrieval | Step::StructuredAnalytics | Step::MediaRetrieval => {
                    let node = self.node(step);
                    let snapshot = state.clone();
                    let run = tools::execute(node.as_ref(), state, self.config.tool_timeout);
                    match tokio::time::timeout_at(deadline, run).await {
                        Ok(next) => state = next,
                        Err(_) => {
                            state = expire(snapshot, step, &self.config);
                            step = Step::Synthesis;
                            continue;
                        }
                    }
                }
                Step::Synthesis if state.deadline_exceeded => {
                    state = ResponseSynthesizer::insufficient_data(state);
                }
                Step::Synthesis => {
                    let snapshot = state.clone();
                    let run = self.synthesizer.synthesize(state);
                    state = match tokio::time::timeout_at(deadline, run).await {
                        Ok(next) => next,
                        Err(_) => {
                            ResponseSynthesizer::insufficient_data(expire(snapshot, step, &self.config))
                        }
                    };
                }
                Step::Done => break,
            }

            step = router::transition(step, &state.intent().required_tools);
        }

        state.elapsed = start.elapsed();
        Ok(state)
    }

    fn node(&self, step: Step) -> &Arc<dyn ToolNode> {
        match step {
            Step::KnowledgeRetrieval => &self.tools.knowledge,
            Step::MediaRetrieval => &self.tools.media,
            _ => &self.tools.analytics,
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("tools", &self.tools)
            .field("synthesizer", &self.synthesizer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn validate(query: &str) -> Result<(), OrchestratorError> {
    if query.trim().is_empty() {
        return Err(OrchestratorError::InvalidQuery {
            message: "query cannot be empty".to_string(),
        });
    }
    if query.len() > MAX_QUERY_LEN {
        return Err(OrchestratorError::InvalidQuery {
            message: format!(
                "query exceeds maximum length ({} bytes, max {MAX_QUERY_LEN})",
                query.len()
            ),
        });
    }
    Ok(())
}

/// State as of the last completed step, flagged as past the deadline.
fn expire(mut state: WorkflowState, step: Step, config: &OrchestratorConfig) -> WorkflowState {
    tracing::warn!(
        step = %step,
        timeout_secs = config.query_timeout.as_secs_f64(),
        "query deadline exceeded"
    );
    state.deadline_exceeded = true;
    state.with_warning(format!(
        "query deadline of {}s exceeded during {step}",
        config.query_timeout.as_secs_f64()
    ))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Builder for [`Orchestrator`].
///
/// Any component left unset is built from the configuration.
#[derive(Default)]
pub struct OrchestratorBuilder {
    config: Option<OrchestratorConfig>,
    classifier: Option<Arc<dyn IntentClassifier>>,
    clients: Option<Clients>,
    tools: Option<ToolNodes>,
    synthesizer: Option<ResponseSynthesizer>,
}

impl OrchestratorBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: OrchestratorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the intent classifier.
    #[must_use]
    pub fn classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Sets the retrieval clients the default tool nodes are built over.
    #[must_use]
    pub fn clients(mut self, clients: Clients) -> Self {
        self.clients = Some(clients);
        self
    }

    /// Sets the tool nodes directly. Takes precedence over [`Self::clients`].
    #[must_use]
    pub fn tools(mut self, tools: ToolNodes) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Sets the response synthesizer.
    #[must_use]
    pub fn synthesizer(mut self, synthesizer: ResponseSynthesizer) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Builds the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the classifier has to be built from a
    /// vocabulary that cannot be loaded.
    pub fn build(self) -> Result<Orchestrator, ConfigError> {
        let config = self.config.unwrap_or_default();
        let classifier = match self.classifier {
            Some(c) => c,
            None => classifier::from_config(&config)?,
        };
        let tools = self.tools.unwrap_or_else(|| {
            let clients = self.clients.unwrap_or_else(|| create_clients(&config));
            ToolNodes::new(&clients, &classifier, &config)
        });
        let synthesizer = self
            .synthesizer
            .unwrap_or_else(|| ResponseSynthesizer::from_config(&config));

        tracing::debug!(
            tools = ?tools,
            tiers = ?synthesizer.chain().tier_names(),
            max_iterations = config.max_iterations,
            "orchestrator built"
        );

        Ok(Orchestrator {
            classifier,
            tools,
            synthesizer,
            config,
        })
    }
}

impl std::fmt::Debug for OrchestratorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestratorBuilder")
            .field("config", &self.config)
            .field("classifier", &self.classifier.as_ref().map(|_| "<dyn IntentClassifier>"))
            .field("clients", &self.clients)
            .field("tools", &self.tools)
            .field("synthesizer", &self.synthesizer)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::core::{
        Complexity, Entities, EntityFilters, IntentDescriptor, Passage, Role, ToolKind,
        ToolPayload, ToolSet,
    };
    use crate::error::{GenerationError, ToolError};
    use crate::generation::{FallbackChain, GenerationBackend, GenerationRequest};
    use crate::synthesis::{INSUFFICIENT_DATA_ANSWER, PromptSet};
    use crate::tools::ToolOutput;
    use crate::workflow::result::FAILURE_ANSWER;

    struct Fixed(ToolSet);

    impl IntentClassifier for Fixed {
        fn classify(&self, _query: &str, _identity: &Identity) -> IntentDescriptor {
            IntentDescriptor {
                query_type: QueryType::TacticalAnalysis,
                complexity: Complexity::Simple,
                required_tools: self.0.clone(),
                needs_context: true,
                entities: Entities::default(),
            }
        }

        fn extract_filters(&self, _query: &str, _identity: &Identity) -> EntityFilters {
            EntityFilters::default()
        }
    }

    struct Panicking;

    impl IntentClassifier for Panicking {
        fn classify(&self, _query: &str, _identity: &Identity) -> IntentDescriptor {
            panic!("classifier bug")
        }

        fn extract_filters(&self, _query: &str, _identity: &Identity) -> EntityFilters {
            EntityFilters::default()
        }
    }

    struct Knowledge(Duration);

    #[async_trait]
    impl ToolNode for Knowledge {
        fn kind(&self) -> ToolKind {
            ToolKind::VectorSearch
        }

        async fn fetch(&self, _state: &WorkflowState) -> Result<ToolOutput, ToolError> {
            tokio::time::sleep(self.0).await;
            Ok(ToolOutput {
                payload: ToolPayload::Passages(vec![Passage {
                    text: "A neutral zone trap clogs the middle of the ice.".to_string(),
                    source: "systems".to_string(),
                    category: "tactics".to_string(),
                    score: 0.9,
                }]),
                citations: vec!["[systems:tactics]".to_string()],
            })
        }
    }

    struct Stalled;

    #[async_trait]
    impl GenerationBackend for Stalled {
        fn name(&self) -> &'static str {
            "primary"
        }

        async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
            std::future::pending().await
        }
    }

    fn tools(delay: Duration) -> ToolNodes {
        let node: Arc<dyn ToolNode> = Arc::new(Knowledge(delay));
        ToolNodes {
            knowledge: Arc::clone(&node),
            analytics: Arc::clone(&node),
            media: node,
        }
    }

    fn orchestrator(
        classifier: Arc<dyn IntentClassifier>,
        config: OrchestratorConfig,
        delay: Duration,
    ) -> Orchestrator {
        let synthesizer =
            ResponseSynthesizer::new(FallbackChain::offline(), PromptSet::defaults(), &config);
        Orchestrator::builder()
            .config(config)
            .classifier(classifier)
            .tools(tools(delay))
            .synthesizer(synthesizer)
            .build()
            .unwrap_or_else(|_| unreachable!())
    }

    fn coach() -> Identity {
        Identity::new(Role::Coach, "Martin St. Louis")
    }

    #[tokio::test]
    async fn test_rejects_empty_and_oversized_queries() {
        let orch = orchestrator(
            Arc::new(Fixed(ToolSet::new())),
            OrchestratorConfig::default(),
            Duration::ZERO,
        );

        let empty = orch.process("   ", coach()).await;
        assert!(!empty.success);
        assert_eq!(empty.answer_text, FAILURE_ANSWER);

        let long = "a".repeat(MAX_QUERY_LEN + 1);
        let oversized = orch.process(&long, coach()).await;
        assert!(!oversized.success);
        assert!(oversized.errors[0].contains("maximum length"));
    }

    #[tokio::test]
    async fn test_panic_is_contained() {
        let orch = orchestrator(
            Arc::new(Panicking),
            OrchestratorConfig::default(),
            Duration::ZERO,
        );
        let result = orch.process("anything", coach()).await;
        assert!(!result.success);
        assert_eq!(result.answer_text, FAILURE_ANSWER);
        assert!(result.errors[0].contains("classifier bug"));
    }

    #[tokio::test]
    async fn test_iteration_guard() {
        let config = OrchestratorConfig {
            max_iterations: 2,
            ..OrchestratorConfig::default()
        };
        let orch = orchestrator(
            Arc::new(Fixed(ToolSet::from([ToolKind::VectorSearch]))),
            config,
            Duration::ZERO,
        );
        let result = orch.process("what is a trap?", coach()).await;
        assert!(!result.success);
        assert_eq!(result.query_type, QueryType::TacticalAnalysis);
        assert!(result.errors[0].contains("exceeded 2 steps"));
    }

    #[tokio::test]
    async fn test_knowledge_only_path() {
        let orch = orchestrator(
            Arc::new(Fixed(ToolSet::from([ToolKind::VectorSearch]))),
            OrchestratorConfig::default(),
            Duration::ZERO,
        );
        let result = orch.process("what is a trap?", coach()).await;
        assert!(result.success);
        assert_eq!(result.tools_invoked(), vec![ToolKind::VectorSearch]);
        assert_eq!(result.evidence, vec!["[systems:tactics]".to_string()]);
        assert!(result.answer_text.contains("[systems:tactics]"));
    }

    #[tokio::test]
    async fn test_global_deadline_discards_partial_step() {
        let config = OrchestratorConfig {
            query_timeout: Duration::from_millis(50),
            ..OrchestratorConfig::default()
        };
        let orch = orchestrator(
            Arc::new(Fixed(ToolSet::from([ToolKind::VectorSearch]))),
            config,
            Duration::from_secs(5),
        );
        let result = orch.process("what is a trap?", coach()).await;
        assert!(result.success);
        assert!(result.tool_summaries.is_empty());
        assert_eq!(result.answer_text, INSUFFICIENT_DATA_ANSWER);
        assert!(result.warnings.iter().any(|w| w.contains("deadline")));
    }

    #[tokio::test]
    async fn test_global_deadline_bounds_generation() {
        let config = OrchestratorConfig {
            query_timeout: Duration::from_millis(200),
            ..OrchestratorConfig::default()
        };
        let stalled: Arc<dyn GenerationBackend> = Arc::new(Stalled);
        let chain = FallbackChain::new(vec![Arc::clone(&stalled), stalled], Duration::from_secs(1));
        let synthesizer = ResponseSynthesizer::new(chain, PromptSet::defaults(), &config);
        let orch = Orchestrator::builder()
            .config(config)
            .classifier(Arc::new(Fixed(ToolSet::from([ToolKind::VectorSearch]))))
            .tools(tools(Duration::ZERO))
            .synthesizer(synthesizer)
            .build()
            .unwrap_or_else(|_| unreachable!());

        let start = Instant::now();
        let result = orch.process("what is a trap?", coach()).await;

        assert!(start.elapsed() < Duration::from_millis(800));
        assert!(result.success);
        assert_eq!(result.answer_text, INSUFFICIENT_DATA_ANSWER);
        assert_eq!(result.tools_invoked(), vec![ToolKind::VectorSearch]);
        assert!(result.warnings.iter().any(|w| w.contains("exceeded during synthesis")));
    }
}
