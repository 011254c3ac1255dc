//! Retrieval tool nodes.
//!
//! The three nodes share one contract: [`ToolNode::fetch`] reads what it
//! needs from the state, consults the permission policy, and calls exactly
//! one client. [`execute`] wraps that call with the per-tool timeout and
//! folds every outcome into a [`ToolResult`], so failures never leave the
//! node as errors.

pub mod analytics;
pub mod knowledge;
pub mod media;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;

pub use analytics::AnalyticsNode;
pub use knowledge::KnowledgeNode;
pub use media::MediaNode;

use crate::classifier::IntentClassifier;
use crate::clients::Clients;
use crate::config::OrchestratorConfig;
use crate::core::{ToolKind, ToolPayload};
use crate::error::ToolError;
use crate::workflow::result::millis;
use crate::workflow::{ToolResult, WorkflowState, evidence};

/// Parsed payload plus the citations it supports.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Typed payload for the node's state slot.
    pub payload: ToolPayload,
    /// Citation tags, one per distinct source.
    pub citations: Vec<String>,
}

/// A retrieval step backed by one external client.
#[async_trait]
pub trait ToolNode: Send + Sync {
    /// Tool identifier of the node.
    fn kind(&self) -> ToolKind;

    /// Tool identifier recorded for a run over `state`.
    fn kind_for(&self, _state: &WorkflowState) -> ToolKind {
        self.kind()
    }

    /// Performs the access-filtered backing call.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] on client failure, permission denial, or when
    /// nothing usable remains after filtering.
    async fn fetch(&self, state: &WorkflowState) -> Result<ToolOutput, ToolError>;
}

/// Runs a node under `timeout` and records the outcome.
///
/// A timeout is treated like any other failure. A successful call with an
/// empty payload is recorded as a failure too.
pub async fn execute(node: &dyn ToolNode, state: WorkflowState, timeout: Duration) -> WorkflowState {
    let tool = node.kind_for(&state);
    let start = Instant::now();
    let outcome = tokio::time::timeout(timeout, node.fetch(&state)).await;
    let duration = start.elapsed();

    let result = match outcome {
        Ok(Ok(output)) if output.payload.is_empty() => ToolResult::failed(
            tool,
            ToolError::Empty {
                message: "backing store returned no items".to_string(),
            }
            .to_string(),
            duration,
        ),
        Ok(Ok(output)) => {
            tracing::debug!(
                tool = %tool,
                duration_ms = millis(duration),
                items = output.payload.item_count(),
                citations = output.citations.len(),
                "tool succeeded"
            );
            ToolResult::succeeded(tool, output.payload, output.citations, duration)
        }
        Ok(Err(e)) => ToolResult::failed(tool, e.to_string(), duration),
        Err(_) => ToolResult::failed(tool, ToolError::Timeout { tool, timeout }.to_string(), duration),
    };

    if let Some(error) = result.error() {
        tracing::warn!(tool = %tool, duration_ms = millis(duration), error, "tool failed");
    }

    evidence::record(state, result)
}

/// The three nodes wired to a set of clients.
#[derive(Clone)]
pub struct ToolNodes {
    /// Knowledge retrieval.
    pub knowledge: Arc<dyn ToolNode>,
    /// Structured analytics.
    pub analytics: Arc<dyn ToolNode>,
    /// Media retrieval.
    pub media: Arc<dyn ToolNode>,
}

impl ToolNodes {
    /// Builds the default nodes over `clients`.
    #[must_use]
    pub fn new(
        clients: &Clients,
        classifier: &Arc<dyn IntentClassifier>,
        config: &OrchestratorConfig,
    ) -> Self {
        Self {
            knowledge: Arc::new(KnowledgeNode::new(
                Arc::clone(&clients.vector),
                Arc::clone(classifier),
                config,
            )),
            analytics: Arc::new(AnalyticsNode::new(
                Arc::clone(&clients.tabular),
                Arc::clone(classifier),
            )),
            media: Arc::new(MediaNode::new(
                Arc::clone(&clients.media),
                Arc::clone(classifier),
                config,
            )),
        }
    }
}

impl std::fmt::Debug for ToolNodes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolNodes")
            .field("knowledge", &self.knowledge.kind())
            .field("analytics", &self.analytics.kind())
            .field("media", &self.media.kind())
            .finish()
    }
}
