//! Workflow state threaded through every step.
//!
//! Steps take a [`WorkflowState`] by value and hand back the updated one, so
//! no two steps ever alias the same record and nothing is shared across
//! concurrent queries.

use std::time::Duration;

use serde::Serialize;

use crate::core::{
    AnalyticsPayload, Identity, IntentDescriptor, MediaClip, Passage, ToolKind, ToolPayload,
};
use crate::error::OrchestratorError;

/// Outcome of exactly one tool invocation.
///
/// A failed result never carries a payload or citations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    tool: ToolKind,
    success: bool,
    payload: Option<ToolPayload>,
    error: Option<String>,
    #[serde(serialize_with = "serialize_millis")]
    duration: Duration,
    citations: Vec<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_millis<S>(d: &Duration, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_u128(d.as_millis())
}

impl ToolResult {
    /// A successful invocation.
    #[must_use]
    pub fn succeeded(
        tool: ToolKind,
        payload: ToolPayload,
        citations: Vec<String>,
        duration: Duration,
    ) -> Self {
        Self {
            tool,
            success: true,
            payload: Some(payload),
            error: None,
            duration,
            citations,
        }
    }

    /// A failed invocation.
    #[must_use]
    pub fn failed(tool: ToolKind, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            tool,
            success: false,
            payload: None,
            error: Some(error.into()),
            duration,
            citations: Vec::new(),
        }
    }

    /// Tool that ran.
    #[must_use]
    pub const fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Whether the invocation succeeded.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    /// Parsed payload, present only on success.
    #[must_use]
    pub const fn payload(&self) -> Option<&ToolPayload> {
        self.payload.as_ref()
    }

    /// Failure description, present only on failure.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Wall-clock duration of the invocation.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Citations in the order they were built.
    #[must_use]
    pub fn citations(&self) -> &[String] {
        &self.citations
    }
}

/// Aggregate record carried through the pipeline for one query.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub(crate) query: String,
    pub(crate) identity: Identity,
    pub(crate) intent: IntentDescriptor,
    pub(crate) tool_results: Vec<ToolResult>,
    pub(crate) retrieved_context: Vec<Passage>,
    pub(crate) analytics: Option<AnalyticsPayload>,
    pub(crate) media: Vec<MediaClip>,
    pub(crate) evidence: Vec<String>,
    pub(crate) answer: Option<String>,
    pub(crate) warnings: Vec<String>,
    pub(crate) errors: Vec<String>,
    pub(crate) step: usize,
    pub(crate) elapsed: Duration,
    pub(crate) deadline_exceeded: bool,
    pub(crate) generation_tier: Option<&'static str>,
}

impl WorkflowState {
    /// Creates the initial state for a query.
    ///
    /// The intent starts out as [`IntentDescriptor::general`] until the
    /// intent-analysis step replaces it.
    #[must_use]
    pub fn new(query: impl Into<String>, identity: Identity) -> Self {
        Self {
            query: query.into(),
            identity,
            intent: IntentDescriptor::general(),
            tool_results: Vec::new(),
            retrieved_context: Vec::new(),
            analytics: None,
            media: Vec::new(),
            evidence: Vec::new(),
            answer: None,
            warnings: Vec::new(),
            errors: Vec::new(),
            step: 0,
            elapsed: Duration::ZERO,
            deadline_exceeded: false,
            generation_tier: None,
        }
    }

    /// Sets the classified intent.
    #[must_use]
    pub fn with_intent(mut self, intent: IntentDescriptor) -> Self {
        self.intent = intent;
        self
    }

    /// Advances the step counter.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::IterationLimit`] once the counter would
    /// exceed `max_iterations`.
    pub(crate) fn advance(mut self, max_iterations: usize) -> Result<Self, OrchestratorError> {
        if self.step >= max_iterations {
            return Err(OrchestratorError::IterationLimit { max_iterations });
        }
        self.step += 1;
        Ok(self)
    }

    /// Records a non-fatal warning.
    #[must_use]
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Original query text.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Requester identity.
    #[must_use]
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Classified intent.
    #[must_use]
    pub const fn intent(&self) -> &IntentDescriptor {
        &self.intent
    }

    /// Tool results in execution order.
    #[must_use]
    pub fn tool_results(&self) -> &[ToolResult] {
        &self.tool_results
    }

    /// Passages from knowledge retrieval.
    #[must_use]
    pub fn retrieved_context(&self) -> &[Passage] {
        &self.retrieved_context
    }

    /// Payload from the analytics node.
    #[must_use]
    pub const fn analytics(&self) -> Option<&AnalyticsPayload> {
        self.analytics.as_ref()
    }

    /// Clips from media retrieval.
    #[must_use]
    pub fn media(&self) -> &[MediaClip] {
        &self.media
    }

    /// Accumulated citations, duplicates included.
    #[must_use]
    pub fn evidence(&self) -> &[String] {
        &self.evidence
    }

    /// Final answer, once synthesized.
    #[must_use]
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref()
    }

    /// Non-fatal warnings.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Tool failure descriptions.
    #[must_use]
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Steps executed so far.
    #[must_use]
    pub const fn step(&self) -> usize {
        self.step
    }

    /// Whether the global deadline expired before synthesis.
    #[must_use]
    pub const fn deadline_exceeded(&self) -> bool {
        self.deadline_exceeded
    }

    /// Generation tier that produced the answer, if generation ran.
    #[must_use]
    pub const fn generation_tier(&self) -> Option<&'static str> {
        self.generation_tier
    }

    /// Tools invoked, in execution order.
    #[must_use]
    pub fn tools_invoked(&self) -> Vec<ToolKind> {
        self.tool_results.iter().map(ToolResult::tool).collect()
    }
}
