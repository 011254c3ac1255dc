//! External response shape.

use std::time::Duration;

use serde::Serialize;

use super::state::{ToolResult, WorkflowState};
use crate::core::{QueryType, ToolKind};

/// Answer returned when the driver's fatal guard fires.
pub const FAILURE_ANSWER: &str = "I apologize, but I encountered an error processing your request. Please try again or rephrase your question.";

/// Per-tool summary in the external response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolSummary {
    /// Tool that ran.
    pub tool: ToolKind,
    /// Whether it succeeded.
    pub success: bool,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
    /// Citations it contributed.
    pub citation_count: usize,
}

impl From<&ToolResult> for ToolSummary {
    fn from(result: &ToolResult) -> Self {
        Self {
            tool: result.tool(),
            success: result.success(),
            duration_ms: millis(result.duration()),
            citation_count: result.citations().len(),
        }
    }
}

/// Final result of one `process` call.
///
/// `success` is false only when the driver's fatal guard fired. A
/// no-data answer is still a success and is flagged through `warnings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalResult {
    /// Whether a valid answer was produced.
    pub success: bool,
    /// Answer text, never empty.
    pub answer_text: String,
    /// Classified query type.
    pub query_type: QueryType,
    /// Accumulated citations in execution order.
    pub evidence: Vec<String>,
    /// One entry per tool invocation, in execution order.
    pub tool_summaries: Vec<ToolSummary>,
    /// Total wall-clock time in milliseconds.
    pub total_duration_ms: u64,
    /// Non-fatal warnings.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Tool failures and fatal errors.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ExternalResult {
    /// Projects a finished workflow state.
    #[must_use]
    pub fn from_state(state: &WorkflowState, elapsed: Duration) -> Self {
        Self {
            success: true,
            answer_text: state.answer().unwrap_or(FAILURE_ANSWER).to_string(),
            query_type: state.intent().query_type,
            evidence: state.evidence().to_vec(),
            tool_summaries: state.tool_results().iter().map(ToolSummary::from).collect(),
            total_duration_ms: millis(elapsed),
            warnings: state.warnings().to_vec(),
            errors: state.errors().to_vec(),
        }
    }

    /// The fixed failure response.
    #[must_use]
    pub fn failure(query_type: QueryType, error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            success: false,
            answer_text: FAILURE_ANSWER.to_string(),
            query_type,
            evidence: Vec::new(),
            tool_summaries: Vec::new(),
            total_duration_ms: millis(elapsed),
            warnings: Vec::new(),
            errors: vec![error.into()],
        }
    }

    /// Tools invoked, in execution order.
    #[must_use]
    pub fn tools_invoked(&self) -> Vec<ToolKind> {
        self.tool_summaries.iter().map(|s| s.tool).collect()
    }
}

/// Duration in whole milliseconds, saturating.
pub(crate) fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Identity, Role};

    #[test]
    fn test_failure_shape() {
        let result = ExternalResult::failure(
            QueryType::GeneralKnowledge,
            "workflow step panicked: boom",
            Duration::from_millis(12),
        );
        assert!(!result.success);
        assert_eq!(result.answer_text, FAILURE_ANSWER);
        assert_eq!(result.total_duration_ms, 12);
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_from_state_projects_summaries() {
        let state = WorkflowState::new("q", Identity::new(Role::Coach, "c"));
        let state = crate::workflow::evidence::record(
            state,
            ToolResult::failed(ToolKind::VectorSearch, "down", Duration::from_millis(7)),
        );
        let result = ExternalResult::from_state(&state, Duration::from_millis(20));
        assert!(result.success);
        assert_eq!(
            result.tool_summaries,
            vec![ToolSummary {
                tool: ToolKind::VectorSearch,
                success: false,
                duration_ms: 7,
                citation_count: 0,
            }]
        );
        assert_eq!(result.tools_invoked(), vec![ToolKind::VectorSearch]);
    }

    #[test]
    fn test_serializes_snake_case() {
        let result =
            ExternalResult::failure(QueryType::PlayerAnalysis, "x", Duration::from_millis(1));
        let json = serde_json::to_value(&result).unwrap_or_default();
        assert_eq!(json["query_type"], "player_analysis");
        assert_eq!(json["success"], false);
        assert!(json.get("warnings").is_none());
    }
}
