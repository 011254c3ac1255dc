//! Evidence aggregation.
//!
//! Every tool node funnels its [`ToolResult`] through [`record`]; nothing
//! else writes to the evidence list or the payload slots.

use std::collections::HashSet;

use super::state::{ToolResult, WorkflowState};
use crate::core::ToolPayload;

/// Appends a tool result to the state.
///
/// A successful result appends its citations, in order and duplicates
/// included, and fills the matching payload slot. A failed result is recorded
/// in the tool history and the error list only.
#[must_use]
pub fn record(mut state: WorkflowState, result: ToolResult) -> WorkflowState {
    if result.success() {
        state.evidence.extend(result.citations().iter().cloned());
        match result.payload() {
            Some(ToolPayload::Passages(passages)) => {
                state.retrieved_context.extend(passages.iter().cloned());
            }
            Some(ToolPayload::Analytics(analytics)) => {
                state.analytics = Some(analytics.clone());
            }
            Some(ToolPayload::Media(clips)) => {
                state.media.extend(clips.iter().cloned());
            }
            None => {}
        }
    } else if let Some(error) = result.error() {
        state.errors.push(format!("{}: {error}", result.tool()));
    }
    state.tool_results.push(result);
    state
}

/// Returns `true` if synthesis has anything to work from.
///
/// True iff any payload slot is non-empty or any tool succeeded.
#[must_use]
pub fn has_sufficient_context(state: &WorkflowState) -> bool {
    !state.retrieved_context.is_empty()
        || state.analytics.as_ref().is_some_and(|a| !a.frame.is_empty())
        || !state.media.is_empty()
        || state.tool_results.iter().any(ToolResult::success)
}

/// Removes duplicates, keeping the first occurrence of each entry.
#[must_use]
pub fn dedup_first_seen(items: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(item.as_str()))
        .cloned()
        .collect()
}
