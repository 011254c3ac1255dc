//! Media retrieval over the clip index.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ToolNode, ToolOutput};
use crate::classifier::IntentClassifier;
use crate::classifier::extract::{requested_limit, tokenize};
use crate::clients::MediaIndex;
use crate::config::OrchestratorConfig;
use crate::core::payload::first_seen_groups;
use crate::core::{MediaClip, ToolKind, ToolPayload};
use crate::error::ToolError;
use crate::policy;
use crate::workflow::WorkflowState;

/// Names listed per citation tag.
const CITED_NAMES: usize = 3;

/// Clip retrieval node.
pub struct MediaNode {
    index: Arc<dyn MediaIndex>,
    classifier: Arc<dyn IntentClassifier>,
    default_limit: usize,
    max_limit: usize,
}

impl MediaNode {
    /// Creates the node.
    #[must_use]
    pub fn new(
        index: Arc<dyn MediaIndex>,
        classifier: Arc<dyn IntentClassifier>,
        config: &OrchestratorConfig,
    ) -> Self {
        Self {
            index,
            classifier,
            default_limit: config.media_default_limit,
            max_limit: config.media_max_limit,
        }
    }

    /// Clip count for a query: the requested count, or the default, capped.
    #[must_use]
    pub fn limit(&self, query: &str) -> usize {
        requested_limit(&tokenize(query))
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }
}

fn citations(clips: &[MediaClip]) -> Vec<String> {
    let mut tags = vec![format!("[media_index:{}_clips]", clips.len())];

    let owners = first_seen_groups(clips.iter().map(|c| c.owner.as_str()));
    if !owners.is_empty() {
        let shown: Vec<&str> = owners.into_iter().take(CITED_NAMES).collect();
        tags.push(format!("[subjects:{}]", shown.join(",")));
    }

    let categories = first_seen_groups(clips.iter().map(|c| c.category.as_str()));
    if !categories.is_empty() {
        let shown: Vec<&str> = categories.into_iter().take(CITED_NAMES).collect();
        tags.push(format!("[categories:{}]", shown.join(",")));
    }
    tags
}

#[async_trait]
impl ToolNode for MediaNode {
    fn kind(&self) -> ToolKind {
        ToolKind::MediaRetrieval
    }

    async fn fetch(&self, state: &WorkflowState) -> Result<ToolOutput, ToolError> {
        let identity = state.identity();
        let extracted = self.classifier.extract_filters(state.query(), identity);
        let filters = policy::scope_filters(identity, extracted)?;

        let limit = self.limit(state.query());
        tracing::debug!(
            subjects = ?filters.subjects,
            categories = ?filters.categories,
            limit,
            index = self.index.name(),
            "media search"
        );

        let found = self.index.search(&filters, limit).await?;
        let mut clips = policy::filter_clips(identity, found);
        clips.sort_by(|a, b| b.score.total_cmp(&a.score));
        clips.truncate(limit);

        if clips.is_empty() {
            return Err(ToolError::Empty {
                message: "no clips matched the requested filters".to_string(),
            });
        }

        Ok(ToolOutput {
            citations: citations(&clips),
            payload: ToolPayload::Media(clips),
        })
    }
}
