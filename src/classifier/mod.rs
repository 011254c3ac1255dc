//! Intent classification and entity extraction.
//!
//! The classifier is a pluggable strategy: the orchestrator and the tool
//! nodes hold an `Arc<dyn IntentClassifier>`, so a different vocabulary or
//! an entirely different approach can be swapped in without touching them.

pub mod extract;
pub mod lexical;
pub mod vocabulary;

pub use lexical::LexicalClassifier;
pub use vocabulary::{EventCategory, IntentRule, SubjectEntry, TimeWindow, Vocabulary};

use std::sync::Arc;

use crate::config::OrchestratorConfig;
use crate::core::{EntityFilters, Identity, IntentDescriptor};
use crate::error::ConfigError;

/// Turns query text into a structured intent.
///
/// Implementations must be pure and must never panic: ambiguous input maps
/// to [`IntentDescriptor::general`].
pub trait IntentClassifier: Send + Sync {
    /// Classifies a query.
    fn classify(&self, query: &str, identity: &Identity) -> IntentDescriptor;

    /// Extracts entity filters used by the analytics and media nodes.
    fn extract_filters(&self, query: &str, identity: &Identity) -> EntityFilters;

    /// Rewrites a query for knowledge search.
    fn search_query(&self, query: &str) -> String {
        query.to_string()
    }
}

/// Builds the configured classifier.
///
/// Uses the vocabulary file named by the configuration when set, and the
/// built-in vocabulary otherwise.
///
/// # Errors
///
/// Returns [`ConfigError`] if the vocabulary cannot be loaded or compiled.
pub fn from_config(config: &OrchestratorConfig) -> Result<Arc<dyn IntentClassifier>, ConfigError> {
    let vocabulary = match &config.vocabulary_path {
        Some(path) => Vocabulary::from_path(path)?,
        None => Vocabulary::default(),
    };
    tracing::debug!(
        path = ?config.vocabulary_path,
        rules = vocabulary.rules.len(),
        subjects = vocabulary.subjects.len(),
        "vocabulary loaded"
    );
    Ok(Arc::new(LexicalClassifier::new(&vocabulary)?))
}
