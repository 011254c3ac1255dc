//! Narrow client contracts for the external collaborators.
//!
//! Handles are shared across concurrent queries as `Arc<dyn ...>`, so every
//! implementation must be read-only after construction.

pub mod media;
pub mod tabular;
pub mod vector;

use std::sync::Arc;

use async_trait::async_trait;

pub use media::JsonMediaIndex;
pub use tabular::JsonTableStore;
pub use vector::{DisabledVectorStore, HttpVectorStore};

use crate::config::OrchestratorConfig;
use crate::core::{AnalysisKind, EntityFilters, MediaClip, Passage, TableFrame};
use crate::error::ClientError;

/// Vector knowledge store.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store name, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Searches one namespace.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport, status or decode failures.
    async fn search(
        &self,
        query: &str,
        namespace: &str,
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<Passage>, ClientError>;
}

/// Tabular analytics store.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Store name, used in logs and errors.
    fn name(&self) -> &'static str;

    /// Runs one analysis routine.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the backing tables cannot be read.
    async fn query(
        &self,
        filters: &EntityFilters,
        kind: AnalysisKind,
    ) -> Result<TableFrame, ClientError>;
}

/// Indexed media store.
#[async_trait]
pub trait MediaIndex: Send + Sync {
    /// Index name, used in logs and citations.
    fn name(&self) -> &'static str;

    /// Searches the index.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the index cannot be read.
    async fn search(
        &self,
        filters: &EntityFilters,
        limit: usize,
    ) -> Result<Vec<MediaClip>, ClientError>;
}

/// The three retrieval clients.
#[derive(Clone)]
pub struct Clients {
    /// Knowledge store.
    pub vector: Arc<dyn VectorStore>,
    /// Analytics store.
    pub tabular: Arc<dyn TabularStore>,
    /// Media index.
    pub media: Arc<dyn MediaIndex>,
}

impl std::fmt::Debug for Clients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clients")
            .field("vector", &self.vector.name())
            .field("tabular", &self.tabular.name())
            .field("media", &self.media.name())
            .finish()
    }
}

/// Builds the concrete clients described by the configuration.
///
/// Without a vector store URL, knowledge retrieval is wired to a
/// [`DisabledVectorStore`] so the node fails cleanly at query time.
#[must_use]
pub fn create_clients(config: &OrchestratorConfig) -> Clients {
    let vector: Arc<dyn VectorStore> = match &config.vector_url {
        Some(url) => Arc::new(HttpVectorStore::new(url, config.vector_api_key.clone())),
        None => Arc::new(DisabledVectorStore),
    };
    Clients {
        vector,
        tabular: Arc::new(JsonTableStore::new(&config.data_dir)),
        media: Arc::new(JsonMediaIndex::new(&config.media_dir)),
    }
}

/// Maps a transport error from `reqwest`.
pub(crate) fn http_error(service: &'static str, err: &reqwest::Error) -> ClientError {
    if err.is_connect() {
        ClientError::Unavailable {
            service,
            message: format!("cannot connect: {err}"),
        }
    } else {
        ClientError::Http {
            service,
            message: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
        }
    }
}

/// Case-insensitive containment used by the file-backed stores.
pub(crate) fn matches_any(value: &str, wanted: &[String]) -> bool {
    let value = value.to_lowercase();
    wanted
        .iter()
        .any(|w| !w.trim().is_empty() && value.contains(&w.trim().to_lowercase()))
}
