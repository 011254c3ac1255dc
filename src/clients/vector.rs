//! HTTP vector store client.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{VectorStore, http_error};
use crate::core::Passage;
use crate::error::ClientError;

const SERVICE: &str = "vector_store";

/// Vector store reached over a JSON HTTP API.
///
/// `POST {base_url}/namespaces/{namespace}/search` with
/// `{"query", "top_k", "min_score"}`; the response is `{"matches": [...]}`.
#[derive(Debug, Clone)]
pub struct HttpVectorStore {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpVectorStore {
    /// Creates a client for the given base URL.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    top_k: usize,
    min_score: f32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    matches: Vec<Passage>,
}

#[async_trait]
impl VectorStore for HttpVectorStore {
    fn name(&self) -> &'static str {
        SERVICE
    }

    async fn search(
        &self,
        query: &str,
        namespace: &str,
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<Passage>, ClientError> {
        let url = format!("{}/namespaces/{namespace}/search", self.base_url);
        tracing::debug!(url = %url, top_k, min_score, "vector search");

        let mut request = self.client.post(&url).json(&SearchRequest {
            query,
            top_k,
            min_score,
        });
        if let Some(key) = &self.api_key {
            request = request.header("Api-Key", key);
        }

        let response = request.send().await.map_err(|e| http_error(SERVICE, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                service: SERVICE,
                message: format!("status {status}: {body}"),
                status: Some(status.as_u16()),
            });
        }

        let parsed: SearchResponse = response.json().await.map_err(|e| ClientError::Decode {
            service: SERVICE,
            message: e.to_string(),
        })?;
        Ok(parsed.matches)
    }
}

/// Stand-in used when no vector store is configured.
///
/// Every search fails with [`ClientError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledVectorStore;

#[async_trait]
impl VectorStore for DisabledVectorStore {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn search(
        &self,
        _query: &str,
        _namespace: &str,
        _top_k: usize,
        _min_score: f32,
    ) -> Result<Vec<Passage>, ClientError> {
        Err(ClientError::Unavailable {
            service: SERVICE,
            message: "no vector store URL configured".to_string(),
        })
    }
}
