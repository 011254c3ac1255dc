//! Dedicated inference endpoint tier.
//!
//! Speaks the text-generation-inference request shape:
//! `{"inputs": "...", "parameters": {...}}`, answered by either
//! `[{"generated_text": "..."}]` or `{"generated_text": "..."}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{GenerationBackend, GenerationRequest};
use crate::error::GenerationError;

const TIER: &str = "primary";

/// Fine-tuned model behind a dedicated HTTP endpoint.
#[derive(Debug, Clone)]
pub struct InferenceEndpoint {
    url: Option<String>,
    api_key: Option<String>,
    client: Client,
}

impl InferenceEndpoint {
    /// Creates the tier. Without a URL every call fails with
    /// [`GenerationError::NotConfigured`].
    #[must_use]
    pub fn new(url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            url,
            api_key,
            client: Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Parameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    return_full_text: bool,
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: Parameters,
}

#[derive(Debug, Deserialize)]
struct Generation {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batch(Vec<Generation>),
    Single(Generation),
}

impl InferenceResponse {
    fn into_text(self) -> Option<String> {
        match self {
            Self::Batch(items) => items.into_iter().next().map(|g| g.generated_text),
            Self::Single(g) => Some(g.generated_text),
        }
    }
}

fn request_error(err: &reqwest::Error) -> GenerationError {
    GenerationError::Request {
        tier: TIER,
        message: if err.is_connect() {
            format!("cannot connect: {err}")
        } else {
            err.to_string()
        },
        status: err.status().map(|s| s.as_u16()),
    }
}

#[async_trait]
impl GenerationBackend for InferenceEndpoint {
    fn name(&self) -> &'static str {
        TIER
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let Some(url) = &self.url else {
            return Err(GenerationError::NotConfigured { tier: TIER });
        };

        let inputs = format!("{}\n\n{}", request.system, request.prompt);
        let body = InferenceRequest {
            inputs: &inputs,
            parameters: Parameters {
                max_new_tokens: request.max_tokens,
                temperature: request.temperature,
                top_p: request.top_p,
                return_full_text: false,
            },
        };

        tracing::debug!(url = %url, prompt_chars = inputs.len(), "inference endpoint request");
        let mut call = self.client.post(url).json(&body);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }
        let response = call.send().await.map_err(|e| request_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Request {
                tier: TIER,
                message: format!("status {status}: {text}"),
                status: Some(status.as_u16()),
            });
        }

        let parsed: InferenceResponse = response.json().await.map_err(|e| GenerationError::Request {
            tier: TIER,
            message: format!("malformed response: {e}"),
            status: None,
        })?;

        parsed
            .into_text()
            .filter(|t| !t.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse { tier: TIER })
    }
}
