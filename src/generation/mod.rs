//! Tiered text generation.
//!
//! A [`GenerationBackend`] turns a prompt into text. Three implementations
//! are chained by [`FallbackChain`]: the dedicated inference endpoint, the
//! hosted chat completion API, and the local template tier, which never
//! fails and performs no I/O.

pub mod chain;
pub mod endpoint;
pub mod hosted;
pub mod template;

use async_trait::async_trait;

pub use chain::{FallbackChain, Generated};
pub use endpoint::InferenceEndpoint;
pub use hosted::HostedBackend;
pub use template::TemplateBackend;

use crate::error::GenerationError;

/// Input to one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Role-conditioned system prompt.
    pub system: String,
    /// User prompt carrying the query and the gathered context.
    pub prompt: String,
    /// Completion token cap.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Answer rendered locally from the role template, used by the
    /// template tier.
    pub fallback: String,
}

/// A text generation tier.
///
/// Called at most once per query; retries happen across tiers, never
/// within one.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Tier name, reported in warnings and logs.
    fn name(&self) -> &'static str;

    /// Generates a completion.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] if the tier is not configured, the request
    /// fails, or the completion is empty.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
