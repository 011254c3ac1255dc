//! Local template tier.

use async_trait::async_trait;

use super::{GenerationBackend, GenerationRequest};
use crate::error::GenerationError;

const TIER: &str = "template";

/// Returned when the request carries no pre-rendered answer.
const GENERIC_ANSWER: &str = "I'm operating in fallback mode and can only summarise the data gathered for this question. Please try again once the analytics model is available.";

/// Deterministic last tier.
///
/// Echoes the answer the synthesizer rendered from the role template. Never
/// fails and performs no I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateBackend;

impl TemplateBackend {
    /// Renders the answer synchronously.
    #[must_use]
    pub fn render(request: &GenerationRequest) -> String {
        if request.fallback.trim().is_empty() {
            GENERIC_ANSWER.to_string()
        } else {
            request.fallback.clone()
        }
    }
}

#[async_trait]
impl GenerationBackend for TemplateBackend {
    fn name(&self) -> &'static str {
        TIER
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        Ok(Self::render(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(fallback: &str) -> GenerationRequest {
        GenerationRequest {
            system: String::new(),
            prompt: String::new(),
            max_tokens: 1,
            temperature: 0.0,
            top_p: 1.0,
            fallback: fallback.to_string(),
        }
    }

    #[tokio::test]
    async fn test_echoes_fallback() {
        let text = TemplateBackend.generate(&request("rendered")).await;
        assert_eq!(text.ok().as_deref(), Some("rendered"));
    }

    #[test]
    fn test_blank_fallback_uses_generic_answer() {
        assert_eq!(TemplateBackend::render(&request("  ")), GENERIC_ANSWER);
    }
}
