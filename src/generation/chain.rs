//! Three-tier fallback chain.

use std::sync::Arc;
use std::time::Duration;

use super::{
    GenerationBackend, GenerationRequest, HostedBackend, InferenceEndpoint, TemplateBackend,
};
use crate::config::OrchestratorConfig;
use crate::error::GenerationError;

/// Text produced by the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated {
    /// Generated text.
    pub text: String,
    /// Tier that produced it.
    pub tier: &'static str,
    /// Failures of the tiers tried before it, in order.
    pub failures: Vec<String>,
}

impl Generated {
    /// Returns `true` if the answer came from the local template.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.tier == TemplateBackend.name()
    }
}

/// Tries each tier in order; the first success wins.
///
/// The local template is always appended as the last tier, so
/// [`FallbackChain::generate`] cannot fail.
#[derive(Clone)]
pub struct FallbackChain {
    tiers: Vec<Arc<dyn GenerationBackend>>,
    timeout: Duration,
}

impl FallbackChain {
    /// Creates a chain from remote tiers, in priority order.
    #[must_use]
    pub fn new(tiers: Vec<Arc<dyn GenerationBackend>>, timeout: Duration) -> Self {
        Self { tiers, timeout }
    }

    /// Inference endpoint, then hosted API, then template.
    #[must_use]
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        let primary: Arc<dyn GenerationBackend> = Arc::new(InferenceEndpoint::new(
            config.primary_endpoint.clone(),
            config.primary_api_key.clone(),
        ));
        let hosted: Arc<dyn GenerationBackend> = Arc::new(HostedBackend::new(config));
        Self::new(vec![primary, hosted], config.tool_timeout)
    }

    /// Template-only chain. Performs no I/O.
    #[must_use]
    pub fn offline() -> Self {
        Self::new(Vec::new(), Duration::from_secs(1))
    }

    /// Names of the configured tiers, template included.
    #[must_use]
    pub fn tier_names(&self) -> Vec<&'static str> {
        self.tiers
            .iter()
            .map(|t| t.name())
            .chain(std::iter::once(TemplateBackend.name()))
            .collect()
    }

    /// Generates text, falling back tier by tier.
    pub async fn generate(&self, request: &GenerationRequest) -> Generated {
        let mut failures = Vec::new();

        for tier in &self.tiers {
            let outcome = tokio::time::timeout(self.timeout, tier.generate(request))
                .await
                .unwrap_or(Err(GenerationError::Timeout {
                    tier: tier.name(),
                    timeout: self.timeout,
                }));
            match outcome {
                Ok(text) => {
                    tracing::debug!(tier = tier.name(), chars = text.len(), "generation succeeded");
                    return Generated {
                        text,
                        tier: tier.name(),
                        failures,
                    };
                }
                Err(e @ GenerationError::NotConfigured { .. }) => {
                    tracing::debug!(tier = tier.name(), "generation tier not configured");
                    failures.push(e.to_string());
                }
                Err(e) => {
                    tracing::warn!(tier = tier.name(), error = %e, "generation tier failed");
                    failures.push(e.to_string());
                }
            }
        }

        Generated {
            text: TemplateBackend::render(request),
            tier: TemplateBackend.name(),
            failures,
        }
    }
}

impl std::fmt::Debug for FallbackChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackChain")
            .field("tiers", &self.tier_names())
            .field("timeout", &self.timeout)
            .finish()
    }
}
