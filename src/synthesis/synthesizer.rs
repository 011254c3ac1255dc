//! Response synthesizer.
//!
//! Turns a finished [`WorkflowState`] into the final answer: role prompt,
//! fallback chain, then truncation and citation post-processing.

use futures_util::FutureExt;
use std::fmt::Write;
use std::panic::AssertUnwindSafe;
use unicode_segmentation::UnicodeSegmentation;

use super::prompt::{
    INSUFFICIENT_DATA_ANSWER, PromptSet, build_synthesis_prompt, render_template_answer,
};
use crate::config::OrchestratorConfig;
use crate::generation::{FallbackChain, Generated, GenerationRequest};
use crate::workflow::WorkflowState;
use crate::workflow::evidence::{dedup_first_seen, has_sufficient_context};
use crate::workflow::result::FAILURE_ANSWER;

/// Marker appended to truncated answers.
const TRUNCATION_MARKER: &str = "...";

/// Produces the final answer for a workflow state.
#[derive(Debug, Clone)]
pub struct ResponseSynthesizer {
    chain: FallbackChain,
    prompts: PromptSet,
    max_response_chars: usize,
    require_citations: bool,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

impl ResponseSynthesizer {
    /// Creates a synthesizer from explicit parts.
    #[must_use]
    pub fn new(chain: FallbackChain, prompts: PromptSet, config: &OrchestratorConfig) -> Self {
        Self {
            chain,
            prompts,
            max_response_chars: config.max_response_chars,
            require_citations: config.require_citations,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
        }
    }

    /// Creates a synthesizer with the configured tiers and prompt directory.
    #[must_use]
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        Self::new(
            FallbackChain::from_config(config),
            PromptSet::load(config.prompt_dir.as_deref()),
            config,
        )
    }

    /// Fallback chain used for generation.
    #[must_use]
    pub const fn chain(&self) -> &FallbackChain {
        &self.chain
    }

    /// Sets the answer on `state`.
    ///
    /// Never fails: missing context yields [`INSUFFICIENT_DATA_ANSWER`] and a
    /// panic during generation yields [`FAILURE_ANSWER`].
    pub async fn synthesize(&self, state: WorkflowState) -> WorkflowState {
        if state.deadline_exceeded || !has_sufficient_context(&state) {
            return Self::insufficient_data(state);
        }

        let outcome = AssertUnwindSafe(self.generate(&state)).catch_unwind().await;
        match outcome {
            Ok(generated) => self.apply(state, generated),
            Err(_) => {
                tracing::error!("response generation panicked");
                let mut state = state;
                state.errors.push("response generation panicked".to_string());
                state.answer = Some(FAILURE_ANSWER.to_string());
                state
            }
        }
    }

    /// Answers with [`INSUFFICIENT_DATA_ANSWER`]. Performs no I/O.
    #[must_use]
    pub fn insufficient_data(state: WorkflowState) -> WorkflowState {
        tracing::warn!(
            deadline_exceeded = state.deadline_exceeded,
            tools = state.tool_results.len(),
            "insufficient data for synthesis"
        );
        let mut state = state.with_warning("insufficient data for synthesis");
        state.answer = Some(INSUFFICIENT_DATA_ANSWER.to_string());
        state
    }

    async fn generate(&self, state: &WorkflowState) -> Generated {
        let role = state.identity().role();
        let request = GenerationRequest {
            system: self.prompts.system_prompt(role),
            prompt: build_synthesis_prompt(state),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            fallback: render_template_answer(state),
        };
        tracing::debug!(
            role = %role,
            prompt_chars = request.prompt.len(),
            tiers = ?self.chain.tier_names(),
            "synthesizing response"
        );
        self.chain.generate(&request).await
    }

    fn apply(&self, state: WorkflowState, generated: Generated) -> WorkflowState {
        let mut state = if generated.is_degraded() {
            let mut warning = format!("generation degraded to the {} tier", generated.tier);
            if !generated.failures.is_empty() {
                let _ = write!(warning, " ({})", generated.failures.join("; "));
            }
            state.with_warning(warning)
        } else {
            state
        };

        tracing::info!(tier = generated.tier, chars = generated.text.len(), "response synthesized");
        let answer = self.post_process(&generated.text, state.evidence());
        state.generation_tier = Some(generated.tier);
        state.answer = Some(if answer.is_empty() {
            INSUFFICIENT_DATA_ANSWER.to_string()
        } else {
            answer
        });
        state
    }

    /// Truncates and, when required, appends a `Sources:` line.
    fn post_process(&self, text: &str, evidence: &[String]) -> String {
        let mut response = truncate(text.trim(), self.max_response_chars);

        let cited = evidence.iter().any(|c| response.contains(c.as_str()));
        if self.require_citations && !evidence.is_empty() && !cited {
            let _ = write!(
                response,
                "\n\nSources: {}",
                dedup_first_seen(evidence).join(", ")
            );
        }
        response
    }
}

/// Cuts `text` to at most `max` grapheme clusters, marking the cut.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    match text.grapheme_indices(true).nth(max) {
        Some((idx, _)) => format!("{}{TRUNCATION_MARKER}", &text[..idx]),
        None => text.to_string(),
    }
}
