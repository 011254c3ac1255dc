//! Answer synthesis: role prompts and the [`ResponseSynthesizer`].

pub mod prompt;
pub mod synthesizer;

pub use prompt::{INSUFFICIENT_DATA_ANSWER, PromptSet, focus_areas};
pub use synthesizer::ResponseSynthesizer;
