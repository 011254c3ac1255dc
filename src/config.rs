//! Orchestrator configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.
//! The resolved [`OrchestratorConfig`] is built once and handed to the
//! orchestrator and tool nodes at construction time.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default per-tool timeout in seconds.
const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 15;
/// Default whole-query timeout in seconds.
const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;
/// Default workflow step guard.
const DEFAULT_MAX_ITERATIONS: usize = 10;
/// Longest acyclic path through the workflow graph.
const MIN_ITERATIONS: usize = 6;
/// Default answer length cap in characters.
const DEFAULT_MAX_RESPONSE_CHARS: usize = 2000;
/// Default knowledge retrieval result cap.
const DEFAULT_KNOWLEDGE_TOP_K: usize = 5;
/// Default minimum passage relevance.
const DEFAULT_MIN_RELEVANCE: f32 = 0.7;
/// Default clip count when the query names none.
const DEFAULT_MEDIA_LIMIT: usize = 10;
/// Hard cap on returned clips.
const DEFAULT_MEDIA_MAX_LIMIT: usize = 20;
/// Default generation temperature.
const DEFAULT_TEMPERATURE: f32 = 0.1;
/// Default nucleus sampling cutoff.
const DEFAULT_TOP_P: f32 = 0.95;
/// Default generation token cap.
const DEFAULT_MAX_TOKENS: u32 = 4096;
/// Default hosted model.
const DEFAULT_HOSTED_MODEL: &str = "gpt-4o-mini";

/// Configuration for the orchestration engine.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Timeout applied to each tool's backing call.
    pub tool_timeout: Duration,
    /// Timeout applied to one whole `process` call.
    pub query_timeout: Duration,
    /// Maximum workflow steps before the guard aborts the query.
    pub max_iterations: usize,
    /// Maximum answer length in characters, before the truncation marker.
    pub max_response_chars: usize,
    /// Whether answers without an inline citation get a `Sources:` line.
    pub require_citations: bool,
    /// Vector store base URL. Knowledge retrieval is disabled without one.
    pub vector_url: Option<String>,
    /// Vector store API key.
    pub vector_api_key: Option<String>,
    /// Namespace holding event-oriented passages.
    pub events_namespace: String,
    /// Namespace holding conceptual and explanatory passages.
    pub concepts_namespace: String,
    /// Upper bound on passages requested per search.
    pub knowledge_top_k: usize,
    /// Passages scoring below this are discarded.
    pub min_relevance: f32,
    /// Root of the partitioned analytics tables.
    pub data_dir: PathBuf,
    /// Directory holding the media index.
    pub media_dir: PathBuf,
    /// Clip count used when the query names none.
    pub media_default_limit: usize,
    /// Hard cap on returned clips.
    pub media_max_limit: usize,
    /// Dedicated inference endpoint URL (first generation tier).
    pub primary_endpoint: Option<String>,
    /// Bearer token for the dedicated endpoint.
    pub primary_api_key: Option<String>,
    /// API key for the hosted chat completion API (second tier).
    pub hosted_api_key: Option<String>,
    /// Base URL override for the hosted API.
    pub hosted_base_url: Option<String>,
    /// Hosted model name.
    pub hosted_model: String,
    /// Sampling temperature for generation.
    pub temperature: f32,
    /// Nucleus sampling cutoff for generation.
    pub top_p: f32,
    /// Generation token cap.
    pub max_tokens: u32,
    /// Directory containing role prompt overrides.
    ///
    /// When set, role system prompts are loaded from `<role>.md` files in
    /// this directory, falling back to compiled-in defaults for any
    /// missing files.
    pub prompt_dir: Option<PathBuf>,
    /// Classifier vocabulary file. The compiled-in vocabulary is used without one.
    pub vocabulary_path: Option<PathBuf>,
}

impl OrchestratorConfig {
    /// Creates a new builder for `OrchestratorConfig`.
    #[must_use]
    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a resolved value fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::builder().from_env().build()
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            tool_timeout: Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_response_chars: DEFAULT_MAX_RESPONSE_CHARS,
            require_citations: true,
            vector_url: None,
            vector_api_key: None,
            events_namespace: "events".to_string(),
            concepts_namespace: "prose".to_string(),
            knowledge_top_k: DEFAULT_KNOWLEDGE_TOP_K,
            min_relevance: DEFAULT_MIN_RELEVANCE,
            data_dir: PathBuf::from("data/processed"),
            media_dir: PathBuf::from("data/clips"),
            media_default_limit: DEFAULT_MEDIA_LIMIT,
            media_max_limit: DEFAULT_MEDIA_MAX_LIMIT,
            primary_endpoint: None,
            primary_api_key: None,
            hosted_api_key: None,
            hosted_base_url: None,
            hosted_model: DEFAULT_HOSTED_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            max_tokens: DEFAULT_MAX_TOKENS,
            prompt_dir: None,
            vocabulary_path: None,
        }
    }
}

/// Builder for [`OrchestratorConfig`].
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfigBuilder {
    tool_timeout: Option<Duration>,
    query_timeout: Option<Duration>,
    max_iterations: Option<usize>,
    max_response_chars: Option<usize>,
    require_citations: Option<bool>,
    vector_url: Option<String>,
    vector_api_key: Option<String>,
    events_namespace: Option<String>,
    concepts_namespace: Option<String>,
    knowledge_top_k: Option<usize>,
    min_relevance: Option<f32>,
    data_dir: Option<PathBuf>,
    media_dir: Option<PathBuf>,
    media_default_limit: Option<usize>,
    media_max_limit: Option<usize>,
    primary_endpoint: Option<String>,
    primary_api_key: Option<String>,
    hosted_api_key: Option<String>,
    hosted_base_url: Option<String>,
    hosted_model: Option<String>,
    temperature: Option<f32>,
    top_p: Option<f32>,
    max_tokens: Option<u32>,
    prompt_dir: Option<PathBuf>,
    vocabulary_path: Option<PathBuf>,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

impl OrchestratorConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.tool_timeout.is_none() {
            self.tool_timeout =
                env_parse::<u64>("HEARTBEAT_TOOL_TIMEOUT_SECS").map(Duration::from_secs);
        }
        if self.query_timeout.is_none() {
            self.query_timeout =
                env_parse::<u64>("HEARTBEAT_QUERY_TIMEOUT_SECS").map(Duration::from_secs);
        }
        if self.max_iterations.is_none() {
            self.max_iterations = env_parse("HEARTBEAT_MAX_ITERATIONS");
        }
        if self.max_response_chars.is_none() {
            self.max_response_chars = env_parse("HEARTBEAT_MAX_RESPONSE_CHARS");
        }
        if self.require_citations.is_none() {
            self.require_citations = env_bool("HEARTBEAT_REQUIRE_CITATIONS");
        }
        if self.vector_url.is_none() {
            self.vector_url = std::env::var("HEARTBEAT_VECTOR_URL").ok();
        }
        if self.vector_api_key.is_none() {
            self.vector_api_key = std::env::var("PINECONE_API_KEY").ok();
        }
        if self.knowledge_top_k.is_none() {
            self.knowledge_top_k = env_parse("HEARTBEAT_KNOWLEDGE_TOP_K");
        }
        if self.min_relevance.is_none() {
            self.min_relevance = env_parse("HEARTBEAT_MIN_RELEVANCE");
        }
        if self.data_dir.is_none() {
            self.data_dir = std::env::var("HEARTBEAT_DATA_DIR").ok().map(PathBuf::from);
        }
        if self.media_dir.is_none() {
            self.media_dir = std::env::var("CLIPS_BASE_PATH").ok().map(PathBuf::from);
        }
        if self.primary_endpoint.is_none() {
            self.primary_endpoint = std::env::var("HEARTBEAT_PRIMARY_ENDPOINT").ok();
        }
        if self.primary_api_key.is_none() {
            self.primary_api_key = std::env::var("HEARTBEAT_PRIMARY_API_KEY").ok();
        }
        if self.hosted_api_key.is_none() {
            self.hosted_api_key = std::env::var("OPENAI_API_KEY").ok();
        }
        if self.hosted_base_url.is_none() {
            self.hosted_base_url = std::env::var("OPENAI_BASE_URL").ok();
        }
        if self.hosted_model.is_none() {
            self.hosted_model = std::env::var("HEARTBEAT_HOSTED_MODEL").ok();
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("HEARTBEAT_PROMPT_DIR")
                .ok()
                .map(PathBuf::from);
        }
        if self.vocabulary_path.is_none() {
            self.vocabulary_path = std::env::var("HEARTBEAT_VOCABULARY")
                .ok()
                .map(PathBuf::from);
        }
        self
    }

    /// Sets the per-tool timeout.
    #[must_use]
    pub const fn tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    /// Sets the whole-query timeout.
    #[must_use]
    pub const fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Sets the workflow step guard.
    #[must_use]
    pub const fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = Some(n);
        self
    }

    /// Sets the answer length cap.
    #[must_use]
    pub const fn max_response_chars(mut self, n: usize) -> Self {
        self.max_response_chars = Some(n);
        self
    }

    /// Enables or disables the `Sources:` line.
    #[must_use]
    pub const fn require_citations(mut self, enabled: bool) -> Self {
        self.require_citations = Some(enabled);
        self
    }

    /// Sets the vector store URL.
    #[must_use]
    pub fn vector_url(mut self, url: impl Into<String>) -> Self {
        self.vector_url = Some(url.into());
        self
    }

    /// Sets the vector store API key.
    #[must_use]
    pub fn vector_api_key(mut self, key: impl Into<String>) -> Self {
        self.vector_api_key = Some(key.into());
        self
    }

    /// Sets the event-oriented namespace.
    #[must_use]
    pub fn events_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.events_namespace = Some(namespace.into());
        self
    }

    /// Sets the conceptual namespace.
    #[must_use]
    pub fn concepts_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.concepts_namespace = Some(namespace.into());
        self
    }

    /// Sets the knowledge retrieval result cap.
    #[must_use]
    pub const fn knowledge_top_k(mut self, n: usize) -> Self {
        self.knowledge_top_k = Some(n);
        self
    }

    /// Sets the minimum passage relevance.
    #[must_use]
    pub const fn min_relevance(mut self, score: f32) -> Self {
        self.min_relevance = Some(score);
        self
    }

    /// Sets the analytics table root.
    #[must_use]
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// Sets the media directory.
    #[must_use]
    pub fn media_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.media_dir = Some(dir.into());
        self
    }

    /// Sets the default clip count.
    #[must_use]
    pub const fn media_default_limit(mut self, n: usize) -> Self {
        self.media_default_limit = Some(n);
        self
    }

    /// Sets the clip count cap.
    #[must_use]
    pub const fn media_max_limit(mut self, n: usize) -> Self {
        self.media_max_limit = Some(n);
        self
    }

    /// Sets the dedicated inference endpoint.
    #[must_use]
    pub fn primary_endpoint(mut self, url: impl Into<String>) -> Self {
        self.primary_endpoint = Some(url.into());
        self
    }

    /// Sets the dedicated endpoint token.
    #[must_use]
    pub fn primary_api_key(mut self, key: impl Into<String>) -> Self {
        self.primary_api_key = Some(key.into());
        self
    }

    /// Sets the hosted API key.
    #[must_use]
    pub fn hosted_api_key(mut self, key: impl Into<String>) -> Self {
        self.hosted_api_key = Some(key.into());
        self
    }

    /// Sets the hosted API base URL.
    #[must_use]
    pub fn hosted_base_url(mut self, url: impl Into<String>) -> Self {
        self.hosted_base_url = Some(url.into());
        self
    }

    /// Sets the hosted model.
    #[must_use]
    pub fn hosted_model(mut self, model: impl Into<String>) -> Self {
        self.hosted_model = Some(model.into());
        self
    }

    /// Sets the generation temperature.
    #[must_use]
    pub const fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    /// Sets the nucleus sampling cutoff.
    #[must_use]
    pub const fn top_p(mut self, p: f32) -> Self {
        self.top_p = Some(p);
        self
    }

    /// Sets the generation token cap.
    #[must_use]
    pub const fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    /// Sets the prompt override directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Sets the vocabulary file.
    #[must_use]
    pub fn vocabulary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.vocabulary_path = Some(path.into());
        self
    }

    /// Builds the [`OrchestratorConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a timeout is zero, `min_relevance`
    /// is outside `[0, 1]`, `max_iterations` is shorter than the longest
    /// workflow path, or the default clip limit exceeds the cap.
    pub fn build(self) -> Result<OrchestratorConfig, ConfigError> {
        let defaults = OrchestratorConfig::default();
        let config = OrchestratorConfig {
            tool_timeout: self.tool_timeout.unwrap_or(defaults.tool_timeout),
            query_timeout: self.query_timeout.unwrap_or(defaults.query_timeout),
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            max_response_chars: self
                .max_response_chars
                .unwrap_or(defaults.max_response_chars),
            require_citations: self.require_citations.unwrap_or(defaults.require_citations),
            vector_url: self.vector_url.filter(|u| !u.trim().is_empty()),
            vector_api_key: self.vector_api_key,
            events_namespace: self.events_namespace.unwrap_or(defaults.events_namespace),
            concepts_namespace: self
                .concepts_namespace
                .unwrap_or(defaults.concepts_namespace),
            knowledge_top_k: self.knowledge_top_k.unwrap_or(defaults.knowledge_top_k),
            min_relevance: self.min_relevance.unwrap_or(defaults.min_relevance),
            data_dir: self.data_dir.unwrap_or(defaults.data_dir),
            media_dir: self.media_dir.unwrap_or(defaults.media_dir),
            media_default_limit: self
                .media_default_limit
                .unwrap_or(defaults.media_default_limit),
            media_max_limit: self.media_max_limit.unwrap_or(defaults.media_max_limit),
            primary_endpoint: self.primary_endpoint.filter(|u| !u.trim().is_empty()),
            primary_api_key: self.primary_api_key,
            hosted_api_key: self.hosted_api_key.filter(|k| !k.trim().is_empty()),
            hosted_base_url: self.hosted_base_url,
            hosted_model: self.hosted_model.unwrap_or(defaults.hosted_model),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            top_p: self.top_p.unwrap_or(defaults.top_p),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            prompt_dir: self.prompt_dir,
            vocabulary_path: self.vocabulary_path,
        };
        validate(&config)?;
        Ok(config)
    }
}

fn validate(config: &OrchestratorConfig) -> Result<(), ConfigError> {
    let invalid = |field, message: &str| ConfigError::Invalid {
        field,
        message: message.to_string(),
    };

    if config.tool_timeout.is_zero() {
        return Err(invalid("tool_timeout", "must be non-zero"));
    }
    if config.query_timeout.is_zero() {
        return Err(invalid("query_timeout", "must be non-zero"));
    }
    if !(0.0..=1.0).contains(&config.min_relevance) {
        return Err(invalid("min_relevance", "must be within [0, 1]"));
    }
    if config.max_iterations < MIN_ITERATIONS {
        return Err(ConfigError::Invalid {
            field: "max_iterations",
            message: format!("must be at least {MIN_ITERATIONS}"),
        });
    }
    if config.knowledge_top_k == 0 {
        return Err(invalid("knowledge_top_k", "must be non-zero"));
    }
    if config.media_default_limit > config.media_max_limit {
        return Err(invalid(
            "media_default_limit",
            "must not exceed media_max_limit",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = OrchestratorConfig::builder()
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.tool_timeout, Duration::from_secs(15));
        assert_eq!(config.query_timeout, Duration::from_secs(30));
        assert_eq!(config.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(config.max_response_chars, 2000);
        assert!(config.require_citations);
        assert_eq!(config.events_namespace, "events");
        assert_eq!(config.concepts_namespace, "prose");
        assert_eq!(config.media_default_limit, 10);
        assert_eq!(config.media_max_limit, 20);
        assert_eq!(config.hosted_model, "gpt-4o-mini");
        assert!(config.vector_url.is_none());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = OrchestratorConfig::builder()
            .tool_timeout(Duration::from_millis(250))
            .min_relevance(0.5)
            .vector_url("http://localhost:9000")
            .data_dir("/tmp/tables")
            .require_citations(false)
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.tool_timeout, Duration::from_millis(250));
        assert!((config.min_relevance - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.vector_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/tables"));
        assert!(!config.require_citations);
    }

    #[test]
    fn test_blank_vector_url_is_unset() {
        let config = OrchestratorConfig::builder()
            .vector_url("  ")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert!(config.vector_url.is_none());
    }

    #[test]
    fn test_rejects_zero_tool_timeout() {
        let result = OrchestratorConfig::builder()
            .tool_timeout(Duration::ZERO)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "tool_timeout",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_out_of_range_relevance() {
        let result = OrchestratorConfig::builder().min_relevance(1.5).build();
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                field: "min_relevance",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_short_iteration_guard() {
        let result = OrchestratorConfig::builder().max_iterations(3).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_default_limit_above_cap() {
        let result = OrchestratorConfig::builder()
            .media_default_limit(30)
            .build();
        assert!(result.is_err());
    }
}
