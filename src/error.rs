//! Error types for HeartBeat-RS.
//!
//! Recoverable failures are resolved at the lowest layer and turned into
//! data ([`ToolResult`](crate::workflow::ToolResult) entries, warnings).
//! Only [`OrchestratorError`] can reach the driver's top-level guard, and
//! even that is converted into a failure response before it leaves
//! [`Orchestrator::process`](crate::workflow::Orchestrator::process).

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::core::ToolKind;

/// Result type alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for the library and CLI.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A backing client failed outside of a tool node.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The orchestrator itself failed.
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    /// A CLI command failed.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Errors raised by the external collaborator clients.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP transport failure or non-success status.
    #[error("request to {service} failed: {message}")]
    Http {
        /// Which collaborator was called.
        service: &'static str,
        /// Error description.
        message: String,
        /// HTTP status code, when one was received.
        status: Option<u16>,
    },

    /// The response body did not match the expected shape.
    #[error("malformed response from {service}: {message}")]
    Decode {
        /// Which collaborator was called.
        service: &'static str,
        /// Error description.
        message: String,
    },

    /// Reading a backing file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The collaborator is not configured or not reachable.
    #[error("{service} unavailable: {message}")]
    Unavailable {
        /// Which collaborator was called.
        service: &'static str,
        /// Error description.
        message: String,
    },
}

/// Failure of a single tool node invocation.
///
/// Never propagated past the node: it is folded into a failed
/// [`ToolResult`](crate::workflow::ToolResult).
#[derive(Debug, Error)]
pub enum ToolError {
    /// The backing call exceeded the per-tool timeout.
    #[error("{tool} timed out after {}ms", .timeout.as_millis())]
    Timeout {
        /// Tool that timed out.
        tool: ToolKind,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// The backing client failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The permission policy denied the request.
    #[error("permission denied: {reason}")]
    PermissionDenied {
        /// Why access was refused.
        reason: String,
    },

    /// The call succeeded but produced nothing usable.
    #[error("no usable results: {message}")]
    Empty {
        /// What was filtered away or missing.
        message: String,
    },
}

impl From<crate::policy::Denial> for ToolError {
    fn from(denial: crate::policy::Denial) -> Self {
        Self::PermissionDenied {
            reason: denial.reason,
        }
    }
}

/// Failure of one generation tier.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The tier has no endpoint or credentials configured.
    #[error("{tier} backend not configured")]
    NotConfigured {
        /// Tier name.
        tier: &'static str,
    },

    /// The request failed.
    #[error("{tier} request failed: {message}")]
    Request {
        /// Tier name.
        tier: &'static str,
        /// Error description.
        message: String,
        /// HTTP status code, when one was received.
        status: Option<u16>,
    },

    /// The tier exceeded its timeout.
    #[error("{tier} timed out after {}ms", .timeout.as_millis())]
    Timeout {
        /// Tier name.
        tier: &'static str,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// The tier answered with no text.
    #[error("{tier} returned an empty completion")]
    EmptyResponse {
        /// Tier name.
        tier: &'static str,
    },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds an invalid value.
    #[error("invalid configuration for {field}: {message}")]
    Invalid {
        /// Field name.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// The vocabulary file could not be loaded.
    #[error("failed to load vocabulary from {path}: {message}")]
    Vocabulary {
        /// Vocabulary file path.
        path: PathBuf,
        /// Error description.
        message: String,
    },
}

/// Errors that escape a workflow step.
///
/// The driver turns every one of these into a response with
/// `success = false`; callers never observe them directly.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The query was rejected before classification.
    #[error("invalid query: {message}")]
    InvalidQuery {
        /// Why the query was rejected.
        message: String,
    },

    /// The step counter exceeded the configured maximum.
    #[error("workflow exceeded {max_iterations} steps")]
    IterationLimit {
        /// Configured maximum.
        max_iterations: usize,
    },

    /// A step panicked.
    #[error("workflow step panicked: {message}")]
    Panicked {
        /// Panic payload, when it was a string.
        message: String,
    },
}

/// CLI command errors.
#[derive(Debug, Error)]
pub enum CommandError {
    /// An argument could not be interpreted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Command execution failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Output could not be serialized.
    #[error("output format error: {0}")]
    OutputFormat(String),
}
