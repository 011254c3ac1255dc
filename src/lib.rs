//! # heartbeat-rs
//!
//! Query orchestration engine for hockey analytics.
//!
//! A natural-language question from a coach, player, analyst, scout or
//! staff member is classified into an intent, routed through up to three
//! retrieval tools (vector knowledge search, tabular analytics, media
//! clips) under a role-based permission policy, and synthesized into a
//! cited answer by a tiered generation chain.
//!
//! ## Architecture
//!
//! - [`classifier`]: pluggable intent classification and entity extraction
//! - [`workflow`]: state, routing table, evidence aggregation and the driver
//! - [`tools`]: the three retrieval nodes
//! - [`clients`]: narrow contracts for the external stores
//! - [`generation`]: inference endpoint, hosted API and template tiers
//! - [`synthesis`]: role prompts and the response synthesizer
//! - [`policy`]: the single source of authorization decisions
//!
//! ## Example
//!
//! ```no_run
//! use heartbeat_rs::{Identity, Orchestrator, OrchestratorConfig, Role};
//!
//! # async fn run() -> heartbeat_rs::Result<()> {
//! let config = OrchestratorConfig::from_env()?;
//! let orchestrator = Orchestrator::from_config(config)?;
//! let identity = Identity::new(Role::Analyst, "Data Analyst").with_teams(["MTL"]);
//! let result = orchestrator
//!     .process("How is Suzuki performing this season?", identity)
//!     .await;
//! assert!(!result.answer_text.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod cli;
pub mod clients;
pub mod config;
pub mod core;
pub mod error;
pub mod generation;
pub mod policy;
pub mod synthesis;
pub mod telemetry;
pub mod tools;
pub mod workflow;

pub use classifier::{IntentClassifier, LexicalClassifier, Vocabulary};
pub use clients::{Clients, MediaIndex, TabularStore, VectorStore, create_clients};
pub use config::OrchestratorConfig;
pub use crate::core::{
    Complexity, Identity, IntentDescriptor, QueryType, Role, ToolKind, ToolPayload, ToolSet,
};
pub use error::{Error, Result};
pub use synthesis::ResponseSynthesizer;
pub use tools::{ToolNode, ToolNodes};
pub use workflow::{ExternalResult, Orchestrator, ToolResult, WorkflowState};
