//! The query workflow: state, routing, evidence, and the driver.

pub mod evidence;
pub mod orchestrator;
pub mod result;
pub mod router;
pub mod state;

pub use orchestrator::{MAX_QUERY_LEN, Orchestrator, OrchestratorBuilder};
pub use result::{ExternalResult, FAILURE_ANSWER, ToolSummary};
pub use router::{NextStep, Step};
pub use state::{ToolResult, WorkflowState};
