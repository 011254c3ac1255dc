//! Core domain types shared by every workflow component.

pub mod identity;
pub mod intent;
pub mod payload;

pub use identity::{Identity, Role};
pub use intent::{Complexity, Entities, IntentDescriptor, QueryType, ToolKind, ToolSet};
pub use payload::{
    AnalysisKind, AnalyticsPayload, EntityFilters, MediaClip, Passage, TableFrame, ToolPayload,
};
