//! Routing decisions and the static workflow topology.
//!
//! All functions here are pure: they read the required tool set and never
//! touch the workflow state.

use serde::Serialize;

use crate::core::ToolSet;

/// Routing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
    /// Media retrieval, then knowledge or analytics.
    MediaThenData,
    /// Media retrieval alone.
    MediaOnly,
    /// Knowledge retrieval, then analytics.
    KnowledgeThenData,
    /// Knowledge retrieval alone.
    KnowledgeOnly,
    /// Structured analytics.
    DataOnly,
    /// Straight to synthesis.
    Synthesis,
}

impl NextStep {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MediaThenData => "media_then_data",
            Self::MediaOnly => "media_only",
            Self::KnowledgeThenData => "knowledge_then_data",
            Self::KnowledgeOnly => "knowledge_only",
            Self::DataOnly => "data_only",
            Self::Synthesis => "synthesis",
        }
    }
}

impl std::fmt::Display for NextStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Intent classification.
    IntentAnalysis,
    /// Initial routing.
    Router,
    /// Vector knowledge search.
    KnowledgeRetrieval,
    /// Tabular analytics.
    StructuredAnalytics,
    /// Media index search.
    MediaRetrieval,
    /// Answer generation.
    Synthesis,
    /// Terminal.
    Done,
}

impl Step {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IntentAnalysis => "intent_analysis",
            Self::Router => "router",
            Self::KnowledgeRetrieval => "knowledge_retrieval",
            Self::StructuredAnalytics => "structured_analytics",
            Self::MediaRetrieval => "media_retrieval",
            Self::Synthesis => "synthesis",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Initial routing decision.
///
/// Media wins over everything, knowledge over data. The order is part of the
/// public contract.
#[must_use]
pub fn route(required: &ToolSet) -> NextStep {
    let media = required.needs_media();
    let knowledge = required.needs_knowledge();
    let data = required.needs_data();

    match (media, knowledge, data) {
        (true, true, _) | (true, _, true) => NextStep::MediaThenData,
        (true, false, false) => NextStep::MediaOnly,
        (false, true, true) => NextStep::KnowledgeThenData,
        (false, true, false) => NextStep::KnowledgeOnly,
        (false, false, true) => NextStep::DataOnly,
        (false, false, false) => NextStep::Synthesis,
    }
}

/// Decision after knowledge retrieval has run.
#[must_use]
pub fn after_knowledge_retrieval(required: &ToolSet) -> NextStep {
    if required.needs_data() {
        NextStep::DataOnly
    } else {
        NextStep::Synthesis
    }
}

/// Decision after media retrieval has run.
///
/// With media, knowledge and data all required, data wins and knowledge is
/// skipped.
#[must_use]
pub fn after_media_retrieval(required: &ToolSet) -> NextStep {
    if required.needs_data() {
        NextStep::DataOnly
    } else if required.needs_knowledge() {
        NextStep::KnowledgeOnly
    } else {
        NextStep::Synthesis
    }
}

/// Step a routing decision leads to.
#[must_use]
pub const fn entry_step(decision: NextStep) -> Step {
    match decision {
        NextStep::MediaThenData | NextStep::MediaOnly => Step::MediaRetrieval,
        NextStep::KnowledgeThenData | NextStep::KnowledgeOnly => Step::KnowledgeRetrieval,
        NextStep::DataOnly => Step::StructuredAnalytics,
        NextStep::Synthesis => Step::Synthesis,
    }
}

/// The transition table.
///
/// Maps the step just completed to the next one, consulting the routing
/// functions at the three conditional branch points.
#[must_use]
pub fn transition(current: Step, required: &ToolSet) -> Step {
    match current {
        Step::IntentAnalysis => Step::Router,
        Step::Router => entry_step(route(required)),
        Step::KnowledgeRetrieval => entry_step(after_knowledge_retrieval(required)),
        Step::MediaRetrieval => entry_step(after_media_retrieval(required)),
        Step::StructuredAnalytics => Step::Synthesis,
        Step::Synthesis | Step::Done => Step::Done,
    }
}

/// Full step sequence for a tool set, from intent analysis to done.
#[must_use]
pub fn plan(required: &ToolSet) -> Vec<Step> {
    let mut steps = vec![Step::IntentAnalysis];
    let mut current = Step::IntentAnalysis;
    while current != Step::Done {
        current = transition(current, required);
        steps.push(current);
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ToolKind::{
        MatchupAnalysis, MediaRetrieval, MetricsCalculation, StructuredQuery, VectorSearch,
    };
    use crate::core::{ToolKind, ToolSet};
    use proptest::prelude::*;
    use test_case::test_case;

    #[test_case(&[], NextStep::Synthesis)]
    #[test_case(&[VectorSearch], NextStep::KnowledgeOnly)]
    #[test_case(&[StructuredQuery], NextStep::DataOnly)]
    #[test_case(&[MetricsCalculation], NextStep::DataOnly)]
    #[test_case(&[MatchupAnalysis], NextStep::DataOnly)]
    #[test_case(&[MediaRetrieval], NextStep::MediaOnly)]
    #[test_case(&[VectorSearch, StructuredQuery], NextStep::KnowledgeThenData)]
    #[test_case(&[VectorSearch, MatchupAnalysis], NextStep::KnowledgeThenData)]
    #[test_case(&[MediaRetrieval, StructuredQuery], NextStep::MediaThenData)]
    #[test_case(&[MediaRetrieval, VectorSearch], NextStep::MediaThenData)]
    #[test_case(&[MediaRetrieval, VectorSearch, MetricsCalculation], NextStep::MediaThenData)]
    fn test_route_table(tools: &[ToolKind], expected: NextStep) {
        let set: ToolSet = tools.iter().copied().collect();
        assert_eq!(route(&set), expected);
    }

    #[test_case(&[VectorSearch, StructuredQuery], NextStep::DataOnly)]
    #[test_case(&[VectorSearch], NextStep::Synthesis)]
    fn test_after_knowledge(tools: &[ToolKind], expected: NextStep) {
        let set: ToolSet = tools.iter().copied().collect();
        assert_eq!(after_knowledge_retrieval(&set), expected);
    }

    #[test_case(&[MediaRetrieval, StructuredQuery], NextStep::DataOnly)]
    #[test_case(&[MediaRetrieval, VectorSearch, StructuredQuery], NextStep::DataOnly)]
    #[test_case(&[MediaRetrieval, VectorSearch], NextStep::KnowledgeOnly)]
    #[test_case(&[MediaRetrieval], NextStep::Synthesis)]
    fn test_after_media(tools: &[ToolKind], expected: NextStep) {
        let set: ToolSet = tools.iter().copied().collect();
        assert_eq!(after_media_retrieval(&set), expected);
    }

    #[test]
    fn test_plan_knowledge_then_data() {
        let set = ToolSet::from([VectorSearch, StructuredQuery]);
        assert_eq!(
            plan(&set),
            vec![
                Step::IntentAnalysis,
                Step::Router,
                Step::KnowledgeRetrieval,
                Step::StructuredAnalytics,
                Step::Synthesis,
                Step::Done,
            ]
        );
    }

    #[test]
    fn test_plan_all_tools_skips_knowledge() {
        let set: ToolSet = ToolKind::ALL.into_iter().collect();
        assert_eq!(
            plan(&set),
            vec![
                Step::IntentAnalysis,
                Step::Router,
                Step::MediaRetrieval,
                Step::StructuredAnalytics,
                Step::Synthesis,
                Step::Done,
            ]
        );
    }

    #[test]
    fn test_plan_greeting() {
        assert_eq!(
            plan(&ToolSet::new()),
            vec![Step::IntentAnalysis, Step::Router, Step::Synthesis, Step::Done]
        );
    }

    /// Reference oracle written directly from the priority table.
    fn oracle(set: &ToolSet) -> NextStep {
        let has = |t: ToolKind| set.contains(t);
        let data = has(StructuredQuery) || has(MetricsCalculation) || has(MatchupAnalysis);
        if has(MediaRetrieval) && (has(VectorSearch) || data) {
            NextStep::MediaThenData
        } else if has(MediaRetrieval) {
            NextStep::MediaOnly
        } else if has(VectorSearch) && data {
            NextStep::KnowledgeThenData
        } else if has(VectorSearch) {
            NextStep::KnowledgeOnly
        } else if data {
            NextStep::DataOnly
        } else {
            NextStep::Synthesis
        }
    }

    fn subset(mask: u8) -> ToolSet {
        ToolKind::ALL
            .into_iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, t)| t)
            .collect()
    }

    #[test]
    fn test_route_matches_oracle_for_every_subset() {
        for mask in 0u8..32 {
            let set = subset(mask);
            assert_eq!(route(&set), oracle(&set), "mask {mask:05b}");
        }
    }

    proptest! {
        #[test]
        fn prop_route_is_pure(mask in 0u8..32, other in 0u8..32) {
            let set = subset(mask);
            let first = route(&set);
            let _ = route(&subset(other));
            prop_assert_eq!(route(&set), first);
            prop_assert_eq!(first, oracle(&set));
        }

        #[test]
        fn prop_plan_is_acyclic_and_bounded(mask in 0u8..32) {
            let steps = plan(&subset(mask));
            prop_assert!(steps.len() <= 6);
            prop_assert_eq!(steps.last().copied(), Some(Step::Done));
            let mut seen = std::collections::HashSet::new();
            for step in &steps {
                prop_assert!(seen.insert(*step), "step {} repeated", step);
            }
        }
    }
}
