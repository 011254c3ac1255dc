//! Role-based permission policy.
//!
//! The single source of truth for authorization. Tool nodes call into this
//! module; none of them compare roles on their own.

use serde::Serialize;
use thiserror::Error;

use crate::core::payload::SUBJECT_COLUMN;
use crate::core::{AnalysisKind, EntityFilters, Identity, MediaClip, Role, TableFrame};

/// A request the policy refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct Denial {
    /// Why access was refused.
    pub reason: String,
}

impl Denial {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A class of data a role may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataScope {
    /// The requester's own records.
    Personal,
    /// Team-level records.
    Team,
    /// Any player's records.
    Player,
    /// Game records.
    Game,
    /// Strategy and systems material.
    Strategy,
    /// League-wide records.
    League,
    /// Opponent scouting material.
    Opponent,
}

/// What a role is allowed to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessScope {
    /// Data classes in scope.
    pub data_scope: &'static [DataScope],
    /// Derived and advanced metrics.
    pub advanced_metrics: bool,
    /// Opponent-specific data.
    pub opponent_data: bool,
    /// Tactical and strategic analysis.
    pub tactical_analysis: bool,
}

/// Knowledge categories that require `tactical_analysis`.
const TACTICAL_CATEGORIES: &[&str] = &["tactics", "tactical", "strategy", "systems", "game_plan"];

/// Knowledge categories that require `opponent_data`.
const OPPONENT_CATEGORIES: &[&str] = &["opponent", "opponents", "scouting", "scouting_report"];

impl AccessScope {
    /// Returns `true` if the scope includes the given data class.
    #[must_use]
    pub fn includes(&self, scope: DataScope) -> bool {
        self.data_scope.contains(&scope)
    }

    /// Returns `true` if content in `category` may be shown.
    ///
    /// Unknown categories are permitted.
    #[must_use]
    pub fn permits_category(&self, category: &str) -> bool {
        let category = category.trim().to_lowercase();
        if TACTICAL_CATEGORIES.contains(&category.as_str()) {
            return self.tactical_analysis;
        }
        if OPPONENT_CATEGORIES.contains(&category.as_str()) {
            return self.opponent_data;
        }
        true
    }
}

/// Returns the access scope for a role.
#[must_use]
pub const fn allowed_scope(role: Role) -> AccessScope {
    match role {
        Role::Coach => AccessScope {
            data_scope: &[
                DataScope::Team,
                DataScope::Player,
                DataScope::Game,
                DataScope::Strategy,
            ],
            advanced_metrics: true,
            opponent_data: true,
            tactical_analysis: true,
        },
        Role::Player => AccessScope {
            data_scope: &[DataScope::Personal, DataScope::Team, DataScope::Game],
            advanced_metrics: true,
            opponent_data: false,
            tactical_analysis: false,
        },
        Role::Analyst => AccessScope {
            data_scope: &[
                DataScope::Team,
                DataScope::Player,
                DataScope::Game,
                DataScope::League,
            ],
            advanced_metrics: true,
            opponent_data: true,
            tactical_analysis: true,
        },
        Role::Staff => AccessScope {
            data_scope: &[DataScope::Team, DataScope::Game],
            advanced_metrics: false,
            opponent_data: false,
            tactical_analysis: false,
        },
        Role::Scout => AccessScope {
            data_scope: &[DataScope::Player, DataScope::Opponent, DataScope::League],
            advanced_metrics: true,
            opponent_data: true,
            tactical_analysis: true,
        },
    }
}

/// Returns `true` if `requester_name` may see a resource owned by `owner_name`.
///
/// Players only see their own resources; every other role is unrestricted
/// within the team scope.
#[must_use]
pub fn can_access_media(role: Role, requester_name: &str, owner_name: &str) -> bool {
    match role {
        Role::Player => names_match(requester_name, owner_name),
        Role::Coach | Role::Analyst | Role::Scout | Role::Staff => true,
    }
}

/// Returns `true` if rows and clips handed to `role` must be checked
/// against the requester one by one.
#[must_use]
pub const fn restricts_rows(role: Role) -> bool {
    matches!(role, Role::Player)
}

/// Rewrites a requested subject list according to the requester's role.
///
/// For players an empty request becomes the requester alone and any other
/// named subject is dropped; a request naming only other players is denied.
/// Other roles get the request back unchanged.
pub fn scope_subjects(identity: &Identity, requested: &[String]) -> Result<Vec<String>, Denial> {
    match identity.role() {
        Role::Player => {
            if requested.is_empty() {
                return Ok(vec![identity.name().to_string()]);
            }
            let own: Vec<String> = requested
                .iter()
                .filter(|s| names_match(identity.name(), s))
                .cloned()
                .collect();
            if own.is_empty() {
                return Err(Denial::new("players may only access their own records"));
            }
            Ok(own)
        }
        Role::Coach | Role::Analyst | Role::Scout | Role::Staff => Ok(requested.to_vec()),
    }
}

/// Team codes a query is confined to. Empty means unrestricted.
///
/// Roles with opponent scope work across the league and are not confined;
/// everyone else sees only the teams on their identity.
#[must_use]
pub fn team_scope(identity: &Identity) -> Vec<String> {
    if allowed_scope(identity.role()).includes(DataScope::Opponent) {
        return Vec::new();
    }
    identity.teams().iter().cloned().collect()
}

/// Applies subject and team scoping to extracted filters.
pub fn scope_filters(identity: &Identity, mut filters: EntityFilters) -> Result<EntityFilters, Denial> {
    filters.subjects = scope_subjects(identity, &filters.subjects)?;
    filters.teams = team_scope(identity);
    Ok(filters)
}

/// Checks that `role` may run the given analysis routine.
pub fn check_analysis(role: Role, kind: AnalysisKind) -> Result<(), Denial> {
    if kind == AnalysisKind::MatchupAnalysis && !allowed_scope(role).opponent_data {
        return Err(Denial::new(format!("{role} role has no access to opponent data")));
    }
    Ok(())
}

/// Drops rows the requester may not see.
///
/// Only applies to restricted roles; frames without a subject column pass.
#[must_use]
pub fn filter_rows(identity: &Identity, mut frame: TableFrame) -> TableFrame {
    if !restricts_rows(identity.role()) {
        return frame;
    }
    let Some(col) = frame.column_index(SUBJECT_COLUMN) else {
        return frame;
    };
    frame.rows.retain(|row| {
        row.get(col)
            .and_then(serde_json::Value::as_str)
            .is_some_and(|owner| can_access_media(identity.role(), identity.name(), owner))
    });
    frame
}

/// Drops clips the requester may not see.
#[must_use]
pub fn filter_clips(identity: &Identity, mut clips: Vec<MediaClip>) -> Vec<MediaClip> {
    clips.retain(|clip| can_access_media(identity.role(), identity.name(), &clip.owner));
    clips
}

/// Case-insensitive name comparison that also accepts a surname-only match.
///
/// "Suzuki" matches "Nick Suzuki"; empty names never match.
fn names_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    let last = |s: &str| s.split_whitespace().last().map(str::to_string);
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    !short.contains(' ') && last(long.as_str()).as_deref() == Some(short.as_str())
}
