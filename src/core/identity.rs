//! Requester identity.
//!
//! An [`Identity`] is supplied fully populated by the request-handling layer
//! and is immutable for the lifetime of a query.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Organisational role of the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Coaching staff.
    Coach,
    /// A rostered player.
    Player,
    /// Analytics staff.
    Analyst,
    /// Scouting staff.
    Scout,
    /// Other team personnel.
    Staff,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Coach,
        Self::Player,
        Self::Analyst,
        Self::Scout,
        Self::Staff,
    ];

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Coach => "coach",
            Self::Player => "player",
            Self::Analyst => "analyst",
            Self::Scout => "scout",
            Self::Staff => "staff",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coach" => Ok(Self::Coach),
            "player" => Ok(Self::Player),
            "analyst" => Ok(Self::Analyst),
            "scout" => Ok(Self::Scout),
            "staff" => Ok(Self::Staff),
            other => Err(format!(
                "unknown role '{other}' (expected coach, player, analyst, scout or staff)"
            )),
        }
    }
}

/// Who is asking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    role: Role,
    name: String,
    teams: BTreeSet<String>,
    session_id: String,
}

impl Identity {
    /// Creates an identity with no team access and an empty session id.
    #[must_use]
    pub fn new(role: Role, name: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            teams: BTreeSet::new(),
            session_id: String::new(),
        }
    }

    /// Adds accessible team codes (stored upper-case).
    #[must_use]
    pub fn with_teams<I, S>(mut self, teams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.teams
            .extend(teams.into_iter().map(|t| t.as_ref().trim().to_uppercase()));
        self
    }

    /// Sets the opaque session identifier.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Requester role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Team codes the requester may access.
    #[must_use]
    pub const fn teams(&self) -> &BTreeSet<String> {
        &self.teams
    }

    /// Session identifier.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
