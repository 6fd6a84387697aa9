use std::fmt;

use serde::{Deserialize, Serialize};

/// Reporting roles, ordered from the top of the hierarchy down. Every
/// role reports to the role one level above it; directors report to
/// nobody.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Director,
    Manager,
    TeamLead,
    Agent,
}

impl Role {
    /// Top-down reporting order. Indexing this table matches `level()`.
    pub const ORDERED: [Role; 4] = [Role::Director, Role::Manager, Role::TeamLead, Role::Agent];

    pub fn level(&self) -> u8 {
        match self {
            Self::Director => 1,
            Self::Manager => 2,
            Self::TeamLead => 3,
            Self::Agent => 4,
        }
    }

    /// The only role this one may report to.
    pub fn parent_role(&self) -> Option<Role> {
        match self {
            Self::Director => None,
            Self::Manager => Some(Role::Director),
            Self::TeamLead => Some(Role::Manager),
            Self::Agent => Some(Role::TeamLead),
        }
    }

    /// Roles that carry a commission tier on their record.
    pub fn is_commissioned(&self) -> bool {
        matches!(self, Self::Agent | Self::TeamLead)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Director => "director",
            Self::Manager => "manager",
            Self::TeamLead => "team_lead",
            Self::Agent => "agent",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "director" => Some(Self::Director),
            "manager" => Some(Self::Manager),
            "team_lead" => Some(Self::TeamLead),
            "agent" => Some(Self::Agent),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Director => "Director",
            Self::Manager => "Manager",
            Self::TeamLead => "Team Lead",
            Self::Agent => "Agent",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
