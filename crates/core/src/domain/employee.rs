use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::role::Role;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

impl EmployeeId {
    /// Placeholder id for a record created client-side before the store
    /// has assigned a durable one.
    pub fn temporary() -> Self {
        Self(format!("tmp-{}", Uuid::new_v4()))
    }

    pub fn is_temporary(&self) -> bool {
        self.0.starts_with("tmp-")
    }
}

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Site {
    Riverton,
    Fairview,
}

impl Site {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Riverton => "riverton",
            Self::Fairview => "fairview",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "riverton" => Some(Self::Riverton),
            "fairview" => Some(Self::Fairview),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Riverton => "Riverton",
            Self::Fairview => "Fairview",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    Terminated,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Terminated => "terminated",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Some(Self::Active),
            "terminated" => Some(Self::Terminated),
            _ => None,
        }
    }
}

/// Commission plan an agent is on. New hires carry `New` (or nothing,
/// which reads the same) until tenure moves them to `Veteran`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommissionTier {
    New,
    Veteran,
}

impl CommissionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Veteran => "veteran",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "new" => Some(Self::New),
            "veteran" => Some(Self::Veteran),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteEntry {
    pub noted_at: DateTime<Utc>,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerminationDetails {
    pub reason: String,
    pub terminated_at: DateTime<Utc>,
    pub final_pay_date: Option<DateTime<Utc>>,
    pub document_refs: Vec<String>,
    pub severance: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub role: Role,
    pub site: Site,
    pub manager_id: Option<EmployeeId>,
    pub status: EmployeeStatus,
    pub commission_tier: Option<CommissionTier>,
    pub start_date: DateTime<Utc>,
    pub termination: Option<TerminationDetails>,
    pub notes: Vec<NoteEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }

    /// Whole UTC calendar days since the start date. Tenure ticks over
    /// at date boundaries, not at the hiring wall-clock instant.
    pub fn tenure_days(&self, now: DateTime<Utc>) -> i64 {
        (now.date_naive() - self.start_date.date_naive()).num_days()
    }
}

/// Create payload handed to an employee store, which assigns the id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewEmployee {
    pub name: String,
    pub role: Role,
    pub site: Site,
    pub manager_id: Option<EmployeeId>,
    pub commission_tier: Option<CommissionTier>,
    pub start_date: DateTime<Utc>,
}

/// Partial update for an employee record. Absent fields are left
/// untouched; notes can only be appended through here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeEdit {
    pub name: Option<String>,
    pub commission_tier: Option<CommissionTier>,
    pub start_date: Option<DateTime<Utc>>,
    pub append_note: Option<String>,
}

impl EmployeeEdit {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.commission_tier.is_none()
            && self.start_date.is_none()
            && self.append_note.is_none()
    }

    /// Human labels for the fields this edit touches, in record order.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.commission_tier.is_some() {
            fields.push("commission tier");
        }
        if self.start_date.is_some() {
            fields.push("start date");
        }
        if self.append_note.is_some() {
            fields.push("note");
        }
        fields
    }

    pub fn apply_to(&self, employee: &mut Employee, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            employee.name = name.clone();
        }
        if let Some(tier) = self.commission_tier {
            employee.commission_tier = Some(tier);
        }
        if let Some(start_date) = self.start_date {
            employee.start_date = start_date;
        }
        if let Some(text) = &self.append_note {
            employee.notes.push(NoteEntry { noted_at: now, text: text.clone() });
        }
        employee.updated_at = now;
    }
}
