use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::employee::{Employee, EmployeeEdit, EmployeeId, NewEmployee, Site};
use crate::domain::role::Role;
use crate::ledger::ChangeKind;

pub mod memory;

pub use memory::{InMemoryEmployeeStore, InMemoryStagingStore, RecordingNotifier};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("employee `{employee_id}` was not found")]
    NotFound { employee_id: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Source of truth for employee records. The engine only mutates
/// through this port; reads back out of it are always fresh.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn get_employee(&self, id: &EmployeeId) -> Result<Option<Employee>, StoreError>;

    async fn create_employee(&self, employee: NewEmployee) -> Result<EmployeeId, StoreError>;

    async fn update_employee(
        &self,
        id: &EmployeeId,
        edit: &EmployeeEdit,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport error: {0}")]
    Transport(String),
    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Which outbound routes a single change notification should take.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyRoutes {
    pub n8n: bool,
    pub slack: bool,
}

/// Snapshot of an employee at notification time, with the manager
/// resolved best-effort.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSummary {
    pub employee_id: EmployeeId,
    pub name: String,
    pub role: Role,
    pub site: Site,
    pub manager_id: Option<EmployeeId>,
    pub manager_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub kind: ChangeKind,
    pub employee: EmployeeSummary,
    pub description: String,
    pub site: Site,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub total_changes: usize,
    pub lines: Vec<String>,
    pub committed_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryChannel {
    Slack,
    Email,
}

impl SummaryChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slack => "slack",
            Self::Email => "email",
        }
    }
}

#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    async fn notify_change(
        &self,
        notification: &ChangeNotification,
        routes: NotifyRoutes,
    ) -> Result<(), NotifyError>;

    async fn send_summary(
        &self,
        summary: &CommitSummary,
        channel: SummaryChannel,
    ) -> Result<(), NotifyError>;
}

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("staging io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("staging serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("staging document is malformed: {0}")]
    Malformed(String),
}

/// Small synchronous key-value surface for durable staging state.
pub trait StagingStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StagingError>;

    fn set(&self, key: &str, value: Value) -> Result<(), StagingError>;

    fn remove(&self, key: &str) -> Result<(), StagingError>;
}
