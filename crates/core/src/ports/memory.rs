use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::domain::employee::{Employee, EmployeeEdit, EmployeeId, EmployeeStatus, NewEmployee};

use super::{
    ChangeNotification, ChangeNotifier, CommitSummary, EmployeeStore, NotifyError, NotifyRoutes,
    StagingError, StagingStore, StoreError, SummaryChannel,
};

/// Employee store backed by a map, with per-employee update-failure
/// injection for exercising partial commits.
#[derive(Default)]
pub struct InMemoryEmployeeStore {
    employees: RwLock<HashMap<String, Employee>>,
    applied_updates: RwLock<Vec<(EmployeeId, EmployeeEdit)>>,
    failing_updates: RwLock<HashSet<String>>,
    created: AtomicUsize,
}

impl InMemoryEmployeeStore {
    pub async fn insert(&self, employee: Employee) {
        let mut employees = self.employees.write().await;
        employees.insert(employee.id.0.clone(), employee);
    }

    /// Makes every subsequent update for `id` fail with a transport
    /// error.
    pub async fn fail_updates_for(&self, id: &EmployeeId) {
        let mut failing = self.failing_updates.write().await;
        failing.insert(id.0.clone());
    }

    pub async fn applied_updates(&self) -> Vec<(EmployeeId, EmployeeEdit)> {
        self.applied_updates.read().await.clone()
    }
}

#[async_trait::async_trait]
impl EmployeeStore for InMemoryEmployeeStore {
    async fn get_employee(&self, id: &EmployeeId) -> Result<Option<Employee>, StoreError> {
        let employees = self.employees.read().await;
        Ok(employees.get(&id.0).cloned())
    }

    async fn create_employee(&self, employee: NewEmployee) -> Result<EmployeeId, StoreError> {
        let sequence = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let id = EmployeeId(format!("emp-{sequence}"));
        let now = Utc::now();
        let record = Employee {
            id: id.clone(),
            name: employee.name,
            role: employee.role,
            site: employee.site,
            manager_id: employee.manager_id,
            status: EmployeeStatus::Active,
            commission_tier: employee.commission_tier,
            start_date: employee.start_date,
            termination: None,
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let mut employees = self.employees.write().await;
        employees.insert(id.0.clone(), record);
        Ok(id)
    }

    async fn update_employee(
        &self,
        id: &EmployeeId,
        edit: &EmployeeEdit,
    ) -> Result<(), StoreError> {
        {
            let failing = self.failing_updates.read().await;
            if failing.contains(&id.0) {
                return Err(StoreError::Transport(format!(
                    "injected update failure for `{}`",
                    id.0
                )));
            }
        }

        let mut employees = self.employees.write().await;
        let Some(employee) = employees.get_mut(&id.0) else {
            return Err(StoreError::NotFound { employee_id: id.0.clone() });
        };
        edit.apply_to(employee, Utc::now());
        drop(employees);

        let mut applied = self.applied_updates.write().await;
        applied.push((id.clone(), edit.clone()));
        Ok(())
    }
}

/// Notifier that records every call, with per-employee-name failure
/// injection for `notify_change`.
#[derive(Default)]
pub struct RecordingNotifier {
    changes: RwLock<Vec<(ChangeNotification, NotifyRoutes)>>,
    summaries: RwLock<Vec<(CommitSummary, SummaryChannel)>>,
    failing_names: RwLock<HashSet<String>>,
}

impl RecordingNotifier {
    pub async fn fail_for_employee(&self, name: &str) {
        let mut failing = self.failing_names.write().await;
        failing.insert(name.to_string());
    }

    pub async fn change_calls(&self) -> Vec<(ChangeNotification, NotifyRoutes)> {
        self.changes.read().await.clone()
    }

    pub async fn summary_calls(&self) -> Vec<(CommitSummary, SummaryChannel)> {
        self.summaries.read().await.clone()
    }
}

#[async_trait::async_trait]
impl ChangeNotifier for RecordingNotifier {
    async fn notify_change(
        &self,
        notification: &ChangeNotification,
        routes: NotifyRoutes,
    ) -> Result<(), NotifyError> {
        {
            let failing = self.failing_names.read().await;
            if failing.contains(&notification.employee.name) {
                return Err(NotifyError::Transport(format!(
                    "injected notify failure for `{}`",
                    notification.employee.name
                )));
            }
        }

        let mut changes = self.changes.write().await;
        changes.push((notification.clone(), routes));
        Ok(())
    }

    async fn send_summary(
        &self,
        summary: &CommitSummary,
        channel: SummaryChannel,
    ) -> Result<(), NotifyError> {
        let mut summaries = self.summaries.write().await;
        summaries.push((summary.clone(), channel));
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryStagingStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl StagingStore for InMemoryStagingStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StagingError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StagingError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StagingError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}
