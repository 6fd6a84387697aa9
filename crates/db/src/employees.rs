use chrono::{DateTime, Utc};
use sqlx::Row;
use thiserror::Error;
use uuid::Uuid;

use rosterly_core::domain::employee::{
    CommissionTier, Employee, EmployeeEdit, EmployeeId, EmployeeStatus, NewEmployee, NoteEntry,
    Site, TerminationDetails,
};
use rosterly_core::domain::role::Role;
use rosterly_core::ports::{EmployeeStore, StoreError};

use crate::DbPool;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("encode error: {0}")]
    Encode(String),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<PersistenceError> for StoreError {
    fn from(error: PersistenceError) -> Self {
        match error {
            PersistenceError::Database(e) => StoreError::Transport(e.to_string()),
            PersistenceError::Encode(message) => StoreError::Transport(message),
            PersistenceError::Decode(message) => StoreError::Decode(message),
        }
    }
}

pub struct SqlEmployeeStore {
    pool: DbPool,
}

/// Timestamps are stored as RFC 3339 text. A row that fails to parse is
/// surfaced as a decode error rather than silently defaulted, because
/// tenure math depends on `start_date` being what was written.
fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, PersistenceError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| PersistenceError::Decode(format!("{field} `{value}`: {e}")))
}

fn row_to_employee(row: &sqlx::sqlite::SqliteRow) -> Result<Employee, PersistenceError> {
    let id: String = row.try_get("id").map_err(|e| PersistenceError::Decode(e.to_string()))?;
    let name: String = row.try_get("name").map_err(|e| PersistenceError::Decode(e.to_string()))?;
    let role_str: String =
        row.try_get("role").map_err(|e| PersistenceError::Decode(e.to_string()))?;
    let site_str: String =
        row.try_get("site").map_err(|e| PersistenceError::Decode(e.to_string()))?;
    let manager_id: Option<String> =
        row.try_get("manager_id").map_err(|e| PersistenceError::Decode(e.to_string()))?;
    let status_str: String =
        row.try_get("status").map_err(|e| PersistenceError::Decode(e.to_string()))?;
    let tier_str: Option<String> =
        row.try_get("commission_tier").map_err(|e| PersistenceError::Decode(e.to_string()))?;
    let start_date_str: String =
        row.try_get("start_date").map_err(|e| PersistenceError::Decode(e.to_string()))?;
    let termination_json: Option<String> =
        row.try_get("termination_json").map_err(|e| PersistenceError::Decode(e.to_string()))?;
    let notes_json: String =
        row.try_get("notes_json").map_err(|e| PersistenceError::Decode(e.to_string()))?;
    let created_at_str: String =
        row.try_get("created_at").map_err(|e| PersistenceError::Decode(e.to_string()))?;
    let updated_at_str: String =
        row.try_get("updated_at").map_err(|e| PersistenceError::Decode(e.to_string()))?;

    let role = Role::parse(&role_str)
        .ok_or_else(|| PersistenceError::Decode(format!("unknown role `{role_str}`")))?;
    let site = Site::parse(&site_str)
        .ok_or_else(|| PersistenceError::Decode(format!("unknown site `{site_str}`")))?;
    let status = EmployeeStatus::parse(&status_str)
        .ok_or_else(|| PersistenceError::Decode(format!("unknown status `{status_str}`")))?;
    let commission_tier = match tier_str {
        Some(s) => Some(CommissionTier::parse(&s).ok_or_else(|| {
            PersistenceError::Decode(format!("unknown commission tier `{s}`"))
        })?),
        None => None,
    };
    let termination: Option<TerminationDetails> = match termination_json {
        Some(json) => Some(
            serde_json::from_str(&json)
                .map_err(|e| PersistenceError::Decode(format!("termination details: {e}")))?,
        ),
        None => None,
    };
    let notes: Vec<NoteEntry> = serde_json::from_str(&notes_json)
        .map_err(|e| PersistenceError::Decode(format!("note entries: {e}")))?;

    Ok(Employee {
        id: EmployeeId(id),
        name,
        role,
        site,
        manager_id: manager_id.map(EmployeeId),
        status,
        commission_tier,
        start_date: parse_timestamp("start_date", &start_date_str)?,
        termination,
        notes,
        created_at: parse_timestamp("created_at", &created_at_str)?,
        updated_at: parse_timestamp("updated_at", &updated_at_str)?,
    })
}

impl SqlEmployeeStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>, PersistenceError> {
        let row = sqlx::query(
            "SELECT id, name, role, site, manager_id, status, commission_tier,
                    start_date, termination_json, notes_json, created_at, updated_at
             FROM employees WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_employee(r)?)),
            None => Ok(None),
        }
    }

    pub async fn save(&self, employee: &Employee) -> Result<(), PersistenceError> {
        let termination_json = match &employee.termination {
            Some(details) => Some(
                serde_json::to_string(details)
                    .map_err(|e| PersistenceError::Encode(format!("termination details: {e}")))?,
            ),
            None => None,
        };
        let notes_json = serde_json::to_string(&employee.notes)
            .map_err(|e| PersistenceError::Encode(format!("note entries: {e}")))?;

        sqlx::query(
            "INSERT INTO employees (id, name, role, site, manager_id, status, commission_tier,
                                    start_date, termination_json, notes_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 role = excluded.role,
                 site = excluded.site,
                 manager_id = excluded.manager_id,
                 status = excluded.status,
                 commission_tier = excluded.commission_tier,
                 start_date = excluded.start_date,
                 termination_json = excluded.termination_json,
                 notes_json = excluded.notes_json,
                 updated_at = excluded.updated_at",
        )
        .bind(&employee.id.0)
        .bind(&employee.name)
        .bind(employee.role.as_str())
        .bind(employee.site.as_str())
        .bind(employee.manager_id.as_ref().map(|id| id.0.as_str()))
        .bind(employee.status.as_str())
        .bind(employee.commission_tier.map(|tier| tier.as_str()))
        .bind(employee.start_date.to_rfc3339())
        .bind(&termination_json)
        .bind(&notes_json)
        .bind(employee.created_at.to_rfc3339())
        .bind(employee.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_active(&self) -> Result<Vec<Employee>, PersistenceError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, name, role, site, manager_id, status, commission_tier,
                    start_date, termination_json, notes_json, created_at, updated_at
             FROM employees WHERE status = 'active' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_employee).collect::<Result<Vec<_>, _>>()
    }
}

#[async_trait::async_trait]
impl EmployeeStore for SqlEmployeeStore {
    async fn get_employee(&self, id: &EmployeeId) -> Result<Option<Employee>, StoreError> {
        Ok(self.find_by_id(id).await?)
    }

    async fn create_employee(&self, employee: NewEmployee) -> Result<EmployeeId, StoreError> {
        let now = Utc::now();
        let record = Employee {
            id: EmployeeId(format!("emp-{}", Uuid::new_v4())),
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
        self.save(&record).await?;
        Ok(record.id)
    }

    async fn update_employee(
        &self,
        id: &EmployeeId,
        edit: &EmployeeEdit,
    ) -> Result<(), StoreError> {
        let mut employee = match self.find_by_id(id).await? {
            Some(employee) => employee,
            None => return Err(StoreError::NotFound { employee_id: id.0.clone() }),
        };
        edit.apply_to(&mut employee, Utc::now());
        self.save(&employee).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use rosterly_core::domain::employee::{
        CommissionTier, Employee, EmployeeEdit, EmployeeId, EmployeeStatus, NewEmployee, NoteEntry,
        Site, TerminationDetails,
    };
    use rosterly_core::domain::role::Role;
    use rosterly_core::ports::{EmployeeStore, StoreError};

    use super::SqlEmployeeStore;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn sample_employee(id: &str, name: &str) -> Employee {
        let now = Utc::now();
        Employee {
            id: EmployeeId(id.to_string()),
            name: name.to_string(),
            role: Role::Agent,
            site: Site::Riverton,
            manager_id: None,
            status: EmployeeStatus::Active,
            commission_tier: Some(CommissionTier::New),
            start_date: now - Duration::days(30),
            termination: None,
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn save_and_find_round_trips_nested_json() {
        let pool = setup().await;
        let store = SqlEmployeeStore::new(pool);

        let manager = sample_employee("emp-lead", "Casey Fox");
        store.save(&manager).await.expect("save manager");

        let now = Utc::now();
        let mut employee = sample_employee("emp-1", "Taylor Brooks");
        employee.manager_id = Some(manager.id.clone());
        employee.status = EmployeeStatus::Terminated;
        employee.termination = Some(TerminationDetails {
            reason: "resigned".to_string(),
            terminated_at: now,
            final_pay_date: Some(now + Duration::days(14)),
            document_refs: vec!["doc-offboarding-7".to_string()],
            severance: Some(Decimal::new(2_500, 0)),
        });
        employee.notes = vec![NoteEntry { noted_at: now, text: "exit interview done".to_string() }];

        store.save(&employee).await.expect("save");
        let found = store.find_by_id(&employee.id).await.expect("find").expect("should exist");

        assert_eq!(found, employee);
    }

    #[tokio::test]
    async fn save_upserts_and_preserves_created_at() {
        let pool = setup().await;
        let store = SqlEmployeeStore::new(pool);

        let employee = sample_employee("emp-1", "Jordan Ellis");
        store.save(&employee).await.expect("save");

        let mut renamed = employee.clone();
        renamed.name = "Jordan E. Ellis".to_string();
        renamed.commission_tier = Some(CommissionTier::Veteran);
        renamed.created_at = employee.created_at + Duration::days(5);
        renamed.updated_at = Utc::now();
        store.save(&renamed).await.expect("upsert");

        let found = store.find_by_id(&employee.id).await.expect("find").expect("should exist");
        assert_eq!(found.name, "Jordan E. Ellis");
        assert_eq!(found.commission_tier, Some(CommissionTier::Veteran));
        assert_eq!(found.created_at, employee.created_at);
    }

    #[tokio::test]
    async fn create_assigns_id_and_persists_active_row() {
        let pool = setup().await;
        let store = SqlEmployeeStore::new(pool);

        let id = store
            .create_employee(NewEmployee {
                name: "Riley Chen".to_string(),
                role: Role::Agent,
                site: Site::Fairview,
                manager_id: None,
                commission_tier: None,
                start_date: Utc::now() - Duration::days(180),
            })
            .await
            .expect("create");

        assert!(id.0.starts_with("emp-"));
        let found = store.find_by_id(&id).await.expect("find").expect("should exist");
        assert_eq!(found.name, "Riley Chen");
        assert_eq!(found.status, EmployeeStatus::Active);
        assert_eq!(found.commission_tier, None);
    }

    #[tokio::test]
    async fn update_applies_edit_and_appends_note() {
        let pool = setup().await;
        let store = SqlEmployeeStore::new(pool);

        let employee = sample_employee("emp-1", "Jordan Ellis");
        store.save(&employee).await.expect("save");

        let edit = EmployeeEdit {
            commission_tier: Some(CommissionTier::Veteran),
            append_note: Some("promoted early".to_string()),
            ..EmployeeEdit::default()
        };
        store.update_employee(&employee.id, &edit).await.expect("update");

        let found = store.find_by_id(&employee.id).await.expect("find").expect("should exist");
        assert_eq!(found.name, "Jordan Ellis");
        assert_eq!(found.commission_tier, Some(CommissionTier::Veteran));
        assert_eq!(found.start_date, employee.start_date);
        assert_eq!(found.notes.len(), 1);
        assert_eq!(found.notes[0].text, "promoted early");
    }

    #[tokio::test]
    async fn update_missing_employee_reports_not_found() {
        let pool = setup().await;
        let store = SqlEmployeeStore::new(pool);

        let edit = EmployeeEdit { name: Some("Nobody".to_string()), ..EmployeeEdit::default() };
        let error = store
            .update_employee(&EmployeeId("emp-404".to_string()), &edit)
            .await
            .expect_err("missing employee");

        assert!(matches!(error, StoreError::NotFound { employee_id } if employee_id == "emp-404"));
    }

    #[tokio::test]
    async fn list_active_skips_terminated_and_sorts_by_name() {
        let pool = setup().await;
        let store = SqlEmployeeStore::new(pool);

        store.save(&sample_employee("emp-1", "Priya Natarajan")).await.expect("save 1");
        store.save(&sample_employee("emp-2", "Alex Duarte")).await.expect("save 2");
        let mut former = sample_employee("emp-3", "Taylor Brooks");
        former.status = EmployeeStatus::Terminated;
        store.save(&former).await.expect("save 3");

        let active = store.list_active().await.expect("list");
        let names: Vec<&str> = active.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Alex Duarte", "Priya Natarajan"]);
    }
}
