use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::employee::{EmployeeEdit, EmployeeId};
use crate::ports::StagingStore;

/// Key under which the staged-edit map is persisted.
pub const STAGED_EDITS_KEY: &str = "staged_edits";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeId(pub String);

impl ChangeId {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Move,
    Promote,
    Transfer,
    Terminate,
    Create,
    Edit,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Promote => "promote",
            Self::Transfer => "transfer",
            Self::Terminate => "terminate",
            Self::Create => "create",
            Self::Edit => "edit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "move" => Some(Self::Move),
            "promote" => Some(Self::Promote),
            "transfer" => Some(Self::Transfer),
            "terminate" => Some(Self::Terminate),
            "create" => Some(Self::Create),
            "edit" => Some(Self::Edit),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Move => "Move",
            Self::Promote => "Promote",
            Self::Transfer => "Transfer",
            Self::Terminate => "Terminate",
            Self::Create => "Create",
            Self::Edit => "Edit",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One staged discrete change. Immutable once staged; superseding a
/// change means staging another one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingChange {
    pub id: ChangeId,
    pub kind: ChangeKind,
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub description: String,
    pub staged_at: DateTime<Utc>,
}

/// One staged record edit. At most one exists per employee; restaging
/// replaces the payload in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StagedEdit {
    pub id: ChangeId,
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub edit: EmployeeEdit,
    pub staged_at: DateTime<Utc>,
}

impl StagedEdit {
    /// Presents this edit as a discrete ledger entry.
    pub fn as_pending_change(&self) -> PendingChange {
        PendingChange {
            id: self.id.clone(),
            kind: ChangeKind::Edit,
            employee_id: self.employee_id.clone(),
            employee_name: self.employee_name.clone(),
            description: describe_edit(&self.edit),
            staged_at: self.staged_at,
        }
    }
}

fn describe_edit(edit: &EmployeeEdit) -> String {
    let fields = edit.changed_fields();
    if fields.is_empty() {
        return "no field changes".to_string();
    }

    format!("updated {}", fields.join(", "))
}

/// Session-scoped collection of staged work: discrete changes in
/// arrival order plus a last-write-wins edit per employee.
///
/// When built with a staging store, the edit map (and only the edit
/// map) is persisted after every mutation. Persistence is best-effort;
/// a failing store is logged and never fails the staging call.
#[derive(Default)]
pub struct PendingChangeLedger {
    changes: Vec<PendingChange>,
    edits: Vec<StagedEdit>,
    staging: Option<Arc<dyn StagingStore>>,
}

impl PendingChangeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger that persists staged edits through `staging`,
    /// hydrating any edits a previous session left behind.
    pub fn with_staging(staging: Arc<dyn StagingStore>) -> Self {
        let mut ledger = Self::new();

        match staging.get(STAGED_EDITS_KEY) {
            Ok(Some(value)) => match serde_json::from_value::<Vec<StagedEdit>>(value) {
                Ok(edits) => ledger.edits = edits,
                Err(error) => {
                    tracing::warn!(
                        event_name = "ledger.staging_decode_failed",
                        error = %error,
                        "discarding undecodable staged edits"
                    );
                }
            },
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(
                    event_name = "ledger.staging_read_failed",
                    error = %error,
                    "continuing without persisted staged edits"
                );
            }
        }

        ledger.staging = Some(staging);
        ledger
    }

    /// Stages a discrete change and returns its id. Duplicates are
    /// accepted; the ledger records intent, not a diff.
    pub fn stage(
        &mut self,
        kind: ChangeKind,
        employee_id: EmployeeId,
        employee_name: impl Into<String>,
        description: impl Into<String>,
    ) -> ChangeId {
        let id = ChangeId::generate();
        self.changes.push(PendingChange {
            id: id.clone(),
            kind,
            employee_id,
            employee_name: employee_name.into(),
            description: description.into(),
            staged_at: Utc::now(),
        });
        id
    }

    /// Stages a record edit. A second edit for the same employee
    /// replaces the first but keeps its position in the ordering.
    pub fn stage_edit(
        &mut self,
        employee_id: EmployeeId,
        employee_name: impl Into<String>,
        edit: EmployeeEdit,
    ) -> ChangeId {
        let id = ChangeId::generate();
        let staged = StagedEdit {
            id: id.clone(),
            employee_id: employee_id.clone(),
            employee_name: employee_name.into(),
            edit,
            staged_at: Utc::now(),
        };

        match self.edits.iter_mut().find(|existing| existing.employee_id == employee_id) {
            Some(existing) => *existing = staged,
            None => self.edits.push(staged),
        }

        self.persist_edits();
        id
    }

    pub fn count(&self) -> usize {
        self.changes.len() + self.edits.len()
    }

    pub fn has_unsaved(&self) -> bool {
        self.count() > 0
    }

    pub fn changes(&self) -> &[PendingChange] {
        &self.changes
    }

    pub fn staged_edits(&self) -> &[StagedEdit] {
        &self.edits
    }

    /// Everything staged, discrete changes first in arrival order, then
    /// edits presented as synthesized `Edit` entries.
    pub fn all(&self) -> Vec<PendingChange> {
        let mut entries = self.changes.clone();
        entries.extend(self.edits.iter().map(StagedEdit::as_pending_change));
        entries
    }

    /// Drops everything staged. Safe to call on an empty ledger.
    pub fn discard(&mut self) {
        self.changes.clear();
        self.edits.clear();
        self.persist_edits();
    }

    pub(crate) fn clear_edits(&mut self) {
        self.edits.clear();
        self.persist_edits();
    }

    pub(crate) fn clear_changes(&mut self) {
        self.changes.clear();
    }

    fn persist_edits(&self) {
        let Some(staging) = &self.staging else {
            return;
        };

        let result = if self.edits.is_empty() {
            staging.remove(STAGED_EDITS_KEY)
        } else {
            match serde_json::to_value(&self.edits) {
                Ok(value) => staging.set(STAGED_EDITS_KEY, value),
                Err(error) => {
                    tracing::warn!(
                        event_name = "ledger.staging_encode_failed",
                        error = %error,
                        "staged edits were not persisted"
                    );
                    return;
                }
            }
        };

        if let Err(error) = result {
            tracing::warn!(
                event_name = "ledger.staging_write_failed",
                error = %error,
                "staged edits were not persisted"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::domain::employee::{CommissionTier, EmployeeEdit, EmployeeId};
    use crate::ports::{InMemoryStagingStore, StagingStore};

    use super::{ChangeKind, PendingChangeLedger, STAGED_EDITS_KEY};

    fn edit_with_note(note: &str) -> EmployeeEdit {
        EmployeeEdit { append_note: Some(note.to_string()), ..Default::default() }
    }

    #[test]
    fn discrete_changes_accumulate_without_dedup() {
        let mut ledger = PendingChangeLedger::new();

        ledger.stage(
            ChangeKind::Move,
            EmployeeId("emp-1".to_string()),
            "Jordan Ellis",
            "now reports to Casey Fox",
        );
        ledger.stage(
            ChangeKind::Move,
            EmployeeId("emp-1".to_string()),
            "Jordan Ellis",
            "now reports to Casey Fox",
        );

        assert_eq!(ledger.count(), 2);
        assert!(ledger.has_unsaved());
    }

    #[test]
    fn restaged_edits_replace_in_place() {
        let mut ledger = PendingChangeLedger::new();

        ledger.stage_edit(EmployeeId("emp-1".to_string()), "Jordan Ellis", edit_with_note("one"));
        ledger.stage_edit(EmployeeId("emp-2".to_string()), "Sam Okafor", edit_with_note("two"));
        ledger.stage_edit(
            EmployeeId("emp-1".to_string()),
            "Jordan Ellis",
            EmployeeEdit {
                commission_tier: Some(CommissionTier::Veteran),
                ..Default::default()
            },
        );

        let edits = ledger.staged_edits();
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].employee_id.0, "emp-1");
        assert_eq!(edits[0].edit.commission_tier, Some(CommissionTier::Veteran));
        assert_eq!(edits[0].edit.append_note, None);
        assert_eq!(edits[1].employee_id.0, "emp-2");
    }

    #[test]
    fn all_lists_discrete_changes_before_synthesized_edits() {
        let mut ledger = PendingChangeLedger::new();

        ledger.stage_edit(EmployeeId("emp-2".to_string()), "Sam Okafor", edit_with_note("note"));
        ledger.stage(
            ChangeKind::Promote,
            EmployeeId("emp-1".to_string()),
            "Jordan Ellis",
            "promoted to team lead",
        );

        let entries = ledger.all();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, ChangeKind::Promote);
        assert_eq!(entries[1].kind, ChangeKind::Edit);
        assert_eq!(entries[1].description, "updated note");
    }

    #[test]
    fn discard_clears_everything_and_is_idempotent() {
        let mut ledger = PendingChangeLedger::new();
        ledger.stage(
            ChangeKind::Terminate,
            EmployeeId("emp-1".to_string()),
            "Taylor Brooks",
            "terminated",
        );
        ledger.stage_edit(EmployeeId("emp-2".to_string()), "Sam Okafor", edit_with_note("note"));

        ledger.discard();
        ledger.discard();

        assert_eq!(ledger.count(), 0);
        assert!(!ledger.has_unsaved());
        assert!(ledger.all().is_empty());
    }

    #[test]
    fn staged_edits_survive_a_new_session() {
        let staging = Arc::new(InMemoryStagingStore::default());

        let mut first = PendingChangeLedger::with_staging(staging.clone());
        first.stage_edit(EmployeeId("emp-1".to_string()), "Jordan Ellis", edit_with_note("hi"));
        drop(first);

        let second = PendingChangeLedger::with_staging(staging.clone());
        assert!(second.has_unsaved());
        assert_eq!(second.staged_edits().len(), 1);
        assert_eq!(second.staged_edits()[0].employee_name, "Jordan Ellis");
    }

    #[test]
    fn discard_removes_the_persisted_edit_map() {
        let staging = Arc::new(InMemoryStagingStore::default());

        let mut ledger = PendingChangeLedger::with_staging(staging.clone());
        ledger.stage_edit(EmployeeId("emp-1".to_string()), "Jordan Ellis", edit_with_note("hi"));
        assert!(staging.get(STAGED_EDITS_KEY).expect("get").is_some());

        ledger.discard();
        assert_eq!(staging.get(STAGED_EDITS_KEY).expect("get"), None);
    }

    #[test]
    fn discrete_changes_are_not_persisted() {
        let staging = Arc::new(InMemoryStagingStore::default());

        let mut ledger = PendingChangeLedger::with_staging(staging.clone());
        ledger.stage(
            ChangeKind::Move,
            EmployeeId("emp-1".to_string()),
            "Jordan Ellis",
            "now reports to Casey Fox",
        );

        assert_eq!(staging.get(STAGED_EDITS_KEY).expect("get"), None);

        let second = PendingChangeLedger::with_staging(staging);
        assert_eq!(second.count(), 0);
    }
}
