use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::NotificationsConfig;
use crate::ledger::{PendingChange, PendingChangeLedger, StagedEdit};
use crate::ports::{
    ChangeNotification, ChangeNotifier, CommitSummary, EmployeeStore, EmployeeSummary,
    NotifyRoutes, SummaryChannel,
};

/// Routing and summary switches for one commit pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NotificationPrefs {
    pub routes: NotifyRoutes,
    pub slack_summary: bool,
    pub email_summary: bool,
}

impl From<&NotificationsConfig> for NotificationPrefs {
    fn from(config: &NotificationsConfig) -> Self {
        Self {
            routes: NotifyRoutes { n8n: config.notify_n8n, slack: config.notify_slack },
            slack_summary: config.slack_summary,
            email_summary: config.email_summary,
        }
    }
}

/// A commit item that did not go through, carried whole so the caller
/// can re-stage it verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum CommitFailure {
    EditNotApplied { edit: StagedEdit, error: String },
    ChangeNotNotified { change: PendingChange, error: String },
    SummaryNotSent { channel: SummaryChannel, error: String },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitReport {
    pub edits_applied: usize,
    pub changes_notified: usize,
    pub failures: Vec<CommitFailure>,
}

impl CommitReport {
    pub fn applied_total(&self) -> usize {
        self.edits_applied + self.changes_notified
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drains a ledger into the employee store and notification routes.
///
/// The pass is not transactional: each item either lands or is carried
/// in the report as a failure, and the ledger is emptied either way.
pub struct ChangeCommitCoordinator<S, N> {
    store: S,
    notifier: N,
}

impl<S, N> ChangeCommitCoordinator<S, N>
where
    S: EmployeeStore,
    N: ChangeNotifier,
{
    pub fn new(store: S, notifier: N) -> Self {
        Self { store, notifier }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub async fn commit_all(
        &self,
        ledger: &mut PendingChangeLedger,
        prefs: &NotificationPrefs,
    ) -> CommitReport {
        let mut report = CommitReport::default();

        if !ledger.has_unsaved() {
            return report;
        }

        let mut summary_lines = Vec::new();

        for staged in ledger.staged_edits().to_vec() {
            let entry = staged.as_pending_change();
            match self.store.update_employee(&staged.employee_id, &staged.edit).await {
                Ok(()) => {
                    report.edits_applied += 1;
                    summary_lines.push(format!(
                        "{}: {} ({})",
                        entry.kind, entry.employee_name, entry.description
                    ));
                }
                Err(error) => {
                    tracing::warn!(
                        event_name = "commit.edit_failed",
                        employee_id = %staged.employee_id,
                        error = %error,
                        "staged edit was not applied"
                    );
                    report.failures.push(CommitFailure::EditNotApplied {
                        edit: staged,
                        error: error.to_string(),
                    });
                }
            }
        }
        ledger.clear_edits();

        for change in ledger.changes().to_vec() {
            match self.resolve_employee(&change).await {
                Ok(employee) => {
                    let notification = ChangeNotification {
                        kind: change.kind,
                        site: employee.site,
                        employee,
                        description: change.description.clone(),
                    };

                    match self.notifier.notify_change(&notification, prefs.routes).await {
                        Ok(()) => {
                            report.changes_notified += 1;
                            summary_lines.push(format!(
                                "{}: {} ({})",
                                change.kind, change.employee_name, change.description
                            ));
                        }
                        Err(error) => {
                            tracing::warn!(
                                event_name = "commit.notify_failed",
                                employee_id = %change.employee_id,
                                change_kind = change.kind.as_str(),
                                error = %error,
                                "change notification was not delivered"
                            );
                            report.failures.push(CommitFailure::ChangeNotNotified {
                                change,
                                error: error.to_string(),
                            });
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(
                        event_name = "commit.resolve_failed",
                        employee_id = %change.employee_id,
                        change_kind = change.kind.as_str(),
                        error = %error,
                        "employee for staged change could not be resolved"
                    );
                    report.failures.push(CommitFailure::ChangeNotNotified { change, error });
                }
            }
        }

        let summary = CommitSummary {
            total_changes: report.applied_total(),
            lines: summary_lines,
            committed_at: Utc::now(),
        };

        if prefs.slack_summary {
            self.send_summary(&summary, SummaryChannel::Slack, &mut report).await;
        }
        if prefs.email_summary {
            self.send_summary(&summary, SummaryChannel::Email, &mut report).await;
        }

        ledger.clear_changes();
        report
    }

    async fn send_summary(
        &self,
        summary: &CommitSummary,
        channel: SummaryChannel,
        report: &mut CommitReport,
    ) {
        if let Err(error) = self.notifier.send_summary(summary, channel).await {
            tracing::warn!(
                event_name = "commit.summary_failed",
                channel = channel.as_str(),
                error = %error,
                "bulk summary was not delivered"
            );
            report.failures.push(CommitFailure::SummaryNotSent {
                channel,
                error: error.to_string(),
            });
        }
    }

    /// Fresh snapshot of the changed employee. The manager lookup is
    /// best-effort; a missing or unreadable manager leaves the name
    /// blank rather than failing the notification.
    async fn resolve_employee(&self, change: &PendingChange) -> Result<EmployeeSummary, String> {
        let employee = match self.store.get_employee(&change.employee_id).await {
            Ok(Some(employee)) => employee,
            Ok(None) => return Err(format!("employee `{}` was not found", change.employee_id)),
            Err(error) => return Err(error.to_string()),
        };

        let manager_name = match &employee.manager_id {
            Some(manager_id) => match self.store.get_employee(manager_id).await {
                Ok(Some(manager)) => Some(manager.name),
                Ok(None) | Err(_) => None,
            },
            None => None,
        };

        Ok(EmployeeSummary {
            employee_id: employee.id,
            name: employee.name,
            role: employee.role,
            site: employee.site,
            manager_id: employee.manager_id,
            manager_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::domain::employee::{
        CommissionTier, Employee, EmployeeEdit, EmployeeId, EmployeeStatus, Site,
    };
    use crate::domain::role::Role;
    use crate::ledger::{ChangeKind, PendingChangeLedger};
    use crate::ports::{InMemoryEmployeeStore, NotifyRoutes, RecordingNotifier, SummaryChannel};

    use super::{ChangeCommitCoordinator, CommitFailure, NotificationPrefs};

    fn employee(id: &str, name: &str, role: Role, manager: Option<&str>) -> Employee {
        let now = Utc::now();
        Employee {
            id: EmployeeId(id.to_string()),
            name: name.to_string(),
            role,
            site: Site::Riverton,
            manager_id: manager.map(|m| EmployeeId(m.to_string())),
            status: EmployeeStatus::Active,
            commission_tier: None,
            start_date: now - Duration::days(200),
            termination: None,
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn all_routes() -> NotificationPrefs {
        NotificationPrefs {
            routes: NotifyRoutes { n8n: true, slack: true },
            slack_summary: true,
            email_summary: false,
        }
    }

    async fn seeded_coordinator(
    ) -> ChangeCommitCoordinator<InMemoryEmployeeStore, RecordingNotifier> {
        let store = InMemoryEmployeeStore::default();
        store.insert(employee("emp-lead", "Casey Fox", Role::TeamLead, None)).await;
        store.insert(employee("emp-1", "Jordan Ellis", Role::Agent, Some("emp-lead"))).await;
        store.insert(employee("emp-2", "Sam Okafor", Role::Agent, Some("emp-lead"))).await;
        store.insert(employee("emp-3", "Riley Chen", Role::Agent, Some("emp-lead"))).await;
        ChangeCommitCoordinator::new(store, RecordingNotifier::default())
    }

    #[tokio::test]
    async fn committing_an_empty_ledger_is_a_no_op() {
        let coordinator = seeded_coordinator().await;
        let mut ledger = PendingChangeLedger::new();

        let report = coordinator.commit_all(&mut ledger, &all_routes()).await;

        assert_eq!(report.applied_total(), 0);
        assert!(report.is_clean());
        assert!(coordinator.notifier().change_calls().await.is_empty());
        assert!(coordinator.notifier().summary_calls().await.is_empty());
    }

    #[tokio::test]
    async fn restaged_edits_reach_the_store_exactly_once() {
        let coordinator = seeded_coordinator().await;
        let mut ledger = PendingChangeLedger::new();

        ledger.stage_edit(
            EmployeeId("emp-1".to_string()),
            "Jordan Ellis",
            EmployeeEdit { append_note: Some("first".to_string()), ..Default::default() },
        );
        ledger.stage_edit(
            EmployeeId("emp-1".to_string()),
            "Jordan Ellis",
            EmployeeEdit {
                commission_tier: Some(CommissionTier::Veteran),
                ..Default::default()
            },
        );

        let report = coordinator.commit_all(&mut ledger, &all_routes()).await;

        assert_eq!(report.edits_applied, 1);
        let applied = coordinator.store().applied_updates().await;
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].1.commission_tier, Some(CommissionTier::Veteran));
        assert_eq!(applied[0].1.append_note, None);
        assert_eq!(ledger.count(), 0);
    }

    #[tokio::test]
    async fn a_failed_notification_does_not_stop_the_batch() {
        let coordinator = seeded_coordinator().await;
        coordinator.notifier().fail_for_employee("Sam Okafor").await;
        let mut ledger = PendingChangeLedger::new();

        for (id, name) in
            [("emp-1", "Jordan Ellis"), ("emp-2", "Sam Okafor"), ("emp-3", "Riley Chen")]
        {
            ledger.stage(
                ChangeKind::Move,
                EmployeeId(id.to_string()),
                name,
                "now reports to Casey Fox",
            );
        }

        let report = coordinator.commit_all(&mut ledger, &all_routes()).await;

        assert_eq!(report.changes_notified, 2);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            &report.failures[0],
            CommitFailure::ChangeNotNotified { change, .. } if change.employee_name == "Sam Okafor"
        ));
        assert_eq!(ledger.count(), 0);
    }

    #[tokio::test]
    async fn a_failed_edit_does_not_stop_other_edits() {
        let coordinator = seeded_coordinator().await;
        coordinator.store().fail_updates_for(&EmployeeId("emp-1".to_string())).await;
        let mut ledger = PendingChangeLedger::new();

        ledger.stage_edit(
            EmployeeId("emp-1".to_string()),
            "Jordan Ellis",
            EmployeeEdit { append_note: Some("blocked".to_string()), ..Default::default() },
        );
        ledger.stage_edit(
            EmployeeId("emp-2".to_string()),
            "Sam Okafor",
            EmployeeEdit { append_note: Some("fine".to_string()), ..Default::default() },
        );

        let report = coordinator.commit_all(&mut ledger, &all_routes()).await;

        assert_eq!(report.edits_applied, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(matches!(
            &report.failures[0],
            CommitFailure::EditNotApplied { edit, .. } if edit.employee_id.0 == "emp-1"
        ));
        let applied = coordinator.store().applied_updates().await;
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].0 .0, "emp-2");
    }

    #[tokio::test]
    async fn notifications_carry_the_resolved_manager() {
        let coordinator = seeded_coordinator().await;
        let mut ledger = PendingChangeLedger::new();

        ledger.stage(
            ChangeKind::Promote,
            EmployeeId("emp-1".to_string()),
            "Jordan Ellis",
            "promoted to team lead",
        );

        coordinator.commit_all(&mut ledger, &all_routes()).await;

        let calls = coordinator.notifier().change_calls().await;
        assert_eq!(calls.len(), 1);
        let (notification, routes) = &calls[0];
        assert_eq!(notification.employee.manager_name.as_deref(), Some("Casey Fox"));
        assert_eq!(notification.employee.role, Role::Agent);
        assert!(routes.slack && routes.n8n);
    }

    #[tokio::test]
    async fn unresolvable_changes_are_reported_without_a_notify_call() {
        let coordinator = seeded_coordinator().await;
        let mut ledger = PendingChangeLedger::new();

        ledger.stage(
            ChangeKind::Terminate,
            EmployeeId("emp-404".to_string()),
            "Nobody Real",
            "terminated",
        );

        let report = coordinator.commit_all(&mut ledger, &all_routes()).await;

        assert_eq!(report.changes_notified, 0);
        assert_eq!(report.failures.len(), 1);
        assert!(coordinator.notifier().change_calls().await.is_empty());
    }

    #[tokio::test]
    async fn summaries_go_once_per_enabled_channel() {
        let coordinator = seeded_coordinator().await;
        let mut ledger = PendingChangeLedger::new();
        ledger.stage(
            ChangeKind::Move,
            EmployeeId("emp-1".to_string()),
            "Jordan Ellis",
            "now reports to Casey Fox",
        );

        let prefs = NotificationPrefs {
            routes: NotifyRoutes { n8n: false, slack: true },
            slack_summary: true,
            email_summary: true,
        };
        coordinator.commit_all(&mut ledger, &prefs).await;

        let summaries = coordinator.notifier().summary_calls().await;
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].1, SummaryChannel::Slack);
        assert_eq!(summaries[1].1, SummaryChannel::Email);

        // Built after the per-change pass: it already counts the move.
        assert_eq!(summaries[0].0.total_changes, 1);
        assert!(summaries[0].0.lines[0].contains("Jordan Ellis"));
    }

    #[tokio::test]
    async fn disabled_summaries_are_skipped() {
        let coordinator = seeded_coordinator().await;
        let mut ledger = PendingChangeLedger::new();
        ledger.stage_edit(
            EmployeeId("emp-1".to_string()),
            "Jordan Ellis",
            EmployeeEdit { append_note: Some("note".to_string()), ..Default::default() },
        );

        let prefs = NotificationPrefs::default();
        let report = coordinator.commit_all(&mut ledger, &prefs).await;

        assert_eq!(report.edits_applied, 1);
        assert!(coordinator.notifier().summary_calls().await.is_empty());
    }
}
