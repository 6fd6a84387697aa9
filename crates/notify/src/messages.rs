use serde_json::{json, Value};

use rosterly_core::ports::{ChangeNotification, CommitSummary, SummaryChannel};

use crate::blocks::{MessageBuilder, MessageTemplate};

/// Slack rendering of a single committed roster change.
pub fn change_message(notification: &ChangeNotification) -> MessageTemplate {
    let kind = notification.kind.label();
    let site = notification.site.label();
    let employee = &notification.employee;

    let mut detail =
        format!("*{}*, {}\n{}", employee.name, employee.role.label(), notification.description);
    if let Some(manager_name) = &employee.manager_name {
        detail.push_str(&format!("\nReports to {manager_name}"));
    }

    MessageBuilder::new(format!("{kind}: {} at {site}", employee.name))
        .section("roster.change.header.v1", |section| {
            section.mrkdwn(format!("*{kind}* at {site}"));
        })
        .section("roster.change.detail.v1", |section| {
            section.mrkdwn(detail);
        })
        .context("roster.change.context.v1", |context| {
            context.plain(format!("Employee {}", employee.employee_id));
        })
        .build()
}

/// Slack rendering of the end-of-commit summary.
pub fn summary_message(summary: &CommitSummary) -> MessageTemplate {
    let committed = summary.committed_at.format("%Y-%m-%d %H:%M UTC");
    let builder = MessageBuilder::new("Roster commit summary")
        .section("roster.summary.header.v1", |section| {
            section.mrkdwn(format!("*Roster commit summary*\n{committed}"));
        });

    let builder = if summary.lines.is_empty() {
        builder.section("roster.summary.lines.v1", |section| {
            section.plain("No changes were applied.");
        })
    } else {
        let lines =
            summary.lines.iter().map(|line| format!("• {line}")).collect::<Vec<_>>().join("\n");
        builder.section("roster.summary.lines.v1", |section| {
            section.mrkdwn(lines);
        })
    };

    builder
        .context("roster.summary.context.v1", |context| {
            context.plain(format!("Changes applied: {}", summary.total_changes));
        })
        .build()
}

/// Flat payload for the n8n workflow route. The workflow owns routing
/// and templating on its side, so this stays a plain field bag.
pub fn change_workflow_payload(notification: &ChangeNotification) -> Value {
    let employee = &notification.employee;
    json!({
        "event": "roster.change",
        "kind": notification.kind.as_str(),
        "employee_id": employee.employee_id.0,
        "employee_name": employee.name,
        "role": employee.role.as_str(),
        "site": notification.site.as_str(),
        "manager_id": employee.manager_id.as_ref().map(|id| id.0.as_str()),
        "manager_name": employee.manager_name,
        "description": notification.description,
    })
}

pub fn summary_workflow_payload(summary: &CommitSummary, channel: SummaryChannel) -> Value {
    json!({
        "event": "roster.summary",
        "channel": channel.as_str(),
        "total_changes": summary.total_changes,
        "lines": summary.lines,
        "committed_at": summary.committed_at.to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use rosterly_core::domain::employee::{EmployeeId, Site};
    use rosterly_core::domain::role::Role;
    use rosterly_core::ledger::ChangeKind;
    use rosterly_core::ports::{ChangeNotification, CommitSummary, EmployeeSummary, SummaryChannel};

    use crate::blocks::{Block, TextObject};

    use super::{
        change_message, change_workflow_payload, summary_message, summary_workflow_payload,
    };

    fn notification(manager_name: Option<&str>) -> ChangeNotification {
        ChangeNotification {
            kind: ChangeKind::Promote,
            employee: EmployeeSummary {
                employee_id: EmployeeId("emp-7".to_string()),
                name: "Sam Okafor".to_string(),
                role: Role::Agent,
                site: Site::Riverton,
                manager_id: manager_name.map(|_| EmployeeId("emp-lead-1".to_string())),
                manager_name: manager_name.map(String::from),
            },
            description: "moved to the veteran commission plan".to_string(),
            site: Site::Riverton,
        }
    }

    #[test]
    fn change_message_renders_detail_and_manager_line() {
        let message = change_message(&notification(Some("Casey Fox")));

        assert_eq!(message.fallback_text, "Promote: Sam Okafor at Riverton");
        let detail = match &message.blocks[1] {
            Block::Section { text: TextObject::Mrkdwn { text }, .. } => text,
            other => panic!("expected markdown detail section, got {other:?}"),
        };
        assert!(detail.contains("*Sam Okafor*, Agent"));
        assert!(detail.contains("moved to the veteran commission plan"));
        assert!(detail.contains("Reports to Casey Fox"));
    }

    #[test]
    fn change_message_without_manager_skips_the_reports_line() {
        let message = change_message(&notification(None));

        let detail = match &message.blocks[1] {
            Block::Section { text: TextObject::Mrkdwn { text }, .. } => text,
            other => panic!("expected markdown detail section, got {other:?}"),
        };
        assert!(!detail.contains("Reports to"));
    }

    #[test]
    fn summary_message_renders_bulleted_lines() {
        let summary = CommitSummary {
            total_changes: 2,
            lines: vec![
                "Promote: Sam Okafor (moved to the veteran plan)".to_string(),
                "Transfer: Riley Chen (moved to Fairview)".to_string(),
            ],
            committed_at: Utc::now(),
        };

        let message = summary_message(&summary);
        let lines = match &message.blocks[1] {
            Block::Section { text: TextObject::Mrkdwn { text }, .. } => text,
            other => panic!("expected markdown lines section, got {other:?}"),
        };
        assert_eq!(lines.matches('•').count(), 2);
        assert!(lines.contains("Transfer: Riley Chen"));
    }

    #[test]
    fn summary_message_with_no_lines_says_so() {
        let summary =
            CommitSummary { total_changes: 0, lines: Vec::new(), committed_at: Utc::now() };

        let message = summary_message(&summary);
        assert!(matches!(
            &message.blocks[1],
            Block::Section { text: TextObject::Plain { text }, .. }
                if text == "No changes were applied."
        ));
    }

    #[test]
    fn change_workflow_payload_is_a_flat_field_bag() {
        let payload = change_workflow_payload(&notification(Some("Casey Fox")));

        assert_eq!(payload["event"], json!("roster.change"));
        assert_eq!(payload["kind"], json!("promote"));
        assert_eq!(payload["employee_id"], json!("emp-7"));
        assert_eq!(payload["role"], json!("agent"));
        assert_eq!(payload["site"], json!("riverton"));
        assert_eq!(payload["manager_name"], json!("Casey Fox"));
    }

    #[test]
    fn summary_workflow_payload_carries_the_channel() {
        let summary = CommitSummary {
            total_changes: 1,
            lines: vec!["Move: Jordan Ellis (now reports to Casey Fox)".to_string()],
            committed_at: Utc::now(),
        };

        let payload = summary_workflow_payload(&summary, SummaryChannel::Email);

        assert_eq!(payload["event"], json!("roster.summary"));
        assert_eq!(payload["channel"], json!("email"));
        assert_eq!(payload["total_changes"], json!(1));
        assert_eq!(payload["lines"].as_array().map(Vec::len), Some(1));
    }
}
