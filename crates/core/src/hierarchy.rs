use serde::{Deserialize, Serialize};

use crate::domain::employee::Employee;
use crate::domain::role::Role;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoveDenial {
    SelfAssignment {
        employee_name: String,
    },
    DirectorReassignment {
        employee_name: String,
    },
    TerminatedParticipant {
        employee_name: String,
    },
    AlreadyAssigned {
        employee_name: String,
        manager_name: String,
    },
    RoleMismatch {
        subject_role: Role,
        target_role: Role,
    },
}

impl MoveDenial {
    fn reason(&self) -> String {
        match self {
            Self::SelfAssignment { employee_name } => {
                format!("`{employee_name}` cannot report to themselves")
            }
            Self::DirectorReassignment { employee_name } => {
                format!("`{employee_name}` is a director and cannot be moved")
            }
            Self::TerminatedParticipant { employee_name } => {
                format!("`{employee_name}` is terminated and cannot take part in a reassignment")
            }
            Self::AlreadyAssigned { employee_name, manager_name } => {
                format!("`{employee_name}` is already assigned to `{manager_name}`")
            }
            Self::RoleMismatch { subject_role, target_role } => {
                format!(
                    "a {subject_role} reporting to a {target_role} is not permitted by the reporting rules"
                )
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveValidation {
    pub allowed: bool,
    pub reason: String,
    pub denial: Option<MoveDenial>,
}

impl MoveValidation {
    fn allow(reason: impl Into<String>) -> Self {
        Self { allowed: true, reason: reason.into(), denial: None }
    }

    fn deny(denial: MoveDenial) -> Self {
        Self { allowed: false, reason: denial.reason(), denial: Some(denial) }
    }
}

/// Decides whether `subject` may be moved under `target`. Rules fire in
/// a fixed order so the denial a caller sees is always the earliest one
/// that applies.
pub fn validate_move(subject: &Employee, target: &Employee) -> MoveValidation {
    if subject.id == target.id {
        return MoveValidation::deny(MoveDenial::SelfAssignment {
            employee_name: subject.name.clone(),
        });
    }

    if subject.role == Role::Director {
        return MoveValidation::deny(MoveDenial::DirectorReassignment {
            employee_name: subject.name.clone(),
        });
    }

    if !subject.is_active() {
        return MoveValidation::deny(MoveDenial::TerminatedParticipant {
            employee_name: subject.name.clone(),
        });
    }

    if !target.is_active() {
        return MoveValidation::deny(MoveDenial::TerminatedParticipant {
            employee_name: target.name.clone(),
        });
    }

    if subject.role.parent_role() == Some(target.role) {
        if subject.manager_id.as_ref() == Some(&target.id) {
            return MoveValidation::deny(MoveDenial::AlreadyAssigned {
                employee_name: subject.name.clone(),
                manager_name: target.name.clone(),
            });
        }

        return MoveValidation::allow(format!(
            "`{}` can report to {} `{}`",
            subject.name,
            target.role.as_str(),
            target.name
        ));
    }

    MoveValidation::deny(MoveDenial::RoleMismatch {
        subject_role: subject.role,
        target_role: target.role,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::domain::employee::{Employee, EmployeeId, EmployeeStatus, Site};
    use crate::domain::role::Role;

    use super::{validate_move, MoveDenial};

    fn employee(id: &str, name: &str, role: Role) -> Employee {
        let now = Utc::now();
        Employee {
            id: EmployeeId(id.to_string()),
            name: name.to_string(),
            role,
            site: Site::Riverton,
            manager_id: None,
            status: EmployeeStatus::Active,
            commission_tier: None,
            start_date: now - Duration::days(90),
            termination: None,
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn agent_can_move_under_a_new_team_lead() {
        let agent = employee("emp-1", "Jordan Ellis", Role::Agent);
        let lead = employee("emp-2", "Casey Fox", Role::TeamLead);

        let validation = validate_move(&agent, &lead);

        assert!(validation.allowed);
        assert!(validation.denial.is_none());
        assert!(validation.reason.contains("Jordan Ellis"));
    }

    #[test]
    fn moves_cannot_skip_a_level() {
        let agent = employee("emp-1", "Jordan Ellis", Role::Agent);
        let manager = employee("emp-2", "Miguel Santos", Role::Manager);

        let validation = validate_move(&agent, &manager);

        assert!(!validation.allowed);
        assert!(matches!(
            validation.denial,
            Some(MoveDenial::RoleMismatch { subject_role: Role::Agent, target_role: Role::Manager })
        ));
    }

    #[test]
    fn peers_cannot_report_to_each_other() {
        let first = employee("emp-1", "Jordan Ellis", Role::Agent);
        let second = employee("emp-2", "Sam Okafor", Role::Agent);

        let validation = validate_move(&first, &second);

        assert!(!validation.allowed);
        assert!(matches!(validation.denial, Some(MoveDenial::RoleMismatch { .. })));
    }

    #[test]
    fn directors_are_never_reassigned() {
        let director = employee("emp-1", "Dana Whitfield", Role::Director);
        let manager = employee("emp-2", "Miguel Santos", Role::Manager);

        let validation = validate_move(&director, &manager);

        assert!(matches!(validation.denial, Some(MoveDenial::DirectorReassignment { .. })));
    }

    #[test]
    fn self_assignment_is_denied_before_any_other_rule() {
        let mut director = employee("emp-1", "Dana Whitfield", Role::Director);
        director.status = EmployeeStatus::Terminated;
        let same = director.clone();

        let validation = validate_move(&director, &same);

        assert!(matches!(validation.denial, Some(MoveDenial::SelfAssignment { .. })));
    }

    #[test]
    fn rejoining_the_current_manager_is_denied() {
        let lead = employee("emp-2", "Casey Fox", Role::TeamLead);
        let mut agent = employee("emp-1", "Jordan Ellis", Role::Agent);
        agent.manager_id = Some(lead.id.clone());

        let validation = validate_move(&agent, &lead);

        assert!(!validation.allowed);
        assert!(matches!(validation.denial, Some(MoveDenial::AlreadyAssigned { .. })));
        assert!(validation.reason.contains("already assigned"));
    }

    #[test]
    fn terminated_subjects_cannot_move() {
        let mut agent = employee("emp-1", "Taylor Brooks", Role::Agent);
        agent.status = EmployeeStatus::Terminated;
        let lead = employee("emp-2", "Casey Fox", Role::TeamLead);

        let validation = validate_move(&agent, &lead);

        assert!(matches!(
            validation.denial,
            Some(MoveDenial::TerminatedParticipant { ref employee_name }) if employee_name == "Taylor Brooks"
        ));
    }

    #[test]
    fn terminated_targets_cannot_receive_reports() {
        let agent = employee("emp-1", "Jordan Ellis", Role::Agent);
        let mut lead = employee("emp-2", "Casey Fox", Role::TeamLead);
        lead.status = EmployeeStatus::Terminated;

        let validation = validate_move(&agent, &lead);

        assert!(matches!(
            validation.denial,
            Some(MoveDenial::TerminatedParticipant { ref employee_name }) if employee_name == "Casey Fox"
        ));
    }

    #[test]
    fn team_leads_move_between_managers() {
        let lead = employee("emp-1", "Casey Fox", Role::TeamLead);
        let manager = employee("emp-2", "Priya Natarajan", Role::Manager);

        let validation = validate_move(&lead, &manager);

        assert!(validation.allowed);
    }
}
