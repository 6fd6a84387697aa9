use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use rosterly_core::domain::employee::{
    CommissionTier, Employee, EmployeeId, EmployeeStatus, Site, TerminationDetails,
};
use rosterly_core::domain::role::Role;

use crate::connection::DbPool;
use crate::employees::{PersistenceError, SqlEmployeeStore};

/// Deterministic two-site roster. Agent tenures sit on the commission
/// boundary (days 10, 179, 180, 200), one veteran was promoted early at
/// day 45, and one agent is terminated with full offboarding details.
const ROSTER: &[FixtureEmployee] = &[
    FixtureEmployee {
        id: "emp-director-1",
        name: "Dana Whitfield",
        role: Role::Director,
        site: Site::Riverton,
        manager_id: None,
        commission_tier: None,
        tenure_days: 2000,
        terminated: false,
    },
    FixtureEmployee {
        id: "emp-manager-1",
        name: "Miguel Santos",
        role: Role::Manager,
        site: Site::Riverton,
        manager_id: Some("emp-director-1"),
        commission_tier: None,
        tenure_days: 1200,
        terminated: false,
    },
    FixtureEmployee {
        id: "emp-manager-2",
        name: "Priya Natarajan",
        role: Role::Manager,
        site: Site::Fairview,
        manager_id: Some("emp-director-1"),
        commission_tier: None,
        tenure_days: 900,
        terminated: false,
    },
    FixtureEmployee {
        id: "emp-lead-1",
        name: "Casey Fox",
        role: Role::TeamLead,
        site: Site::Riverton,
        manager_id: Some("emp-manager-1"),
        commission_tier: Some(CommissionTier::Veteran),
        tenure_days: 700,
        terminated: false,
    },
    FixtureEmployee {
        id: "emp-lead-2",
        name: "Noor Haddad",
        role: Role::TeamLead,
        site: Site::Fairview,
        manager_id: Some("emp-manager-2"),
        commission_tier: Some(CommissionTier::Veteran),
        tenure_days: 650,
        terminated: false,
    },
    FixtureEmployee {
        id: "emp-agent-new",
        name: "Jordan Ellis",
        role: Role::Agent,
        site: Site::Riverton,
        manager_id: Some("emp-lead-1"),
        commission_tier: Some(CommissionTier::New),
        tenure_days: 10,
        terminated: false,
    },
    FixtureEmployee {
        id: "emp-agent-cusp",
        name: "Sam Okafor",
        role: Role::Agent,
        site: Site::Riverton,
        manager_id: Some("emp-lead-1"),
        commission_tier: Some(CommissionTier::New),
        tenure_days: 179,
        terminated: false,
    },
    FixtureEmployee {
        id: "emp-agent-threshold",
        name: "Riley Chen",
        role: Role::Agent,
        site: Site::Fairview,
        manager_id: Some("emp-lead-2"),
        commission_tier: Some(CommissionTier::New),
        tenure_days: 180,
        terminated: false,
    },
    FixtureEmployee {
        id: "emp-agent-veteran",
        name: "Alex Duarte",
        role: Role::Agent,
        site: Site::Fairview,
        manager_id: Some("emp-lead-2"),
        commission_tier: Some(CommissionTier::Veteran),
        tenure_days: 200,
        terminated: false,
    },
    FixtureEmployee {
        id: "emp-agent-early",
        name: "Morgan Reyes",
        role: Role::Agent,
        site: Site::Riverton,
        manager_id: Some("emp-lead-1"),
        commission_tier: Some(CommissionTier::Veteran),
        tenure_days: 45,
        terminated: false,
    },
    FixtureEmployee {
        id: "emp-agent-former",
        name: "Taylor Brooks",
        role: Role::Agent,
        site: Site::Fairview,
        manager_id: Some("emp-lead-2"),
        commission_tier: Some(CommissionTier::New),
        tenure_days: 300,
        terminated: true,
    },
];

#[derive(Debug, Clone, Copy)]
struct FixtureEmployee {
    id: &'static str,
    name: &'static str,
    role: Role,
    site: Site,
    manager_id: Option<&'static str>,
    commission_tier: Option<CommissionTier>,
    tenure_days: i64,
    terminated: bool,
}

impl FixtureEmployee {
    fn to_employee(self, now: DateTime<Utc>) -> Employee {
        let (status, termination) = if self.terminated {
            (
                EmployeeStatus::Terminated,
                Some(TerminationDetails {
                    reason: "moved out of state".to_string(),
                    terminated_at: now - Duration::days(7),
                    final_pay_date: Some(now + Duration::days(7)),
                    document_refs: vec!["doc-offboarding-checklist".to_string()],
                    severance: Some(Decimal::new(2_500, 0)),
                }),
            )
        } else {
            (EmployeeStatus::Active, None)
        };

        Employee {
            id: EmployeeId(self.id.to_string()),
            name: self.name.to_string(),
            role: self.role,
            site: self.site,
            manager_id: self.manager_id.map(|id| EmployeeId(id.to_string())),
            status,
            commission_tier: self.commission_tier,
            start_date: now - Duration::days(self.tenure_days),
            termination,
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Seeded demo roster for local development and smoke checks.
pub struct RosterFixtures;

impl RosterFixtures {
    /// Load the roster. The slice is ordered top-down so manager
    /// references always land on an already-saved row, and saves are
    /// upserts, so reloading is safe.
    pub async fn load(pool: &DbPool) -> Result<SeedOutcome, PersistenceError> {
        let store = SqlEmployeeStore::new(pool.clone());
        let now = Utc::now();

        let mut seeded = Vec::new();
        for fixture in ROSTER {
            store.save(&fixture.to_employee(now)).await?;
            seeded.push(SeededEmployee {
                employee_id: fixture.id,
                name: fixture.name,
                role: fixture.role,
                site: fixture.site,
            });
        }

        Ok(SeedOutcome { seeded })
    }

    /// Verify that every fixture row exists with the expected role,
    /// status, and manager link.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, PersistenceError> {
        let mut checks = Vec::new();

        for fixture in ROSTER {
            let expected_status = if fixture.terminated {
                EmployeeStatus::Terminated
            } else {
                EmployeeStatus::Active
            };
            let exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM employees
                 WHERE id = ?1 AND role = ?2 AND status = ?3 AND manager_id IS ?4)",
            )
            .bind(fixture.id)
            .bind(fixture.role.as_str())
            .bind(expected_status.as_str())
            .bind(fixture.manager_id)
            .fetch_one(pool)
            .await?;
            checks.push((fixture.id, exists == 1));
        }

        for fixture in ROSTER.iter().filter(|fixture| fixture.terminated) {
            let recorded: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM employees WHERE id = ?1 AND termination_json IS NOT NULL)",
            )
            .bind(fixture.id)
            .fetch_one(pool)
            .await?;
            checks.push(("termination-details", recorded == 1));
        }

        let expected_active = ROSTER.iter().filter(|fixture| !fixture.terminated).count() as i64;
        let active_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM employees WHERE status = 'active'")
                .fetch_one(pool)
                .await?;
        checks.push(("active-headcount", active_count == expected_active));

        let all_present = checks.iter().all(|(_, exists)| *exists);
        Ok(VerificationResult { all_present, checks })
    }
}

#[derive(Debug)]
pub struct SeedOutcome {
    pub seeded: Vec<SeededEmployee>,
}

#[derive(Debug)]
pub struct SeededEmployee {
    pub employee_id: &'static str,
    pub name: &'static str,
    pub role: Role,
    pub site: Site,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
