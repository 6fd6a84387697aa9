use chrono::Utc;
use serde::Serialize;

use crate::commands::{build_runtime, load_config, CommandResult};
use rosterly_core::commission::{CommissionResult, CommissionSchedule};
use rosterly_core::domain::employee::Employee;
use rosterly_core::domain::role::Role;
use rosterly_db::{connect, migrations, SqlEmployeeStore};

/// One active agent's effective pay terms. The commission fields are
/// flattened so consumers see a single flat record per agent.
#[derive(Debug, Serialize)]
struct AgentTier {
    employee_id: String,
    name: String,
    site: String,
    tenure_days: i64,
    #[serde(flatten)]
    commission: CommissionResult,
}

#[derive(Debug, Serialize)]
struct TiersReport<'a> {
    command: &'static str,
    status: &'static str,
    agents: &'a [AgentTier],
}

pub fn run(json_output: bool) -> CommandResult {
    let config = match load_config("tiers") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("tiers") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let store = SqlEmployeeStore::new(pool.clone());
        let employees = store
            .list_active()
            .await
            .map_err(|error| ("commission_report", error.to_string(), 6u8))?;

        pool.close().await;
        Ok::<Vec<Employee>, (&'static str, String, u8)>(employees)
    });

    let employees = match result {
        Ok(employees) => employees,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("tiers", error_class, message, exit_code);
        }
    };

    let schedule = CommissionSchedule::default();
    let now = Utc::now();
    let mut agents = Vec::new();
    for employee in employees.iter().filter(|employee| employee.role == Role::Agent) {
        let commission = match schedule.calculate(employee, now) {
            Ok(commission) => commission,
            Err(error) => {
                return CommandResult::failure("tiers", "commission_report", error.to_string(), 6);
            }
        };
        agents.push(AgentTier {
            employee_id: employee.id.0.clone(),
            name: employee.name.clone(),
            site: employee.site.as_str().to_string(),
            tenure_days: employee.tenure_days(now),
            commission,
        });
    }

    let output = if json_output { render_json(&agents) } else { render_human(&agents) };
    CommandResult { exit_code: 0, output }
}

fn render_json(agents: &[AgentTier]) -> String {
    let report = TiersReport { command: "tiers", status: "ok", agents };
    serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"tiers\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

fn render_human(agents: &[AgentTier]) -> String {
    if agents.is_empty() {
        return "no active agents on the roster".to_string();
    }

    let mut lines = vec![format!("commission tiers for {} active agents:", agents.len())];
    for agent in agents {
        let mut line = format!(
            "- {} ({}): {} plan, base {}, rate {}%",
            agent.name,
            agent.site,
            agent.commission.tier.as_str(),
            agent.commission.base_salary,
            agent.commission.commission_rate_pct
        );
        if let Some(days) = agent.commission.days_until_change {
            line.push_str(&format!(", veteran in {days} day(s)"));
        }
        if agent.commission.is_early_promotion {
            line.push_str(", early promotion");
        }
        lines.push(line);
    }

    lines.join("\n")
}
