use crate::commands::{build_runtime, load_config, CommandResult};
use rosterly_db::{connect, migrations, RosterFixtures, SeededEmployee};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("seed") {
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

        let outcome = RosterFixtures::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = RosterFixtures::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<Vec<SeededEmployee>, (&'static str, String, u8)> =
            if verification.all_present {
                Ok(outcome.seeded)
            } else {
                Err(("seed_verification", verification_message(&verification.checks), 6u8))
            };

        pool.close().await;
        run_result
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", seeded_message(&seeded)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn seeded_message(seeded: &[SeededEmployee]) -> String {
    let lines: Vec<String> = seeded
        .iter()
        .map(|employee| {
            format!(
                "  - {}: {} ({}, {})",
                employee.employee_id,
                employee.name,
                employee.role.label(),
                employee.site.label()
            )
        })
        .collect();
    format!("demo roster loaded and verified ({} employees):\n{}", seeded.len(), lines.join("\n"))
}

fn verification_message(checks: &[(&'static str, bool)]) -> String {
    let failed: Vec<&str> =
        checks.iter().filter_map(|(check, passed)| (!passed).then_some(*check)).collect();

    if failed.is_empty() {
        "some fixture rows failed verification".to_string()
    } else {
        format!("verification failed for checks: {}", failed.join(", "))
    }
}
