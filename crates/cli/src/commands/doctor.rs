use serde::Serialize;
use serde_json::json;

use rosterly_core::config::{AppConfig, LoadOptions};
use rosterly_core::ports::StagingStore;
use rosterly_db::{connect, JsonFileStagingStore};
use rosterly_notify::WebhookNotifier;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_database_connectivity(&config));
            checks.push(check_staging_store(&config));
            checks.push(check_notification_routes(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["database_connectivity", "staging_store", "notification_routes"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_database_connectivity(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let pool = connect(&config.database)
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;

        pool.close().await;
        Ok::<(), String>(())
    });

    match result {
        Ok(()) => DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        },
        Err(error) => {
            DoctorCheck { name: "database_connectivity", status: CheckStatus::Fail, details: error }
        }
    }
}

fn check_staging_store(config: &AppConfig) -> DoctorCheck {
    let store = JsonFileStagingStore::new(&config.staging.path);
    let probe = store
        .set("doctor_probe", json!({ "probed": true }))
        .and_then(|()| store.remove("doctor_probe"));

    match probe {
        Ok(()) => DoctorCheck {
            name: "staging_store",
            status: CheckStatus::Pass,
            details: format!("write probe succeeded at `{}`", config.staging.path),
        },
        Err(error) => DoctorCheck {
            name: "staging_store",
            status: CheckStatus::Fail,
            details: format!("write probe failed: {error}"),
        },
    }
}

fn check_notification_routes(config: &AppConfig) -> DoctorCheck {
    let notifier = match WebhookNotifier::new(&config.notifications) {
        Ok(notifier) => notifier,
        Err(error) => {
            return DoctorCheck {
                name: "notification_routes",
                status: CheckStatus::Fail,
                details: format!("failed to build webhook client: {error}"),
            };
        }
    };

    let mut routes = Vec::new();
    if config.notifications.notify_slack || config.notifications.slack_summary {
        routes.push(if notifier.has_slack_route() {
            "slack (ready)"
        } else {
            "slack (missing url)"
        });
    }
    if config.notifications.notify_n8n || config.notifications.email_summary {
        routes.push(if notifier.has_n8n_route() { "n8n (ready)" } else { "n8n (missing url)" });
    }

    if routes.is_empty() {
        return DoctorCheck {
            name: "notification_routes",
            status: CheckStatus::Pass,
            details: "no notification routes are enabled".to_string(),
        };
    }

    let all_ready = routes.iter().all(|route| route.ends_with("(ready)"));
    DoctorCheck {
        name: "notification_routes",
        status: if all_ready { CheckStatus::Pass } else { CheckStatus::Fail },
        details: routes.join(", "),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
