pub mod config;
pub mod doctor;
pub mod migrate;
pub mod seed;
pub mod tiers;

use serde::Serialize;

use rosterly_core::config::{AppConfig, LoadOptions};

/// One command invocation: the process exit code plus the exact text
/// printed to stdout.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum OutcomeStatus {
    Ok,
    Error,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: &'static str,
    status: OutcomeStatus,
    error_class: Option<&'static str>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &'static str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command,
            status: OutcomeStatus::Ok,
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &'static str,
        error_class: &'static str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command,
            status: OutcomeStatus::Error,
            error_class: Some(error_class),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Shared command preamble: load config or produce the command's
/// `config_validation` failure.
pub(crate) fn load_config(command: &'static str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })
}

pub(crate) fn build_runtime(
    command: &'static str,
) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}
