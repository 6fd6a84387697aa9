pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rosterly_core::config::{AppConfig, LoadOptions, LoggingConfig};

#[derive(Debug, Parser)]
#[command(
    name = "rosterly",
    about = "Rosterly operator CLI",
    long_about = "Operate the Rosterly roster engine: migrations, demo fixtures, commission reporting, config inspection, and readiness checks.",
    after_help = "Examples:\n  rosterly doctor --json\n  rosterly seed\n  rosterly tiers --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo roster and verify every seeded row")]
    Seed,
    #[command(about = "Report effective commission tiers for all active agents")]
    Tiers {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(
        about = "Validate config, database connectivity, staging store, and webhook readiness"
    )]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // A broken config must not silence the command's own error report,
    // so logging falls back to defaults instead of failing here.
    let logging = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config.logging,
        Err(_) => AppConfig::default().logging,
    };
    init_logging(&logging);

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Tiers { json } => commands::tiers::run(json),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn init_logging(logging: &LoggingConfig) {
    if let Err(error) = try_init_logging(logging) {
        eprintln!("logging disabled: {error:#}");
    }
}

/// Logs go to stderr so stdout stays parseable command output.
fn try_init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    use rosterly_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let installed = match logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };

    installed.map_err(|error| anyhow::anyhow!("failed to install tracing subscriber: {error}"))
}
