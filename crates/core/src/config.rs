use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub notifications: NotificationsConfig,
    pub staging: StagingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct NotificationsConfig {
    pub slack_webhook_url: Option<SecretString>,
    pub n8n_webhook_url: Option<SecretString>,
    pub notify_slack: bool,
    pub notify_n8n: bool,
    pub slack_summary: bool,
    pub email_summary: bool,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct StagingConfig {
    pub path: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub staging_path: Option<String>,
    pub slack_webhook_url: Option<String>,
    pub n8n_webhook_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://rosterly.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            notifications: NotificationsConfig {
                slack_webhook_url: None,
                n8n_webhook_url: None,
                notify_slack: false,
                notify_n8n: false,
                slack_summary: false,
                email_summary: false,
                timeout_secs: 10,
            },
            staging: StagingConfig { path: "rosterly-staging.json".to_string() },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("rosterly.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(notifications) = patch.notifications {
            if let Some(slack_webhook_url) = notifications.slack_webhook_url {
                self.notifications.slack_webhook_url = Some(secret_value(slack_webhook_url));
            }
            if let Some(n8n_webhook_url) = notifications.n8n_webhook_url {
                self.notifications.n8n_webhook_url = Some(secret_value(n8n_webhook_url));
            }
            if let Some(notify_slack) = notifications.notify_slack {
                self.notifications.notify_slack = notify_slack;
            }
            if let Some(notify_n8n) = notifications.notify_n8n {
                self.notifications.notify_n8n = notify_n8n;
            }
            if let Some(slack_summary) = notifications.slack_summary {
                self.notifications.slack_summary = slack_summary;
            }
            if let Some(email_summary) = notifications.email_summary {
                self.notifications.email_summary = email_summary;
            }
            if let Some(timeout_secs) = notifications.timeout_secs {
                self.notifications.timeout_secs = timeout_secs;
            }
        }

        if let Some(staging) = patch.staging {
            if let Some(path) = staging.path {
                self.staging.path = path;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ROSTERLY_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("ROSTERLY_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("ROSTERLY_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("ROSTERLY_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("ROSTERLY_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ROSTERLY_SLACK_WEBHOOK_URL") {
            self.notifications.slack_webhook_url = Some(secret_value(value));
        }
        if let Some(value) = read_env("ROSTERLY_N8N_WEBHOOK_URL") {
            self.notifications.n8n_webhook_url = Some(secret_value(value));
        }
        if let Some(value) = read_env("ROSTERLY_NOTIFY_SLACK") {
            self.notifications.notify_slack = parse_bool("ROSTERLY_NOTIFY_SLACK", &value)?;
        }
        if let Some(value) = read_env("ROSTERLY_NOTIFY_N8N") {
            self.notifications.notify_n8n = parse_bool("ROSTERLY_NOTIFY_N8N", &value)?;
        }
        if let Some(value) = read_env("ROSTERLY_SLACK_SUMMARY") {
            self.notifications.slack_summary = parse_bool("ROSTERLY_SLACK_SUMMARY", &value)?;
        }
        if let Some(value) = read_env("ROSTERLY_EMAIL_SUMMARY") {
            self.notifications.email_summary = parse_bool("ROSTERLY_EMAIL_SUMMARY", &value)?;
        }
        if let Some(value) = read_env("ROSTERLY_NOTIFICATIONS_TIMEOUT_SECS") {
            self.notifications.timeout_secs =
                parse_u64("ROSTERLY_NOTIFICATIONS_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ROSTERLY_STAGING_PATH") {
            self.staging.path = value;
        }

        let log_level =
            read_env("ROSTERLY_LOGGING_LEVEL").or_else(|| read_env("ROSTERLY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ROSTERLY_LOGGING_FORMAT").or_else(|| read_env("ROSTERLY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(staging_path) = overrides.staging_path {
            self.staging.path = staging_path;
        }
        if let Some(slack_webhook_url) = overrides.slack_webhook_url {
            self.notifications.slack_webhook_url = Some(secret_value(slack_webhook_url));
        }
        if let Some(n8n_webhook_url) = overrides.n8n_webhook_url {
            self.notifications.n8n_webhook_url = Some(secret_value(n8n_webhook_url));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_notifications(&self.notifications)?;
        validate_staging(&self.staging)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("rosterly.toml"), PathBuf::from("config/rosterly.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_notifications(notifications: &NotificationsConfig) -> Result<(), ConfigError> {
    if notifications.timeout_secs == 0 || notifications.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "notifications.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if notifications.notify_slack || notifications.slack_summary {
        require_https_webhook(
            "notifications.slack_webhook_url",
            "Slack notifications",
            notifications.slack_webhook_url.as_ref(),
        )?;
    }

    if notifications.notify_n8n || notifications.email_summary {
        require_https_webhook(
            "notifications.n8n_webhook_url",
            "n8n notifications",
            notifications.n8n_webhook_url.as_ref(),
        )?;
    }

    Ok(())
}

fn require_https_webhook(
    key: &str,
    feature: &str,
    url: Option<&SecretString>,
) -> Result<(), ConfigError> {
    let Some(url) = url else {
        return Err(ConfigError::Validation(format!(
            "{key} is required when {feature} are enabled"
        )));
    };

    let exposed = url.expose_secret().trim().to_string();
    if exposed.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{key} is required when {feature} are enabled"
        )));
    }
    if !exposed.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must be an https:// URL")));
    }

    Ok(())
}

fn validate_staging(staging: &StagingConfig) -> Result<(), ConfigError> {
    if staging.path.trim().is_empty() {
        return Err(ConfigError::Validation("staging.path must not be empty".to_string()));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    notifications: Option<NotificationsPatch>,
    staging: Option<StagingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct NotificationsPatch {
    slack_webhook_url: Option<String>,
    n8n_webhook_url: Option<String>,
    notify_slack: Option<bool>,
    notify_n8n: Option<bool>,
    slack_summary: Option<bool>,
    email_summary: Option<bool>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct StagingPatch {
    path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
