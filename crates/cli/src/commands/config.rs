use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rosterly_core::config::{AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    // Keys with env aliases list the primary name first; attribution
    // reports whichever one is actually set.
    let rows: Vec<(&'static str, &'static [&'static str], String)> = vec![
        ("database.url", &["ROSTERLY_DATABASE_URL"], config.database.url.clone()),
        (
            "database.max_connections",
            &["ROSTERLY_DATABASE_MAX_CONNECTIONS"],
            config.database.max_connections.to_string(),
        ),
        (
            "database.timeout_secs",
            &["ROSTERLY_DATABASE_TIMEOUT_SECS"],
            config.database.timeout_secs.to_string(),
        ),
        (
            "notifications.slack_webhook_url",
            &["ROSTERLY_SLACK_WEBHOOK_URL"],
            redact_webhook(config.notifications.slack_webhook_url.as_ref()),
        ),
        (
            "notifications.n8n_webhook_url",
            &["ROSTERLY_N8N_WEBHOOK_URL"],
            redact_webhook(config.notifications.n8n_webhook_url.as_ref()),
        ),
        (
            "notifications.notify_slack",
            &["ROSTERLY_NOTIFY_SLACK"],
            config.notifications.notify_slack.to_string(),
        ),
        (
            "notifications.notify_n8n",
            &["ROSTERLY_NOTIFY_N8N"],
            config.notifications.notify_n8n.to_string(),
        ),
        (
            "notifications.slack_summary",
            &["ROSTERLY_SLACK_SUMMARY"],
            config.notifications.slack_summary.to_string(),
        ),
        (
            "notifications.email_summary",
            &["ROSTERLY_EMAIL_SUMMARY"],
            config.notifications.email_summary.to_string(),
        ),
        (
            "notifications.timeout_secs",
            &["ROSTERLY_NOTIFICATIONS_TIMEOUT_SECS"],
            config.notifications.timeout_secs.to_string(),
        ),
        ("staging.path", &["ROSTERLY_STAGING_PATH"], config.staging.path.clone()),
        (
            "logging.level",
            &["ROSTERLY_LOGGING_LEVEL", "ROSTERLY_LOG_LEVEL"],
            config.logging.level.clone(),
        ),
        (
            "logging.format",
            &["ROSTERLY_LOGGING_FORMAT", "ROSTERLY_LOG_FORMAT"],
            format!("{:?}", config.logging.format),
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key_path, env_keys, value) in rows {
        let source =
            field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key_path, &value, source));
    }

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("rosterly.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/rosterly.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    for env_key in env_keys {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Webhook URLs authenticate by path, so everything past the host is
/// the secret part.
fn redact_webhook(url: Option<&SecretString>) -> String {
    let Some(url) = url else {
        return "<unset>".to_string();
    };

    let exposed = url.expose_secret().trim();
    if exposed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some(scheme_end) = exposed.find("://") {
        let host_start = scheme_end + 3;
        let host_end = exposed[host_start..]
            .find('/')
            .map(|offset| host_start + offset)
            .unwrap_or(exposed.len());
        return format!("{}/***", &exposed[..host_end]);
    }

    "<redacted>".to_string()
}
