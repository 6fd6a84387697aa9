use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use rosterly_core::config::NotificationsConfig;
use rosterly_core::ports::{
    ChangeNotification, ChangeNotifier, CommitSummary, NotifyError, NotifyRoutes, SummaryChannel,
};

use crate::messages;

/// Outbound webhook fan-out: change notifications go to Slack and the
/// n8n workflow, summaries go to Slack directly and to email via n8n.
pub struct WebhookNotifier {
    client: Client,
    slack_webhook_url: Option<SecretString>,
    n8n_webhook_url: Option<SecretString>,
}

impl WebhookNotifier {
    pub fn new(config: &NotificationsConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| NotifyError::Transport(error.to_string()))?;

        Ok(Self {
            client,
            slack_webhook_url: config.slack_webhook_url.clone(),
            n8n_webhook_url: config.n8n_webhook_url.clone(),
        })
    }

    pub fn has_slack_route(&self) -> bool {
        self.slack_webhook_url.is_some()
    }

    pub fn has_n8n_route(&self) -> bool {
        self.n8n_webhook_url.is_some()
    }

    fn slack_url(&self) -> Result<&SecretString, NotifyError> {
        self.slack_webhook_url
            .as_ref()
            .ok_or_else(|| NotifyError::Rejected("slack webhook url is not configured".to_string()))
    }

    fn n8n_url(&self) -> Result<&SecretString, NotifyError> {
        self.n8n_webhook_url
            .as_ref()
            .ok_or_else(|| NotifyError::Rejected("n8n webhook url is not configured".to_string()))
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &SecretString,
        payload: &T,
    ) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(url.expose_secret())
            .json(payload)
            .send()
            .await
            .map_err(|error| NotifyError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected(format!("status {status}: {}", body.trim())));
        }
        Ok(())
    }

    async fn deliver_change_slack(
        &self,
        notification: &ChangeNotification,
    ) -> Result<(), NotifyError> {
        let url = self.slack_url()?;
        self.post_json(url, &messages::change_message(notification)).await
    }

    async fn deliver_change_n8n(
        &self,
        notification: &ChangeNotification,
    ) -> Result<(), NotifyError> {
        let url = self.n8n_url()?;
        self.post_json(url, &messages::change_workflow_payload(notification)).await
    }
}

#[async_trait::async_trait]
impl ChangeNotifier for WebhookNotifier {
    async fn notify_change(
        &self,
        notification: &ChangeNotification,
        routes: NotifyRoutes,
    ) -> Result<(), NotifyError> {
        let mut failures = Vec::new();

        if routes.slack {
            match self.deliver_change_slack(notification).await {
                Ok(()) => tracing::debug!(
                    event_name = "notify.change_sent",
                    route = "slack",
                    employee_id = %notification.employee.employee_id,
                    "change notification delivered"
                ),
                Err(error) => failures.push(format!("slack: {error}")),
            }
        }

        if routes.n8n {
            match self.deliver_change_n8n(notification).await {
                Ok(()) => tracing::debug!(
                    event_name = "notify.change_sent",
                    route = "n8n",
                    employee_id = %notification.employee.employee_id,
                    "change notification delivered"
                ),
                Err(error) => failures.push(format!("n8n: {error}")),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(NotifyError::Transport(failures.join("; ")))
        }
    }

    async fn send_summary(
        &self,
        summary: &CommitSummary,
        channel: SummaryChannel,
    ) -> Result<(), NotifyError> {
        match channel {
            SummaryChannel::Slack => {
                let url = self.slack_url()?;
                self.post_json(url, &messages::summary_message(summary)).await?;
            }
            // Email delivery is owned by the n8n workflow; this side
            // only hands it the summary payload.
            SummaryChannel::Email => {
                let url = self.n8n_url()?;
                self.post_json(url, &messages::summary_workflow_payload(summary, channel)).await?;
            }
        }

        tracing::debug!(
            event_name = "notify.summary_sent",
            channel = channel.as_str(),
            total_changes = summary.total_changes,
            "commit summary delivered"
        );
        Ok(())
    }
}
