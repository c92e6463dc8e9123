use tracing::info;

use crate::config::NotificationConfig;

use super::domain::SubmissionRecord;
use super::repository::{NotificationOutcome, NotifyError, SubmissionNotifier};

/// Rendered notification for the sales inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl NotificationMessage {
    pub fn for_record(record: &SubmissionRecord, from: &str, to: &str) -> Self {
        let answers = serde_json::to_string_pretty(&record.answers)
            .unwrap_or_else(|_| "{}".to_string());
        let body = [
            format!("Email: {}", record.email),
            format!("Created: {}", record.created_at.to_rfc3339()),
            format!("IP: {}", record.ip.as_deref().unwrap_or("n/a")),
            format!(
                "User-Agent: {}",
                record.user_agent.as_deref().unwrap_or("n/a")
            ),
            String::new(),
            "Answers:".to_string(),
            answers,
        ]
        .join("\n");

        Self {
            from: from.to_string(),
            to: to.to_string(),
            subject: format!("New Client Catch Submission: {}", record.email),
            body,
        }
    }
}

/// Notifier whose transport is the log stream, enabled by `DEV_MAIL_LOG`.
#[derive(Debug, Clone)]
pub struct MailLogNotifier {
    config: NotificationConfig,
}

impl MailLogNotifier {
    pub fn new(config: NotificationConfig) -> Self {
        Self { config }
    }

    pub fn message_for(&self, record: &SubmissionRecord) -> Option<NotificationMessage> {
        self.config
            .notify_email
            .as_deref()
            .map(|to| NotificationMessage::for_record(record, &self.config.from_email, to))
    }
}

impl SubmissionNotifier for MailLogNotifier {
    /// The log stream is the only transport: without `DEV_MAIL_LOG` nothing is sent.
    fn notify(&self, record: &SubmissionRecord) -> Result<NotificationOutcome, NotifyError> {
        if !self.config.log_message_body {
            info!("skipping submission notification: no mail transport configured");
            return Ok(NotificationOutcome::Skipped);
        }
        let Some(message) = self.message_for(record) else {
            info!("skipping submission notification: NOTIFY_EMAIL not configured");
            return Ok(NotificationOutcome::Skipped);
        };

        info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            "notification message:\n{}",
            message.body
        );
        Ok(NotificationOutcome::Delivered)
    }
}
