use std::time::Duration;

use async_trait::async_trait;
use issuegate_application::{ApprovalNotification, ApprovalNotifier};
use issuegate_core::{AppError, AppResult};
use serde_json::{Value, json};

/// Posts approval requests to a chat webhook as an adaptive card.
///
/// Delivery is best-effort and the caller swallows failures, so the request
/// carries a short timeout rather than a retry policy.
pub struct WebhookApprovalNotifier {
    http_client: reqwest::Client,
    timeout: Duration,
}

impl WebhookApprovalNotifier {
    /// Creates a notifier over a shared HTTP client.
    #[must_use]
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            timeout: Duration::from_secs(5),
        }
    }

    fn card_payload(notification: &ApprovalNotification) -> Value {
        let mut text = format!(
            "Approval requested to CLOSE Issue {}",
            notification.issue_id
        );
        if let Some(note) = notification.closure_note.as_deref() {
            text.push_str("\n\nNote: ");
            text.push_str(note);
        }

        let mut body = vec![json!({
            "type": "TextBlock",
            "text": text,
            "wrap": true,
            "weight": "Bolder",
            "size": "Medium",
        })];
        if let Some(photo_url) = notification.closure_photo_url.as_deref() {
            body.push(json!({
                "type": "Image",
                "url": photo_url,
                "size": "Medium",
            }));
        }

        json!({
            "type": "message",
            "attachments": [{
                "contentType": "application/vnd.microsoft.card.adaptive",
                "contentUrl": null,
                "content": {
                    "type": "AdaptiveCard",
                    "version": "1.4",
                    "body": body,
                    "actions": [
                        {
                            "type": "Action.OpenUrl",
                            "title": "Approve",
                            "url": notification.approve_url,
                        },
                        {
                            "type": "Action.OpenUrl",
                            "title": "Reject",
                            "url": notification.reject_url,
                        },
                    ],
                },
            }],
        })
    }
}

#[async_trait]
impl ApprovalNotifier for WebhookApprovalNotifier {
    async fn send(&self, webhook_url: &str, notification: &ApprovalNotification) -> AppResult<()> {
        let response = self
            .http_client
            .post(webhook_url)
            .timeout(self.timeout)
            .json(&Self::card_payload(notification))
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("webhook delivery failed: {error}")))?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "webhook responded with status {}",
                response.status()
            )));
        }

        Ok(())
    }
}
