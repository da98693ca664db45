//! Console notifier for development. Logs approval links to tracing output.

use async_trait::async_trait;
use issuegate_application::{ApprovalNotification, ApprovalNotifier};
use issuegate_core::AppResult;
use tracing::info;

/// Development notifier that logs decision links instead of posting them.
#[derive(Clone)]
pub struct ConsoleApprovalNotifier;

impl ConsoleApprovalNotifier {
    /// Creates a new console notifier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleApprovalNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApprovalNotifier for ConsoleApprovalNotifier {
    async fn send(&self, webhook_url: &str, notification: &ApprovalNotification) -> AppResult<()> {
        info!(
            webhook_url = webhook_url,
            issue_id = %notification.issue_id,
            "--- APPROVAL (console) ---\nApprove: {}\nReject:  {}\n--- END APPROVAL ---",
            notification.approve_url,
            notification.reject_url
        );

        Ok(())
    }
}
