use std::sync::Arc;

use async_trait::async_trait;
use issuegate_core::{AppError, AppResult};
use issuegate_domain::{
    ApprovalDecision, ApprovalRequest, ApprovalStatus, AuditAction, AuditLogEntry, IssueClosure,
    IssueStatus, NewApprovalRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::AuditRepository;

mod token_crypto;

/// Channel identifier stamped as the decider of every decision.
///
/// The decision link is unauthenticated by design; the secret itself is the
/// credential, so there is no per-person decider identity to record.
pub const DECIDED_BY_CHANNEL: &str = "teams-link";

/// Channel identifier stamped as the closer of an approved issue.
pub const CLOSED_BY_CHANNEL: &str = "teams-approval";

/// Repository port for approval request records.
#[async_trait]
pub trait ApprovalRepository: Send + Sync {
    /// Persists a fresh pending request and returns its store-assigned id.
    async fn create(&self, request: NewApprovalRequest) -> AppResult<String>;

    /// Fetches a request by id.
    async fn find(&self, id: &str) -> AppResult<Option<ApprovalRequest>>;

    /// Transitions a request out of `pending`, atomically.
    ///
    /// Returns `true` when this call performed the transition and `false`
    /// when the request was no longer pending. Implementations must make
    /// the still-pending check and the write a single atomic step; two
    /// racing decisions must never both observe `true`.
    async fn record_decision(
        &self,
        id: &str,
        status: ApprovalStatus,
        decided_by: &str,
    ) -> AppResult<bool>;
}

/// Repository port for the issue mutations the workflow performs.
#[async_trait]
pub trait IssueRepository: Send + Sync {
    /// Marks an issue as awaiting closure approval.
    async fn mark_pending_approval(&self, issue_id: &str) -> AppResult<()>;

    /// Closes an issue with the approved closure payload.
    async fn close(&self, issue_id: &str, closure: &IssueClosure) -> AppResult<()>;
}

/// Process-wide approval settings from the document store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Webhook to notify on new approval requests; absence skips notification.
    pub notification_webhook_url: Option<String>,
    /// Advisory notification audience; never checked against a decider.
    pub approver_emails: Vec<String>,
}

/// Port for loading process-wide approval settings.
#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Loads the application settings record.
    async fn load(&self) -> AppResult<AppSettings>;
}

/// Payload delivered to the out-of-band notification channel.
///
/// The approve/reject URLs embed the raw decision secret; this payload is
/// the only place the secret ever leaves the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalNotification {
    /// Issue awaiting closure.
    pub issue_id: String,
    /// Closure note, if any, for the card body.
    pub closure_note: Option<String>,
    /// Closure photo, if any, for the card body.
    pub closure_photo_url: Option<String>,
    /// Callback link that approves the request.
    pub approve_url: String,
    /// Callback link that rejects the request.
    pub reject_url: String,
}

/// Port for best-effort outbound approval notifications.
#[async_trait]
pub trait ApprovalNotifier: Send + Sync {
    /// Posts the notification to the given webhook.
    async fn send(&self, webhook_url: &str, notification: &ApprovalNotification) -> AppResult<()>;
}

/// Response for a created approval request. Never carries the raw secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalReceipt {
    /// Store-assigned request id.
    pub id: String,
    /// Always `pending` on creation.
    pub status: ApprovalStatus,
}

/// Input for creating an approval request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateApprovalInput {
    /// Issue the closure targets.
    pub issue_id: String,
    /// Closure note to apply on approval.
    pub closure_note: Option<String>,
    /// Closure photo URL to apply on approval.
    pub closure_photo_url: Option<String>,
    /// Actor requesting the approval, if authenticated.
    pub requested_by: Option<String>,
}

/// Outcome of consuming a decision link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// This call performed the transition.
    Decided {
        /// The decision that landed.
        decision: ApprovalDecision,
        /// Issue the request targets.
        issue_id: String,
    },
    /// The request was already decided; nothing was re-applied.
    AlreadyCompleted,
}

/// Two-step secure-approval protocol over injected collaborators.
///
/// `create` and `decide` are connected only through the stored request
/// record and the decision secret; each call is a short-lived, stateless
/// operation coordinating through the backing store.
#[derive(Clone)]
pub struct ApprovalService {
    approvals: Arc<dyn ApprovalRepository>,
    issues: Arc<dyn IssueRepository>,
    settings: Arc<dyn SettingsSource>,
    notifier: Arc<dyn ApprovalNotifier>,
    audit: Arc<dyn AuditRepository>,
    public_base_url: String,
}

impl ApprovalService {
    /// Creates the service over its collaborator ports.
    ///
    /// `public_base_url` is the externally reachable base for callback
    /// links; it comes from configuration, never from request headers.
    #[must_use]
    pub fn new(
        approvals: Arc<dyn ApprovalRepository>,
        issues: Arc<dyn IssueRepository>,
        settings: Arc<dyn SettingsSource>,
        notifier: Arc<dyn ApprovalNotifier>,
        audit: Arc<dyn AuditRepository>,
        public_base_url: String,
    ) -> Self {
        Self {
            approvals,
            issues,
            settings,
            notifier,
            audit,
            public_base_url: public_base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Creates a pending approval request for closing an issue.
    ///
    /// The approval record is the primary write. Marking the issue
    /// `pending_approval` and posting the notification are best-effort
    /// mirrors: their failures are logged and never fail this call.
    pub async fn create(&self, input: CreateApprovalInput) -> AppResult<ApprovalReceipt> {
        if input.issue_id.trim().is_empty() {
            return Err(AppError::Validation("issueId is required".to_owned()));
        }

        let settings = self.settings.load().await?;
        let (raw_token, token_hash) = token_crypto::generate_decision_token()?;

        let id = self
            .approvals
            .create(NewApprovalRequest {
                issue_id: input.issue_id.clone(),
                requested_by: input.requested_by,
                closure_note: input.closure_note.clone(),
                closure_photo_url: input.closure_photo_url.clone(),
                approver_emails: settings.approver_emails,
                token_hash,
            })
            .await?;

        if let Err(error) = self.issues.mark_pending_approval(input.issue_id.as_str()).await {
            warn!(issue_id = %input.issue_id, %error, "failed to mark issue pending_approval");
        }

        if let Some(webhook_url) = settings.notification_webhook_url {
            let notification = ApprovalNotification {
                issue_id: input.issue_id,
                closure_note: input.closure_note,
                closure_photo_url: input.closure_photo_url,
                approve_url: self.decision_url(id.as_str(), ApprovalDecision::Approve, &raw_token),
                reject_url: self.decision_url(id.as_str(), ApprovalDecision::Reject, &raw_token),
            };
            if let Err(error) = self.notifier.send(webhook_url.as_str(), &notification).await {
                warn!(approval_id = %id, %error, "approval notification failed");
            }
        }

        Ok(ApprovalReceipt {
            id,
            status: ApprovalStatus::Pending,
        })
    }

    /// Consumes a decision link and applies the decided side effect once.
    pub async fn decide(
        &self,
        id: &str,
        decision: ApprovalDecision,
        token: &str,
    ) -> AppResult<DecisionOutcome> {
        let request = self
            .approvals
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("approval '{id}' does not exist")))?;

        if request.status.is_terminal() {
            return Ok(DecisionOutcome::AlreadyCompleted);
        }

        if token_crypto::hash_decision_token(token) != request.token_hash {
            return Err(AppError::Forbidden("invalid decision token".to_owned()));
        }

        let transitioned = self
            .approvals
            .record_decision(id, decision.target_status(), DECIDED_BY_CHANNEL)
            .await?;
        if !transitioned {
            // Lost the race against another decision on the same link.
            return Ok(DecisionOutcome::AlreadyCompleted);
        }

        if decision == ApprovalDecision::Approve {
            self.issues
                .close(
                    request.issue_id.as_str(),
                    &IssueClosure {
                        closed_by: CLOSED_BY_CHANNEL.to_owned(),
                        closure_note: request.closure_note.clone(),
                        closure_photo_url: request.closure_photo_url.clone(),
                    },
                )
                .await?;
        }

        self.audit
            .append(AuditLogEntry {
                action: AuditAction::ApprovalDecision,
                entity_type: "issue".to_owned(),
                entity_id: request.issue_id.clone(),
                before: json!({ "status": IssueStatus::PendingApproval.as_str() }),
                after: json!({
                    "decision": decision.as_past_tense(),
                    "decidedBy": DECIDED_BY_CHANNEL,
                }),
                actor_email: None,
                actor_uid: None,
            })
            .await?;

        Ok(DecisionOutcome::Decided {
            decision,
            issue_id: request.issue_id,
        })
    }

    fn decision_url(&self, id: &str, decision: ApprovalDecision, raw_token: &str) -> String {
        format!(
            "{}/api/approvals/decision?id={id}&decision={}&token={raw_token}",
            self.public_base_url,
            decision.as_str()
        )
    }
}

#[cfg(test)]
mod tests;
