//! Approval requests and their single-transition state machine.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use issuegate_core::AppError;
use serde::{Deserialize, Serialize};

/// The one sensitive action gated by the approval workflow.
pub const APPROVAL_ACTION_CLOSE: &str = "close";

/// Approval lifecycle states.
///
/// `Pending` is the only state a transition may leave; `Approved` and
/// `Rejected` are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Awaiting an out-of-band decision.
    Pending,
    /// Reviewer approved the action.
    Approved,
    /// Reviewer rejected the action.
    Rejected,
}

impl ApprovalStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Returns whether the status is absorbing.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl FromStr for ApprovalStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(AppError::Validation(format!(
                "unknown approval status '{value}'"
            ))),
        }
    }
}

/// A reviewer's decision, parsed from the callback link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    /// Approve the pending action.
    Approve,
    /// Reject the pending action.
    Reject,
}

impl ApprovalDecision {
    /// Returns the decision literal used in callback links.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }

    /// Returns the terminal status this decision transitions to.
    #[must_use]
    pub fn target_status(&self) -> ApprovalStatus {
        match self {
            Self::Approve => ApprovalStatus::Approved,
            Self::Reject => ApprovalStatus::Rejected,
        }
    }

    /// Returns the past-tense label used in audit entries.
    #[must_use]
    pub fn as_past_tense(&self) -> &'static str {
        match self {
            Self::Approve => "approved",
            Self::Reject => "rejected",
        }
    }
}

impl FromStr for ApprovalDecision {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            _ => Err(AppError::Validation(format!(
                "decision must be 'approve' or 'reject', got '{value}'"
            ))),
        }
    }
}

/// A stored approval request awaiting or holding a decision.
///
/// `approver_emails` is the advisory notification audience only: the
/// decision channel is unauthenticated by design and possession of the
/// decision secret is the actual credential. No decider identity is ever
/// checked against this list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Store-assigned identifier.
    pub id: String,
    /// Issue the sensitive action targets.
    pub issue_id: String,
    /// Gated action literal, always [`APPROVAL_ACTION_CLOSE`].
    pub action: String,
    /// State-machine position.
    pub status: ApprovalStatus,
    /// Actor that requested the approval, if authenticated.
    pub requested_by: Option<String>,
    /// Creation timestamp, store-assigned.
    pub requested_at: Option<DateTime<Utc>>,
    /// Decision timestamp, set exactly once.
    pub decided_at: Option<DateTime<Utc>>,
    /// Decision channel identifier, set exactly once.
    pub decided_by: Option<String>,
    /// Closure note to apply when approved.
    pub closure_note: Option<String>,
    /// Closure photo URL to apply when approved.
    pub closure_photo_url: Option<String>,
    /// Advisory notification audience, never enforced.
    pub approver_emails: Vec<String>,
    /// SHA-256 hex hash of the decision secret; the raw secret is never stored.
    pub token_hash: String,
}

/// Fields needed to persist a fresh pending approval request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApprovalRequest {
    /// Issue the sensitive action targets.
    pub issue_id: String,
    /// Actor that requested the approval, if authenticated.
    pub requested_by: Option<String>,
    /// Closure note to apply when approved.
    pub closure_note: Option<String>,
    /// Closure photo URL to apply when approved.
    pub closure_photo_url: Option<String>,
    /// Advisory notification audience copied from settings.
    pub approver_emails: Vec<String>,
    /// SHA-256 hex hash of the decision secret.
    pub token_hash: String,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{ApprovalDecision, ApprovalStatus};

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!ApprovalStatus::Pending.is_terminal());
        assert!(ApprovalStatus::Approved.is_terminal());
        assert!(ApprovalStatus::Rejected.is_terminal());
    }

    #[test]
    fn decision_parsing_is_case_insensitive() {
        assert_eq!(
            ApprovalDecision::from_str("Approve").ok(),
            Some(ApprovalDecision::Approve)
        );
        assert_eq!(
            ApprovalDecision::from_str("REJECT").ok(),
            Some(ApprovalDecision::Reject)
        );
    }

    #[test]
    fn unknown_decision_literal_is_rejected() {
        assert!(ApprovalDecision::from_str("maybe").is_err());
    }

    #[test]
    fn decision_maps_to_terminal_status() {
        assert_eq!(
            ApprovalDecision::Approve.target_status(),
            ApprovalStatus::Approved
        );
        assert_eq!(
            ApprovalDecision::Reject.target_status(),
            ApprovalStatus::Rejected
        );
    }
}
