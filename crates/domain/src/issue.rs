use std::str::FromStr;

use chrono::{DateTime, Utc};
use issuegate_core::AppError;
use serde::{Deserialize, Serialize};

/// Issue lifecycle states touched by the approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    /// Issue is open and workable.
    Open,
    /// A closure approval is pending for the issue.
    PendingApproval,
    /// Issue has been closed through an approved decision.
    Closed,
}

impl IssueStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::PendingApproval => "pending_approval",
            Self::Closed => "closed",
        }
    }
}

impl FromStr for IssueStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "open" => Ok(Self::Open),
            "pending_approval" => Ok(Self::PendingApproval),
            "closed" => Ok(Self::Closed),
            _ => Err(AppError::Validation(format!(
                "unknown issue status '{value}'"
            ))),
        }
    }
}

/// An issue record as the approval workflow sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Stable issue identifier.
    pub id: String,
    /// Current lifecycle status.
    pub status: IssueStatus,
    /// Closure note propagated from the approved request.
    pub closure_note: Option<String>,
    /// Closure photo URL propagated from the approved request.
    pub closure_photo_url: Option<String>,
    /// Channel identifier that closed the issue.
    pub closed_by: Option<String>,
    /// Closure timestamp.
    pub closed_at: Option<DateTime<Utc>>,
    /// Last mutation timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

impl Issue {
    /// Creates an open issue.
    #[must_use]
    pub fn open(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: IssueStatus::Open,
            closure_note: None,
            closure_photo_url: None,
            closed_by: None,
            closed_at: None,
            updated_at: None,
        }
    }
}

/// Closure payload applied to an issue when an approval is granted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueClosure {
    /// Channel identifier recorded as the closer.
    pub closed_by: String,
    /// Closure note from the approval request.
    pub closure_note: Option<String>,
    /// Closure photo URL from the approval request.
    pub closure_photo_url: Option<String>,
}
