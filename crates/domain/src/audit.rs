use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable audit actions emitted by the approval workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when an out-of-band approval decision lands.
    ApprovalDecision,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApprovalDecision => "approval_decision",
        }
    }
}

/// Immutable audit entry recording one state transition.
///
/// Actor fields are nullable: system-initiated transitions, like decisions
/// arriving through a clicked link, carry no authenticated actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Stable action identifier.
    pub action: AuditAction,
    /// Entity type label.
    pub entity_type: String,
    /// Entity identifier.
    pub entity_id: String,
    /// State before the transition.
    pub before: Value,
    /// State after the transition.
    pub after: Value,
    /// Actor email, if authenticated.
    pub actor_email: Option<String>,
    /// Actor uid, if authenticated.
    pub actor_uid: Option<String>,
}
