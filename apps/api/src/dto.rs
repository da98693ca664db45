//! Wire DTOs matching the original system's JSON field names.

use serde::{Deserialize, Serialize};

/// Request body for creating a closure approval.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApprovalRequest {
    /// Issue to close once approved.
    pub issue_id: String,
    /// Optional closure note.
    #[serde(default)]
    pub closure_note: Option<String>,
    /// Optional closure photo URL.
    #[serde(default)]
    pub closure_photo_url: Option<String>,
    /// Optional requesting actor.
    #[serde(default)]
    pub requested_by: Option<String>,
}

/// Response body for a created approval.
#[derive(Debug, Serialize)]
pub struct CreateApprovalResponse {
    /// Store-assigned approval id.
    pub id: String,
    /// Always `"pending"` on creation.
    pub status: &'static str,
}

/// Query parameters on a clicked decision link.
///
/// All fields are optional so that a malformed link still reaches the
/// handler and gets a readable error page instead of a rejection body.
#[derive(Debug, Deserialize)]
pub struct DecisionParams {
    /// Approval request id.
    #[serde(default)]
    pub id: Option<String>,
    /// Decision literal, `approve` or `reject`.
    #[serde(default)]
    pub decision: Option<String>,
    /// Raw decision secret.
    #[serde(default)]
    pub token: Option<String>,
}

/// Request body for permission recomputation.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeRequest {
    /// Restrict the run to a single user.
    #[serde(default)]
    pub uid: Option<String>,
    /// Compute without persisting.
    #[serde(default)]
    pub dry_run: bool,
}

/// Health check payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Fixed status marker.
    pub status: &'static str,
}
