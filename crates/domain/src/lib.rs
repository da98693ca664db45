//! Domain types and pure rules for the Issuegate authorization core.

#![forbid(unsafe_code)]

/// Approval requests and their state machine.
pub mod approval;
/// Append-only audit trail vocabulary.
pub mod audit;
/// Issue records as seen by the approval workflow.
pub mod issue;
/// Roles, the role catalog, and the effective-permission resolver.
pub mod role;
/// User accounts and their role assignments.
pub mod user;

pub use approval::{
    APPROVAL_ACTION_CLOSE, ApprovalDecision, ApprovalRequest, ApprovalStatus, NewApprovalRequest,
};
pub use audit::{AuditAction, AuditLogEntry};
pub use issue::{Issue, IssueClosure, IssueStatus};
pub use role::{EffectivePermissions, Role, RoleCatalog, RoleId, resolve_effective_permissions};
pub use user::UserAccount;
