//! Application services and ports for the Issuegate authorization core.
//!
//! Every service here is transport-agnostic: the three original hosts of
//! this logic collapse into thin adapters over [`ApprovalService`],
//! [`PermissionService`], and [`AdminGuard`], with collaborators injected
//! through the port traits.

#![forbid(unsafe_code)]

mod approval_service;
mod audit;
mod guard;
mod permission_service;

pub use approval_service::{
    AppSettings, ApprovalNotification, ApprovalNotifier, ApprovalReceipt, ApprovalRepository,
    ApprovalService, CreateApprovalInput, DecisionOutcome, IssueRepository, SettingsSource,
    CLOSED_BY_CHANNEL, DECIDED_BY_CHANNEL,
};
pub use audit::AuditRepository;
pub use issuegate_domain::ApprovalDecision;
pub use guard::{AdminGuard, IdentityVerifier, ADMIN_ROLE_ALLOW_LIST};
pub use permission_service::{
    PermissionService, RecomputeInput, RecomputeOutcome, RoleCatalogSource, UserDirectory,
};
