use issuegate_application::{AdminGuard, ApprovalService, PermissionService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub approval_service: ApprovalService,
    pub permission_service: PermissionService,
    pub admin_guard: AdminGuard,
}
