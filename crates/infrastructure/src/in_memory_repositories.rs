//! In-memory adapters for development and tests.
//!
//! All coordination happens through `tokio::sync::RwLock`, so the
//! compare-and-swap in [`InMemoryApprovalRepository::record_decision`] is
//! atomic: the still-pending check and the write happen under one write
//! lock.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use issuegate_application::{
    AppSettings, ApprovalRepository, AuditRepository, IssueRepository, RoleCatalogSource,
    SettingsSource, UserDirectory,
};
use issuegate_core::{AppError, AppResult};
use issuegate_domain::{
    APPROVAL_ACTION_CLOSE, ApprovalRequest, ApprovalStatus, AuditLogEntry, EffectivePermissions,
    Issue, IssueClosure, IssueStatus, NewApprovalRequest, Role, RoleCatalog, RoleId, UserAccount,
};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory user directory and role catalog.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<String, UserAccount>>,
    roles: RwLock<HashMap<RoleId, Role>>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a user account.
    pub async fn upsert_user(&self, user: UserAccount) {
        self.users.write().await.insert(user.uid.clone(), user);
    }

    /// Inserts or replaces a catalog role.
    pub async fn upsert_role(&self, role: Role) {
        self.roles.write().await.insert(role.id.clone(), role);
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_user(&self, uid: &str) -> AppResult<Option<UserAccount>> {
        Ok(self.users.read().await.get(uid).cloned())
    }

    async fn list_users(&self) -> AppResult<Vec<UserAccount>> {
        let users = self.users.read().await;
        let mut listed: Vec<UserAccount> = users.values().cloned().collect();
        listed.sort_by(|left, right| left.uid.cmp(&right.uid));
        Ok(listed)
    }

    async fn save_effective_permissions(
        &self,
        uid: &str,
        permissions: &EffectivePermissions,
    ) -> AppResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(uid)
            .ok_or_else(|| AppError::NotFound(format!("user '{uid}' does not exist")))?;
        user.effective_perms = permissions.clone();
        Ok(())
    }
}

#[async_trait]
impl RoleCatalogSource for InMemoryDirectory {
    async fn load_catalog(&self) -> AppResult<RoleCatalog> {
        Ok(RoleCatalog::from_roles(
            self.roles.read().await.values().cloned(),
        ))
    }
}

/// In-memory approval request store.
#[derive(Debug, Default)]
pub struct InMemoryApprovalRepository {
    requests: RwLock<HashMap<String, ApprovalRequest>>,
}

impl InMemoryApprovalRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApprovalRepository for InMemoryApprovalRepository {
    async fn create(&self, request: NewApprovalRequest) -> AppResult<String> {
        let id = Uuid::new_v4().to_string();
        self.requests.write().await.insert(
            id.clone(),
            ApprovalRequest {
                id: id.clone(),
                issue_id: request.issue_id,
                action: APPROVAL_ACTION_CLOSE.to_owned(),
                status: ApprovalStatus::Pending,
                requested_by: request.requested_by,
                requested_at: Some(Utc::now()),
                decided_at: None,
                decided_by: None,
                closure_note: request.closure_note,
                closure_photo_url: request.closure_photo_url,
                approver_emails: request.approver_emails,
                token_hash: request.token_hash,
            },
        );
        Ok(id)
    }

    async fn find(&self, id: &str) -> AppResult<Option<ApprovalRequest>> {
        Ok(self.requests.read().await.get(id).cloned())
    }

    async fn record_decision(
        &self,
        id: &str,
        status: ApprovalStatus,
        decided_by: &str,
    ) -> AppResult<bool> {
        let mut requests = self.requests.write().await;
        let request = requests
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("approval '{id}' does not exist")))?;

        if request.status.is_terminal() {
            return Ok(false);
        }

        request.status = status;
        request.decided_by = Some(decided_by.to_owned());
        request.decided_at = Some(Utc::now());
        Ok(true)
    }
}

/// In-memory issue store covering the workflow's two mutations.
#[derive(Debug, Default)]
pub struct InMemoryIssueRepository {
    issues: RwLock<HashMap<String, Issue>>,
}

impl InMemoryIssueRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an issue record.
    pub async fn upsert(&self, issue: Issue) {
        self.issues.write().await.insert(issue.id.clone(), issue);
    }

    /// Fetches an issue by id.
    pub async fn get(&self, issue_id: &str) -> Option<Issue> {
        self.issues.read().await.get(issue_id).cloned()
    }
}

#[async_trait]
impl IssueRepository for InMemoryIssueRepository {
    async fn mark_pending_approval(&self, issue_id: &str) -> AppResult<()> {
        let mut issues = self.issues.write().await;
        let issue = issues
            .get_mut(issue_id)
            .ok_or_else(|| AppError::NotFound(format!("issue '{issue_id}' does not exist")))?;
        issue.status = IssueStatus::PendingApproval;
        issue.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn close(&self, issue_id: &str, closure: &IssueClosure) -> AppResult<()> {
        let mut issues = self.issues.write().await;
        let issue = issues
            .get_mut(issue_id)
            .ok_or_else(|| AppError::NotFound(format!("issue '{issue_id}' does not exist")))?;
        issue.status = IssueStatus::Closed;
        issue.closed_by = Some(closure.closed_by.clone());
        issue.closure_note = closure.closure_note.clone();
        issue.closure_photo_url = closure.closure_photo_url.clone();
        issue.closed_at = Some(Utc::now());
        issue.updated_at = Some(Utc::now());
        Ok(())
    }
}

/// In-memory append-only audit log.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryAuditLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of appended entries, oldest first.
    pub async fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditLog {
    async fn append(&self, entry: AuditLogEntry) -> AppResult<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }
}

/// In-memory application settings record.
#[derive(Debug, Default)]
pub struct InMemorySettings {
    settings: RwLock<AppSettings>,
}

impl InMemorySettings {
    /// Creates a settings source with the given record.
    #[must_use]
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    /// Replaces the settings record.
    pub async fn replace(&self, settings: AppSettings) {
        *self.settings.write().await = settings;
    }
}

#[async_trait]
impl SettingsSource for InMemorySettings {
    async fn load(&self) -> AppResult<AppSettings> {
        Ok(self.settings.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use issuegate_application::ApprovalRepository;
    use issuegate_domain::{ApprovalStatus, NewApprovalRequest};

    use super::InMemoryApprovalRepository;

    fn pending_request(issue_id: &str) -> NewApprovalRequest {
        NewApprovalRequest {
            issue_id: issue_id.to_owned(),
            requested_by: None,
            closure_note: None,
            closure_photo_url: None,
            approver_emails: Vec::new(),
            token_hash: "0".repeat(64),
        }
    }

    #[tokio::test]
    async fn record_decision_is_single_shot() {
        let repository = InMemoryApprovalRepository::new();
        let created = repository.create(pending_request("ISS-1")).await;
        assert!(created.is_ok());
        let id = created.unwrap_or_default();

        let first = repository
            .record_decision(id.as_str(), ApprovalStatus::Approved, "teams-link")
            .await;
        assert!(matches!(first, Ok(true)));

        let second = repository
            .record_decision(id.as_str(), ApprovalStatus::Rejected, "teams-link")
            .await;
        assert!(matches!(second, Ok(false)));

        let stored = repository.find(id.as_str()).await;
        assert!(matches!(
            stored,
            Ok(Some(request)) if request.status == ApprovalStatus::Approved
        ));
    }

    #[tokio::test]
    async fn record_decision_on_unknown_id_is_not_found() {
        let repository = InMemoryApprovalRepository::new();
        let result = repository
            .record_decision("missing", ApprovalStatus::Approved, "teams-link")
            .await;
        assert!(result.is_err());
    }
}
