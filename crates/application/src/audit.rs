use async_trait::async_trait;
use issuegate_core::AppResult;
use issuegate_domain::AuditLogEntry;

/// Port for persisting append-only audit entries.
///
/// Timestamps are assigned by the backing store; entries are never updated
/// or deleted.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit entry.
    async fn append(&self, entry: AuditLogEntry) -> AppResult<()>;
}
