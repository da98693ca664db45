use async_trait::async_trait;
use issuegate_application::AuditRepository;
use issuegate_core::{AppError, AppResult};
use issuegate_domain::AuditLogEntry;
use sqlx::PgPool;

/// PostgreSQL-backed append-only audit log.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditLogRepository {
    async fn append(&self, entry: AuditLogEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                action,
                entity_type,
                entity_id,
                before_state,
                after_state,
                actor_email,
                actor_uid
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.action.as_str())
        .bind(entry.entity_type)
        .bind(entry.entity_id)
        .bind(entry.before)
        .bind(entry.after)
        .bind(entry.actor_email)
        .bind(entry.actor_uid)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit entry: {error}")))?;

        Ok(())
    }
}
