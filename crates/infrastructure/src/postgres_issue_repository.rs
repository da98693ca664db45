use async_trait::async_trait;
use issuegate_application::IssueRepository;
use issuegate_core::{AppError, AppResult};
use issuegate_domain::{IssueClosure, IssueStatus};
use sqlx::PgPool;

/// PostgreSQL-backed issue store covering the workflow's two mutations.
#[derive(Clone)]
pub struct PostgresIssueRepository {
    pool: PgPool,
}

impl PostgresIssueRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IssueRepository for PostgresIssueRepository {
    async fn mark_pending_approval(&self, issue_id: &str) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE issues
            SET status = $2, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(issue_id)
        .bind(IssueStatus::PendingApproval.as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to update issue: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "issue '{issue_id}' does not exist"
            )));
        }

        Ok(())
    }

    async fn close(&self, issue_id: &str, closure: &IssueClosure) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE issues
            SET status = $2,
                closed_by = $3,
                closure_note = $4,
                closure_photo_url = $5,
                closed_at = now(),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(issue_id)
        .bind(IssueStatus::Closed.as_str())
        .bind(closure.closed_by.as_str())
        .bind(closure.closure_note.as_deref())
        .bind(closure.closure_photo_url.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to close issue: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "issue '{issue_id}' does not exist"
            )));
        }

        Ok(())
    }
}
