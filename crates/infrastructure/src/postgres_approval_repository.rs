use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use issuegate_application::ApprovalRepository;
use issuegate_core::{AppError, AppResult};
use issuegate_domain::{APPROVAL_ACTION_CLOSE, ApprovalRequest, ApprovalStatus, NewApprovalRequest};
use sqlx::PgPool;

/// PostgreSQL-backed approval request store.
///
/// The decision transition is a conditional `UPDATE ... WHERE status =
/// 'pending'`, so two racing decisions can never both win: the database
/// serializes the compare-and-swap.
#[derive(Clone)]
pub struct PostgresApprovalRepository {
    pool: PgPool,
}

impl PostgresApprovalRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ApprovalRow {
    id: uuid::Uuid,
    issue_id: String,
    action: String,
    status: String,
    requested_by: Option<String>,
    requested_at: Option<DateTime<Utc>>,
    decided_at: Option<DateTime<Utc>>,
    decided_by: Option<String>,
    closure_note: Option<String>,
    closure_photo_url: Option<String>,
    approver_emails: serde_json::Value,
    token_hash: String,
}

impl TryFrom<ApprovalRow> for ApprovalRequest {
    type Error = AppError;

    fn try_from(row: ApprovalRow) -> Result<Self, Self::Error> {
        let status = ApprovalStatus::from_str(row.status.as_str())
            .map_err(|error| AppError::Internal(format!("corrupt approval row: {error}")))?;
        let approver_emails: Vec<String> = serde_json::from_value(row.approver_emails)
            .map_err(|error| AppError::Internal(format!("corrupt approver emails: {error}")))?;

        Ok(Self {
            id: row.id.to_string(),
            issue_id: row.issue_id,
            action: row.action,
            status,
            requested_by: row.requested_by,
            requested_at: row.requested_at,
            decided_at: row.decided_at,
            decided_by: row.decided_by,
            closure_note: row.closure_note,
            closure_photo_url: row.closure_photo_url,
            approver_emails,
            token_hash: row.token_hash,
        })
    }
}

fn parse_approval_id(id: &str) -> AppResult<uuid::Uuid> {
    uuid::Uuid::parse_str(id)
        .map_err(|_| AppError::NotFound(format!("approval '{id}' does not exist")))
}

#[async_trait]
impl ApprovalRepository for PostgresApprovalRepository {
    async fn create(&self, request: NewApprovalRequest) -> AppResult<String> {
        let approver_emails = serde_json::to_value(&request.approver_emails)
            .map_err(|error| AppError::Internal(format!("failed to encode emails: {error}")))?;

        let id = sqlx::query_scalar::<_, uuid::Uuid>(
            r#"
            INSERT INTO approvals (
                issue_id,
                action,
                status,
                requested_by,
                closure_note,
                closure_photo_url,
                approver_emails,
                token_hash
            )
            VALUES ($1, $2, 'pending', $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(request.issue_id)
        .bind(APPROVAL_ACTION_CLOSE)
        .bind(request.requested_by)
        .bind(request.closure_note)
        .bind(request.closure_photo_url)
        .bind(approver_emails)
        .bind(request.token_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create approval: {error}")))?;

        Ok(id.to_string())
    }

    async fn find(&self, id: &str) -> AppResult<Option<ApprovalRequest>> {
        let Ok(approval_id) = uuid::Uuid::parse_str(id) else {
            return Ok(None);
        };

        let row = sqlx::query_as::<_, ApprovalRow>(
            r#"
            SELECT
                id,
                issue_id,
                action,
                status,
                requested_by,
                requested_at,
                decided_at,
                decided_by,
                closure_note,
                closure_photo_url,
                approver_emails,
                token_hash
            FROM approvals
            WHERE id = $1
            "#,
        )
        .bind(approval_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load approval: {error}")))?;

        row.map(ApprovalRequest::try_from).transpose()
    }

    async fn record_decision(
        &self,
        id: &str,
        status: ApprovalStatus,
        decided_by: &str,
    ) -> AppResult<bool> {
        let approval_id = parse_approval_id(id)?;

        let result = sqlx::query(
            r#"
            UPDATE approvals
            SET status = $2, decided_by = $3, decided_at = now()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(approval_id)
        .bind(status.as_str())
        .bind(decided_by)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to record decision: {error}")))?;

        Ok(result.rows_affected() == 1)
    }
}
