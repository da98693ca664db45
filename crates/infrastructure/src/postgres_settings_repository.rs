use async_trait::async_trait;
use issuegate_application::{AppSettings, SettingsSource};
use issuegate_core::{AppError, AppResult};
use sqlx::PgPool;

/// PostgreSQL-backed application settings record.
///
/// Settings live in a single row keyed `'app'`; an absent row yields the
/// defaults (no webhook, empty approver list), matching the document-store
/// behavior of the original system.
#[derive(Clone)]
pub struct PostgresSettingsRepository {
    pool: PgPool,
}

impl PostgresSettingsRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SettingsRow {
    notification_webhook_url: Option<String>,
    approver_emails: serde_json::Value,
}

#[async_trait]
impl SettingsSource for PostgresSettingsRepository {
    async fn load(&self) -> AppResult<AppSettings> {
        let row = sqlx::query_as::<_, SettingsRow>(
            r#"
            SELECT notification_webhook_url, approver_emails
            FROM settings
            WHERE name = 'app'
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load settings: {error}")))?;

        let Some(row) = row else {
            return Ok(AppSettings::default());
        };

        let approver_emails: Vec<String> = serde_json::from_value(row.approver_emails)
            .map_err(|error| AppError::Internal(format!("corrupt approver emails: {error}")))?;

        Ok(AppSettings {
            notification_webhook_url: row.notification_webhook_url,
            approver_emails,
        })
    }
}
