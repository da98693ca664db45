use async_trait::async_trait;
use issuegate_application::{RoleCatalogSource, UserDirectory};
use issuegate_core::{AppError, AppResult};
use issuegate_domain::{EffectivePermissions, Role, RoleCatalog, RoleId, UserAccount};
use sqlx::PgPool;

/// PostgreSQL-backed user directory and role catalog.
#[derive(Clone)]
pub struct PostgresDirectoryRepository {
    pool: PgPool,
}

impl PostgresDirectoryRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    uid: String,
    roles: serde_json::Value,
    effective_perms: serde_json::Value,
}

impl TryFrom<UserRow> for UserAccount {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let roles: Vec<RoleId> = serde_json::from_value(row.roles)
            .map_err(|error| AppError::Internal(format!("corrupt user roles: {error}")))?;
        let effective_perms: EffectivePermissions = serde_json::from_value(row.effective_perms)
            .map_err(|error| AppError::Internal(format!("corrupt permission cache: {error}")))?;

        Ok(Self {
            uid: row.uid,
            roles,
            effective_perms,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RoleRow {
    id: String,
    label: String,
    permissions: serde_json::Value,
    inherits: serde_json::Value,
}

impl TryFrom<RoleRow> for Role {
    type Error = AppError;

    fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
        let permissions = serde_json::from_value(row.permissions)
            .map_err(|error| AppError::Internal(format!("corrupt role permissions: {error}")))?;
        let inherits: Vec<RoleId> = serde_json::from_value(row.inherits)
            .map_err(|error| AppError::Internal(format!("corrupt role inherits: {error}")))?;

        Ok(Self {
            id: RoleId::new(row.id),
            label: row.label,
            permissions,
            inherits,
        })
    }
}

#[async_trait]
impl UserDirectory for PostgresDirectoryRepository {
    async fn find_user(&self, uid: &str) -> AppResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT uid, roles, effective_perms
            FROM users
            WHERE uid = $1
            "#,
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load user: {error}")))?;

        row.map(UserAccount::try_from).transpose()
    }

    async fn list_users(&self) -> AppResult<Vec<UserAccount>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT uid, roles, effective_perms
            FROM users
            ORDER BY uid
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list users: {error}")))?;

        rows.into_iter().map(UserAccount::try_from).collect()
    }

    async fn save_effective_permissions(
        &self,
        uid: &str,
        permissions: &EffectivePermissions,
    ) -> AppResult<()> {
        let encoded = serde_json::to_value(permissions)
            .map_err(|error| AppError::Internal(format!("failed to encode cache: {error}")))?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET effective_perms = $2, updated_at = now()
            WHERE uid = $1
            "#,
        )
        .bind(uid)
        .bind(encoded)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist permission cache: {error}"))
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user '{uid}' does not exist")));
        }

        Ok(())
    }
}

#[async_trait]
impl RoleCatalogSource for PostgresDirectoryRepository {
    async fn load_catalog(&self) -> AppResult<RoleCatalog> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, label, permissions, inherits
            FROM roles
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role catalog: {error}")))?;

        let roles = rows
            .into_iter()
            .map(Role::try_from)
            .collect::<AppResult<Vec<Role>>>()?;

        Ok(RoleCatalog::from_roles(roles))
    }
}
