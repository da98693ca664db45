use std::sync::Arc;

use async_trait::async_trait;
use issuegate_core::{AppError, AppResult};
use issuegate_domain::{EffectivePermissions, RoleCatalog, UserAccount, resolve_effective_permissions};
use serde::{Deserialize, Serialize};

/// Port for reading and updating user role assignments.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Finds a single user by uid.
    async fn find_user(&self, uid: &str) -> AppResult<Option<UserAccount>>;

    /// Lists every user in the directory.
    async fn list_users(&self) -> AppResult<Vec<UserAccount>>;

    /// Persists a user's effective-permission cache, merge-style.
    ///
    /// Only the cache field and the update timestamp change; all other
    /// user fields are left untouched.
    async fn save_effective_permissions(
        &self,
        uid: &str,
        permissions: &EffectivePermissions,
    ) -> AppResult<()>;
}

/// Port for loading the current role catalog snapshot.
#[async_trait]
pub trait RoleCatalogSource: Send + Sync {
    /// Loads all roles as a read-only snapshot.
    async fn load_catalog(&self) -> AppResult<RoleCatalog>;
}

/// Parameters for one recompute run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecomputeInput {
    /// Restrict the run to a single user.
    pub uid: Option<String>,
    /// Compute without persisting.
    pub dry_run: bool,
}

/// Result of one recompute run.
///
/// `updated` counts processed users regardless of `dry_run`, so callers can
/// preview a bulk run before committing it. The bulk run is not atomic: a
/// failure partway through leaves earlier users updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeOutcome {
    /// Number of users processed.
    pub updated: usize,
    /// Whether writes were skipped.
    pub dry_run: bool,
    /// Whether the run targeted a single user.
    pub scoped: bool,
}

/// Materializes effective permissions onto user records.
///
/// Recomputation is deterministic and idempotent, so overlapping or
/// repeated runs are safe to retry. Runs are not audited; only per-issue
/// state changes reach the audit log.
#[derive(Clone)]
pub struct PermissionService {
    directory: Arc<dyn UserDirectory>,
    catalog_source: Arc<dyn RoleCatalogSource>,
}

impl PermissionService {
    /// Creates a service over a user directory and role catalog source.
    #[must_use]
    pub fn new(directory: Arc<dyn UserDirectory>, catalog_source: Arc<dyn RoleCatalogSource>) -> Self {
        Self {
            directory,
            catalog_source,
        }
    }

    /// Recomputes effective permissions for one user or the whole directory.
    pub async fn recompute(&self, input: RecomputeInput) -> AppResult<RecomputeOutcome> {
        let catalog = self.catalog_source.load_catalog().await?;

        let scoped = input.uid.is_some();
        let targets = match input.uid {
            Some(uid) => {
                let user = self.directory.find_user(uid.as_str()).await?.ok_or_else(|| {
                    AppError::NotFound(format!("user '{uid}' does not exist"))
                })?;
                vec![user]
            }
            None => self.directory.list_users().await?,
        };

        let mut updated = 0usize;
        for user in &targets {
            let effective = resolve_effective_permissions(&catalog, &user.roles);
            if !input.dry_run {
                self.directory
                    .save_effective_permissions(user.uid.as_str(), &effective)
                    .await?;
            }
            updated += 1;
        }

        Ok(RecomputeOutcome {
            updated,
            dry_run: input.dry_run,
            scoped,
        })
    }
}
