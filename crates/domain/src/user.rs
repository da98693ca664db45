use serde::{Deserialize, Serialize};

use crate::role::{EffectivePermissions, RoleId};

/// A user account as seen by the permission materializer.
///
/// `effective_perms` is a derived cache of the role catalog, never the
/// source of truth; recomputing it from `roles` must always be safe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Stable user identifier from the identity provider.
    pub uid: String,
    /// Role ids assigned to the user.
    pub roles: Vec<RoleId>,
    /// Cached flattened permission set.
    pub effective_perms: EffectivePermissions,
}

impl UserAccount {
    /// Creates an account with an empty permission cache.
    #[must_use]
    pub fn new(uid: impl Into<String>, roles: Vec<RoleId>) -> Self {
        Self {
            uid: uid.into(),
            roles,
            effective_perms: EffectivePermissions::default(),
        }
    }
}
