//! Role catalog and the effective-permission resolver.
//!
//! Roles form a directed graph through `inherits`; the graph may contain
//! cycles and stale references, and the resolver must tolerate both.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Stable role identifier, the document key in the role catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(String);

impl RoleId {
    /// Creates a role identifier from its storage key.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the underlying storage key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A named bundle of direct permission flags plus inherited roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable role identifier.
    pub id: RoleId,
    /// Human-readable role label.
    pub label: String,
    /// Direct permission flags; only `true` flags grant anything.
    pub permissions: BTreeMap<String, bool>,
    /// Roles this role inherits permissions from, in catalog key order.
    pub inherits: Vec<RoleId>,
}

/// Read-only snapshot of every role, keyed by role id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleCatalog {
    roles: HashMap<RoleId, Role>,
}

impl RoleCatalog {
    /// Builds a catalog snapshot from a role list.
    #[must_use]
    pub fn from_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles
                .into_iter()
                .map(|role| (role.id.clone(), role))
                .collect(),
        }
    }

    /// Looks up a role by id.
    #[must_use]
    pub fn get(&self, id: &RoleId) -> Option<&Role> {
        self.roles.get(id)
    }

    /// Returns the number of roles in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Returns whether the snapshot is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Flattened permission set for one user.
///
/// Contains only keys some reachable role explicitly set `true`; an absent
/// key means the permission is not granted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectivePermissions(BTreeMap<String, bool>);

impl EffectivePermissions {
    /// Returns whether the permission key is granted.
    #[must_use]
    pub fn is_granted(&self, key: &str) -> bool {
        self.0.get(key).copied().unwrap_or(false)
    }

    /// Returns the underlying flag map.
    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<String, bool> {
        &self.0
    }

    /// Returns whether no permission is granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for EffectivePermissions {
    fn from_iter<T: IntoIterator<Item = String>>(keys: T) -> Self {
        Self(keys.into_iter().map(|key| (key, true)).collect())
    }
}

/// Resolves the effective permission set for one user's assigned roles.
///
/// Depth-first traversal over the inheritance graph with a seen-set, so
/// cyclic graphs terminate and shared ancestors are visited once. Permission
/// flags merge with logical OR per key, which makes the result independent
/// of traversal order. Role ids missing from the catalog are skipped.
#[must_use]
pub fn resolve_effective_permissions(
    catalog: &RoleCatalog,
    assigned: &[RoleId],
) -> EffectivePermissions {
    let mut seen: HashSet<&RoleId> = HashSet::new();
    let mut granted: BTreeMap<String, bool> = BTreeMap::new();
    let mut stack: Vec<&RoleId> = assigned.iter().rev().collect();

    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }

        let Some(role) = catalog.get(id) else {
            continue;
        };

        for (key, enabled) in &role.permissions {
            if *enabled {
                granted.insert(key.clone(), true);
            }
        }

        for parent in role.inherits.iter().rev() {
            stack.push(parent);
        }
    }

    EffectivePermissions(granted)
}
