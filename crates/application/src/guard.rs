use std::sync::Arc;

use async_trait::async_trait;
use issuegate_core::{AppError, AppResult, IdentityClaims};

/// Role labels allowed to trigger permission recomputation.
///
/// This is deliberately a fixed allow-list rather than a lookup of the
/// caller's effective permissions: the guarded operation is the one that
/// repairs effective permissions, so it must not depend on them already
/// being correct.
pub const ADMIN_ROLE_ALLOW_LIST: &[&str] = &["Admin", "Super Admin"];

/// Port for the external identity provider.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verifies a bearer token and returns its claims.
    ///
    /// Implementations fail with [`AppError::Unauthorized`] on invalid
    /// signature or expiry.
    async fn verify(&self, bearer: &str) -> AppResult<IdentityClaims>;
}

/// Guards privileged operations behind a verified role allow-list.
#[derive(Clone)]
pub struct AdminGuard {
    verifier: Arc<dyn IdentityVerifier>,
    allowed_roles: Vec<String>,
}

impl AdminGuard {
    /// Creates a guard with the default administrative allow-list.
    #[must_use]
    pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self::with_allowed_roles(
            verifier,
            ADMIN_ROLE_ALLOW_LIST
                .iter()
                .map(|role| (*role).to_owned())
                .collect(),
        )
    }

    /// Creates a guard with an explicit role allow-list.
    #[must_use]
    pub fn with_allowed_roles(verifier: Arc<dyn IdentityVerifier>, allowed_roles: Vec<String>) -> Self {
        Self {
            verifier,
            allowed_roles,
        }
    }

    /// Verifies the bearer credential and requires an allow-listed role.
    ///
    /// Fails closed: a missing or invalid credential is `Unauthorized`, a
    /// valid credential with a disallowed (or absent) role is `Forbidden`.
    pub async fn authorize(&self, bearer: Option<&str>) -> AppResult<IdentityClaims> {
        let bearer = bearer.ok_or_else(|| {
            AppError::Unauthorized("missing Authorization: Bearer <token>".to_owned())
        })?;

        let claims = self.verifier.verify(bearer).await?;

        let role_is_allowed = claims
            .role()
            .is_some_and(|role| self.allowed_roles.iter().any(|allowed| allowed == role));

        if !role_is_allowed {
            return Err(AppError::Forbidden(format!(
                "role '{}' is not allowed to perform this operation",
                claims.role().unwrap_or("none")
            )));
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use issuegate_core::{AppError, AppResult, IdentityClaims};

    use super::{AdminGuard, IdentityVerifier};

    struct FakeVerifier {
        tokens: HashMap<String, IdentityClaims>,
    }

    #[async_trait]
    impl IdentityVerifier for FakeVerifier {
        async fn verify(&self, bearer: &str) -> AppResult<IdentityClaims> {
            self.tokens
                .get(bearer)
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("invalid identity token".to_owned()))
        }
    }

    fn guard_with(tokens: HashMap<String, IdentityClaims>) -> AdminGuard {
        AdminGuard::new(Arc::new(FakeVerifier { tokens }))
    }

    #[tokio::test]
    async fn missing_bearer_is_unauthorized() {
        let guard = guard_with(HashMap::new());
        let result = guard.authorize(None).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn invalid_token_is_unauthorized() {
        let guard = guard_with(HashMap::new());
        let result = guard.authorize(Some("bogus")).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn disallowed_role_is_forbidden() {
        let guard = guard_with(HashMap::from([(
            "t1".to_owned(),
            IdentityClaims::new("u1", None, Some("Engineer".to_owned())),
        )]));
        let result = guard.authorize(Some("t1")).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn absent_role_claim_is_forbidden() {
        let guard = guard_with(HashMap::from([(
            "t1".to_owned(),
            IdentityClaims::new("u1", None, None),
        )]));
        let result = guard.authorize(Some("t1")).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn allow_listed_roles_pass() {
        for role in ["Admin", "Super Admin"] {
            let guard = guard_with(HashMap::from([(
                "t1".to_owned(),
                IdentityClaims::new("u1", None, Some(role.to_owned())),
            )]));
            let claims = guard.authorize(Some("t1")).await;
            assert!(claims.is_ok_and(|claims| claims.subject() == "u1"));
        }
    }
}
