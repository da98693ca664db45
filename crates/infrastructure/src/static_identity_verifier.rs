use std::collections::HashMap;

use async_trait::async_trait;
use issuegate_application::IdentityVerifier;
use issuegate_core::{AppError, AppResult, IdentityClaims};

/// Development verifier backed by a fixed token-to-claims map.
///
/// Lets a local deployment exercise the guarded endpoints without a real
/// identity provider. Never use outside development.
#[derive(Debug, Default)]
pub struct StaticIdentityVerifier {
    tokens: HashMap<String, IdentityClaims>,
}

impl StaticIdentityVerifier {
    /// Creates an empty verifier that rejects every token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token and the claims it verifies to.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, claims: IdentityClaims) -> Self {
        self.tokens.insert(token.into(), claims);
        self
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify(&self, bearer: &str) -> AppResult<IdentityClaims> {
        self.tokens
            .get(bearer)
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("invalid identity token".to_owned()))
    }
}
