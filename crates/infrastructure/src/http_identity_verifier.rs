use std::time::Duration;

use async_trait::async_trait;
use issuegate_application::IdentityVerifier;
use issuegate_core::{AppError, AppResult, IdentityClaims};
use serde::Deserialize;
use serde_json::json;

/// Verifies bearer tokens against an identity provider's introspection endpoint.
///
/// The provider owns the cryptographic trust chain; this adapter only maps
/// its claims response onto [`IdentityClaims`], applying the role
/// resolution rule at the boundary (top-level `role` first, then the
/// nested custom-claims `role`).
pub struct HttpIdentityVerifier {
    http_client: reqwest::Client,
    introspection_url: String,
}

#[derive(Deserialize)]
struct NestedClaims {
    role: Option<String>,
}

#[derive(Deserialize)]
struct IntrospectionResponse {
    sub: String,
    email: Option<String>,
    role: Option<String>,
    claims: Option<NestedClaims>,
}

impl HttpIdentityVerifier {
    /// Creates a verifier for the given introspection endpoint.
    #[must_use]
    pub fn new(http_client: reqwest::Client, introspection_url: impl Into<String>) -> Self {
        Self {
            http_client,
            introspection_url: introspection_url.into(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, bearer: &str) -> AppResult<IdentityClaims> {
        let response = self
            .http_client
            .post(self.introspection_url.as_str())
            .timeout(Duration::from_secs(5))
            .json(&json!({ "token": bearer }))
            .send()
            .await
            .map_err(|error| {
                AppError::Internal(format!("identity provider unreachable: {error}"))
            })?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized("invalid identity token".to_owned()));
        }

        let body: IntrospectionResponse = response.json().await.map_err(|error| {
            AppError::Internal(format!("malformed identity provider response: {error}"))
        })?;

        Ok(IdentityClaims::with_role_candidates(
            body.sub,
            body.email,
            body.role,
            body.claims.and_then(|nested| nested.role),
        ))
    }
}
