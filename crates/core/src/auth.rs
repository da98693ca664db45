use serde::{Deserialize, Serialize};

/// Claims extracted from a verified bearer token.
///
/// The identity provider is an external collaborator; Issuegate only relies
/// on the subject and an optional role label. Some providers nest the role
/// under a custom-claims object, so construction takes both candidates and
/// applies one resolution rule: the top-level role wins, the nested role is
/// the fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    subject: String,
    email: Option<String>,
    role: Option<String>,
}

impl IdentityClaims {
    /// Creates claims from already-resolved fields.
    #[must_use]
    pub fn new(subject: impl Into<String>, email: Option<String>, role: Option<String>) -> Self {
        Self {
            subject: subject.into(),
            email,
            role,
        }
    }

    /// Creates claims by resolving a role from a top-level and a nested candidate.
    #[must_use]
    pub fn with_role_candidates(
        subject: impl Into<String>,
        email: Option<String>,
        role: Option<String>,
        nested_role: Option<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            email,
            role: role.or(nested_role),
        }
    }

    /// Returns the stable subject claim from the identity provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the email, if the provider returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the resolved role label, if any.
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }
}
