use issuegate_core::{AppError, AppResult};

/// Generates a decision secret and its SHA-256 hash.
///
/// The secret is 24 random bytes, hex-encoded; only the hash is ever
/// persisted. Returns `(raw_token_hex, sha256_hash_hex)`.
pub(super) fn generate_decision_token() -> AppResult<(String, String)> {
    use std::fmt::Write;

    let mut bytes = [0u8; 24];
    getrandom::fill(&mut bytes).map_err(|error| {
        AppError::Internal(format!("failed to generate decision token: {error}"))
    })?;

    let raw_token = bytes
        .iter()
        .fold(String::with_capacity(48), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        });

    let hash = hash_decision_token(&raw_token);
    Ok((raw_token, hash))
}

/// Computes the SHA-256 hex hash of a presented decision token.
pub(super) fn hash_decision_token(raw_token: &str) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write;

    let mut hasher = Sha256::new();
    hasher.update(raw_token.as_bytes());
    let result = hasher.finalize();

    result
        .iter()
        .fold(String::with_capacity(64), |mut acc, byte| {
            let _ = write!(acc, "{byte:02x}");
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::{generate_decision_token, hash_decision_token};

    #[test]
    fn generated_token_matches_its_hash() {
        let generated = generate_decision_token();
        assert!(generated.is_ok());
        if let Ok((raw, hash)) = generated {
            assert_eq!(raw.len(), 48);
            assert_eq!(hash.len(), 64);
            assert_eq!(hash_decision_token(&raw), hash);
        }
    }

    #[test]
    fn hashing_is_deterministic_and_collision_visible() {
        assert_eq!(hash_decision_token("abc"), hash_decision_token("abc"));
        assert_ne!(hash_decision_token("abc"), hash_decision_token("abd"));
    }
}
