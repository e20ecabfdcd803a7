//! Bcrypt password hashing.
//!
//! Hashing is CPU bound, so both operations run on the blocking thread pool.
//! bcrypt ignores input past 72 bytes; longer passwords are refused rather
//! than silently truncated.

use crate::domain::PlainPassword;
use crate::domain::ports::CredentialStoreError;
use crate::domain::registration::PASSWORD_MAX_BYTES;

/// Cost used when none is configured.
pub const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
/// Lowest cost bcrypt accepts.
pub const MIN_COST: u32 = 4;
/// Highest cost bcrypt accepts.
pub const MAX_COST: u32 = 31;

/// Salted bcrypt hasher with a fixed work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}

impl PasswordHasher {
    /// Create a hasher with the given bcrypt cost (4 to 31).
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Configured bcrypt cost.
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash `password` with a fresh salt.
    pub async fn hash(&self, password: &PlainPassword) -> Result<String, CredentialStoreError> {
        if password.expose().len() > PASSWORD_MAX_BYTES {
            return Err(CredentialStoreError::hashing(format!(
                "password exceeds {PASSWORD_MAX_BYTES} bytes"
            )));
        }
        let password = password.clone();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password.expose(), cost))
            .await
            .map_err(|err| CredentialStoreError::hashing(format!("hash task failed: {err}")))?
            .map_err(|err| CredentialStoreError::hashing(err.to_string()))
    }

    /// Check `password` against a stored bcrypt `hash`.
    ///
    /// A password longer than bcrypt reads never matches.
    pub async fn verify(
        &self,
        password: &PlainPassword,
        hash: &str,
    ) -> Result<bool, CredentialStoreError> {
        if password.expose().len() > PASSWORD_MAX_BYTES {
            return Ok(false);
        }
        let password = password.clone();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(password.expose(), &hash))
            .await
            .map_err(|err| CredentialStoreError::hashing(format!("verify task failed: {err}")))?
            .map_err(|err| CredentialStoreError::hashing(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[tokio::test]
    async fn hash_never_contains_the_plaintext() {
        let password = PlainPassword::new("Secret123!");
        let hash = hasher().hash(&password).await.expect("hash");
        assert!(!hash.contains("Secret123!"));
        assert!(hash.starts_with("$2"));
    }

    #[rstest]
    #[case("Secret123!", true)]
    #[case("secret123!", false)]
    #[case("", false)]
    #[tokio::test]
    async fn verify_matches_only_the_original(#[case] attempt: &str, #[case] expected: bool) {
        let hash = hasher()
            .hash(&PlainPassword::new("Secret123!"))
            .await
            .expect("hash");
        let verified = hasher()
            .verify(&PlainPassword::new(attempt), &hash)
            .await
            .expect("verify");
        assert_eq!(verified, expected);
    }

    #[tokio::test]
    async fn same_password_hashes_differently() {
        let password = PlainPassword::new("Secret123!");
        let first = hasher().hash(&password).await.expect("hash");
        let second = hasher().hash(&password).await.expect("hash");
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn bytes_past_the_bcrypt_limit_are_not_ignored() {
        let stored = "p".repeat(PASSWORD_MAX_BYTES);
        let hash = hasher()
            .hash(&PlainPassword::new(stored.clone()))
            .await
            .expect("hash at the limit");

        let extended = PlainPassword::new(format!("{stored}-suffix"));
        assert!(!hasher().verify(&extended, &hash).await.expect("verify"));
        let err = hasher().hash(&extended).await.expect_err("over the limit");
        assert!(matches!(err, CredentialStoreError::Hashing { .. }));
    }

    #[tokio::test]
    async fn malformed_hash_is_a_hashing_error() {
        let err = hasher()
            .verify(&PlainPassword::new("pw"), "not-a-hash")
            .await
            .expect_err("malformed hash");
        assert!(matches!(err, CredentialStoreError::Hashing { .. }));
    }
}
