//! Driven port for the credential store.
//!
//! The store is the system of record for accounts: it owns persistence,
//! password hashing, and password verification. The domain only ever hands it
//! plaintext passwords and never sees hashes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Email, PlainPassword, User, UserId, UserProfile};

use super::define_port_error;

define_port_error! {
    /// Errors raised by credential store adapters.
    pub enum CredentialStoreError {
        /// Store connection could not be established.
        Connection { message: String } => "credential store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "credential store query failed: {message}",
        /// An account with the same normalised email already exists.
        DuplicateEmail { email: String } => "an account already exists for {email}",
        /// Password hashing or verification failed.
        Hashing { message: String } => "password hashing failed: {message}",
    }
}

/// Persistence and verification port for user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Confirm the backing store can serve requests right now.
    async fn ping(&self) -> Result<(), CredentialStoreError>;

    /// Whether any account (active or not) uses this email.
    async fn email_exists(&self, email: &Email) -> Result<bool, CredentialStoreError>;

    /// Fetch the active account registered under `email`.
    async fn find_active_by_email(&self, email: &Email)
    -> Result<Option<User>, CredentialStoreError>;

    /// Fetch an account by identifier regardless of its activation flag.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, CredentialStoreError>;

    /// Persist a new active account, storing only a salted hash of `password`.
    ///
    /// Fails with [`CredentialStoreError::DuplicateEmail`] when the email is
    /// already taken, even if a concurrent registration won the race after
    /// validation.
    async fn create(
        &self,
        profile: &UserProfile,
        password: &PlainPassword,
    ) -> Result<User, CredentialStoreError>;

    /// Return the active account when `password` matches its stored hash.
    ///
    /// Unknown emails, inactive accounts, and wrong passwords all yield
    /// `Ok(None)`.
    async fn verify_password(
        &self,
        email: &Email,
        password: &PlainPassword,
    ) -> Result<Option<User>, CredentialStoreError>;

    /// Record a successful login.
    async fn record_login(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), CredentialStoreError>;
}
