//! In-memory `CredentialStore` keyed by normalised email.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use tracing::debug;

use crate::domain::ports::{CredentialStore, CredentialStoreError};
use crate::domain::{AccountStatus, Email, PlainPassword, User, UserId, UserProfile};
use crate::outbound::password::PasswordHasher;

#[derive(Debug, Clone)]
struct StoredAccount {
    user: User,
    password_hash: String,
}

/// Credential store holding accounts in a mutex-guarded map.
///
/// Uniqueness is enforced under the lock at insert time, so two concurrent
/// registrations for one email cannot both succeed.
pub struct InMemoryCredentialStore {
    accounts: Mutex<HashMap<Email, StoredAccount>>,
    hasher: PasswordHasher,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new(PasswordHasher::default(), Arc::new(DefaultClock))
    }
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    pub fn new(hasher: PasswordHasher, clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            hasher,
            clock,
        }
    }

    fn accounts(&self) -> Result<MutexGuard<'_, HashMap<Email, StoredAccount>>, CredentialStoreError> {
        self.accounts
            .lock()
            .map_err(|_| CredentialStoreError::connection("credential store lock poisoned"))
    }

    /// Deactivate the account for `email`. Accounts are never deleted.
    ///
    /// Returns whether an account was found.
    pub fn deactivate(&self, email: &Email) -> Result<bool, CredentialStoreError> {
        let mut accounts = self.accounts()?;
        let Some(account) = accounts.get_mut(email) else {
            return Ok(false);
        };
        let status = AccountStatus {
            is_active: false,
            ..account.user.status()
        };
        account.user = account.user.clone().with_status(status);
        Ok(true)
    }

    /// Number of stored accounts, active or not.
    pub fn len(&self) -> Result<usize, CredentialStoreError> {
        Ok(self.accounts()?.len())
    }

    /// Whether no account has been stored.
    pub fn is_empty(&self) -> Result<bool, CredentialStoreError> {
        Ok(self.accounts()?.is_empty())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn ping(&self) -> Result<(), CredentialStoreError> {
        self.accounts().map(drop)
    }

    async fn email_exists(&self, email: &Email) -> Result<bool, CredentialStoreError> {
        Ok(self.accounts()?.contains_key(email))
    }

    async fn find_active_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<User>, CredentialStoreError> {
        Ok(self
            .accounts()?
            .get(email)
            .map(|account| account.user.clone())
            .filter(User::is_active))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, CredentialStoreError> {
        Ok(self
            .accounts()?
            .values()
            .find(|account| account.user.id() == id)
            .map(|account| account.user.clone()))
    }

    async fn create(
        &self,
        profile: &UserProfile,
        password: &PlainPassword,
    ) -> Result<User, CredentialStoreError> {
        let password_hash = self.hasher.hash(password).await?;
        let user = User::new(
            UserId::random(),
            profile.clone(),
            AccountStatus::default(),
            self.clock.utc(),
        );

        let mut accounts = self.accounts()?;
        if accounts.contains_key(&profile.email) {
            return Err(CredentialStoreError::duplicate_email(profile.email.as_ref()));
        }
        accounts.insert(
            profile.email.clone(),
            StoredAccount {
                user: user.clone(),
                password_hash,
            },
        );
        debug!(user_id = %user.id(), "account stored in memory");
        Ok(user)
    }

    async fn verify_password(
        &self,
        email: &Email,
        password: &PlainPassword,
    ) -> Result<Option<User>, CredentialStoreError> {
        let account = self.accounts()?.get(email).cloned();
        let Some(account) = account.filter(|account| account.user.is_active()) else {
            return Ok(None);
        };
        let verified = self.hasher.verify(password, &account.password_hash).await?;
        Ok(verified.then_some(account.user))
    }

    async fn record_login(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), CredentialStoreError> {
        let mut accounts = self.accounts()?;
        let account = accounts
            .values_mut()
            .find(|account| account.user.id() == id)
            .ok_or_else(|| CredentialStoreError::query(format!("no account with id {id}")))?;
        account.user = account.user.clone().with_last_login(Some(at));
        Ok(())
    }
}
