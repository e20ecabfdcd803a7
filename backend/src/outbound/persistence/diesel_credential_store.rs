//! PostgreSQL-backed `CredentialStore` using Diesel.
//!
//! Emails are stored lowercased behind a unique index, so the database
//! settles concurrent registrations for the same address.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::{debug, warn};

use crate::domain::ports::{CredentialStore, CredentialStoreError};
use crate::domain::{
    AccountStatus, DisplayName, Email, Mobile, PlainPassword, ProfileText, Role, User, UserId,
    UserProfile,
};
use crate::outbound::password::PasswordHasher;

use super::models::{NewUserRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel implementation of the [`CredentialStore`] port.
#[derive(Clone)]
pub struct DieselCredentialStore {
    pool: DbPool,
    hasher: PasswordHasher,
}

impl DieselCredentialStore {
    /// Create a store over `pool`, hashing with `hasher`.
    pub fn new(pool: DbPool, hasher: PasswordHasher) -> Self {
        Self { pool, hasher }
    }

    async fn active_row(&self, email: &Email) -> Result<Option<UserRow>, CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .filter(users::email.eq(email.as_ref()))
            .filter(users::is_active.eq(true))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)
    }
}

fn map_pool_error(error: PoolError) -> CredentialStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            CredentialStoreError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> CredentialStoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => CredentialStoreError::query("record not found"),
        DieselError::QueryBuilderError(_) => CredentialStoreError::query("database query error"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            CredentialStoreError::connection("database connection error")
        }
        _ => CredentialStoreError::query("database error"),
    }
}

/// Insert errors additionally surface unique violations as duplicates.
fn map_insert_error(error: diesel::result::Error, email: &Email) -> CredentialStoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            CredentialStoreError::duplicate_email(email.as_ref())
        }
        other => map_diesel_error(other),
    }
}

fn corrupt(field: &str, err: impl std::fmt::Display) -> CredentialStoreError {
    CredentialStoreError::query(format!("stored {field} is invalid: {err}"))
}

fn row_to_user(row: UserRow) -> Result<User, CredentialStoreError> {
    let role: Role = row.role.parse().map_err(|err| {
        warn!(user_id = %row.id, value = %row.role, "stored role is outside the known set");
        corrupt("role", err)
    })?;
    let profile = UserProfile {
        name: DisplayName::new(&row.name).map_err(|err| corrupt("name", err))?,
        email: Email::parse(&row.email).map_err(|err| corrupt("email", err))?,
        role,
        country: ProfileText::new(&row.country).map_err(|err| corrupt("country", err))?,
        nationality: ProfileText::new(&row.nationality)
            .map_err(|err| corrupt("nationality", err))?,
        mobile: Mobile::new(&row.mobile).map_err(|err| corrupt("mobile", err))?,
    };
    let status = AccountStatus {
        is_active: row.is_active,
        is_staff: row.is_staff,
        is_superuser: row.is_superuser,
    };
    Ok(
        User::new(UserId::from_uuid(row.id), profile, status, row.date_joined)
            .with_last_login(row.last_login),
    )
}

#[async_trait]
impl CredentialStore for DieselCredentialStore {
    async fn ping(&self) -> Result<(), CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(drop)
            .map_err(map_diesel_error)
    }

    async fn email_exists(&self, email: &Email) -> Result<bool, CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(diesel::dsl::exists(
            users::table.filter(users::email.eq(email.as_ref())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(map_diesel_error)
    }

    async fn find_active_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<User>, CredentialStoreError> {
        self.active_row(email).await?.map(row_to_user).transpose()
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_user)
            .transpose()
    }

    async fn create(
        &self,
        profile: &UserProfile,
        password: &PlainPassword,
    ) -> Result<User, CredentialStoreError> {
        let password_hash = self.hasher.hash(password).await?;
        let status = AccountStatus::default();
        let row = NewUserRow {
            id: *UserId::random().as_uuid(),
            email: profile.email.as_ref(),
            password_hash: &password_hash,
            name: profile.name.as_ref(),
            role: profile.role.as_str(),
            country: profile.country.as_ref(),
            nationality: profile.nationality.as_ref(),
            mobile: profile.mobile.as_ref(),
            is_active: status.is_active,
            is_staff: status.is_staff,
            is_superuser: status.is_superuser,
            date_joined: Utc::now(),
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let stored = diesel::insert_into(users::table)
            .values(&row)
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(|err| map_insert_error(err, &profile.email))?;
        row_to_user(stored)
    }

    async fn verify_password(
        &self,
        email: &Email,
        password: &PlainPassword,
    ) -> Result<Option<User>, CredentialStoreError> {
        let Some(row) = self.active_row(email).await? else {
            return Ok(None);
        };
        if !self.hasher.verify(password, &row.password_hash).await? {
            return Ok(None);
        }
        row_to_user(row).map(Some)
    }

    async fn record_login(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), CredentialStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.find(*id.as_uuid()))
            .set(users::last_login.eq(Some(at)))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if updated == 0 {
            return Err(CredentialStoreError::query(format!("no account with id {id}")));
        }
        Ok(())
    }
}
