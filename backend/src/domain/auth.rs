//! Login input validation.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to the auth gate.

use serde_json::json;
use tracing::info;

use super::ports::{CredentialStore, CredentialStoreError};
use super::{Email, Error, PlainPassword, UserValidationError};

/// Generic message shown for any credential failure.
pub const INVALID_LOGIN_MESSAGE: &str = "Invalid email or password. Please try again.";

/// Login validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    /// The username field is not an email address.
    #[error("Enter a valid email address.")]
    InvalidEmail,
    /// The password field was empty.
    #[error("This field is required.")]
    EmptyPassword,
    /// No active account matches the normalised email.
    #[error("The email address you entered does not match any account")]
    UnknownAccount,
    /// The password does not verify against the stored hash.
    #[error("Invalid email or password. Please try again.")]
    InvalidCredentials,
}

impl LoginError {
    fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidEmail => Some("username"),
            Self::EmptyPassword => Some("password"),
            Self::UnknownAccount | Self::InvalidCredentials => None,
        }
    }
}

/// Why a login attempt was turned away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginRejection {
    /// The submitted form failed validation.
    #[error(transparent)]
    Invalid(#[from] LoginError),
    /// The credential store could not be consulted.
    #[error(transparent)]
    Store(#[from] CredentialStoreError),
}

impl From<LoginRejection> for Error {
    /// Shape errors become field errors; account and credential failures
    /// collapse into one generic message so callers cannot enumerate accounts.
    fn from(value: LoginRejection) -> Self {
        match value {
            LoginRejection::Invalid(LoginError::UnknownAccount | LoginError::InvalidCredentials) => {
                Error::unauthorized(INVALID_LOGIN_MESSAGE)
            }
            LoginRejection::Invalid(err) => {
                let field = err.field().unwrap_or("__all__");
                Error::invalid_request(err.to_string()).with_details(json!({
                    "fieldErrors": { field: [err.to_string()] },
                }))
            }
            LoginRejection::Store(err) => map_store_error(err),
        }
    }
}

/// Map credential store failures onto transport-agnostic errors.
pub(crate) fn map_store_error(error: CredentialStoreError) -> Error {
    match error {
        CredentialStoreError::Connection { message } => Error::service_unavailable(message),
        CredentialStoreError::DuplicateEmail { .. } => {
            Error::conflict("This email already exists")
        }
        CredentialStoreError::Query { message } | CredentialStoreError::Hashing { message } => {
            Error::internal(message)
        }
    }
}

/// Raw login form as submitted.
#[derive(Debug, Clone)]
pub struct LoginForm {
    /// Email address; the field keeps the historical `username` name.
    pub username: String,
    /// Password as typed.
    pub password: PlainPassword,
}

/// Validated login credentials used by the auth gate.
///
/// ## Invariants
/// - `email` is trimmed, lowercased, and shaped like an address.
/// - `password` is non-empty but retains caller-provided whitespace.
///
/// # Examples
/// ```
/// use portal::domain::{LoginCredentials, PlainPassword};
///
/// let creds =
///     LoginCredentials::try_from_parts(" A@X.com ", PlainPassword::new("pw")).unwrap();
/// assert_eq!(creds.email().as_ref(), "a@x.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: Email,
    password: PlainPassword,
}

impl LoginCredentials {
    /// Construct credentials from already validated parts.
    pub fn new(email: Email, password: PlainPassword) -> Self {
        Self { email, password }
    }

    /// Construct credentials from raw inputs.
    pub fn try_from_parts(username: &str, password: PlainPassword) -> Result<Self, LoginError> {
        let email = Email::parse(username).map_err(|err| match err {
            UserValidationError::Empty
            | UserValidationError::TooLong { .. }
            | UserValidationError::InvalidEmail
            | UserValidationError::InvalidId
            | UserValidationError::InvalidMobile => LoginError::InvalidEmail,
        })?;
        if password.is_empty() {
            return Err(LoginError::EmptyPassword);
        }
        Ok(Self { email, password })
    }

    /// Normalised email used for lookups.
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &PlainPassword {
        &self.password
    }
}

/// Validate a login form against the credential store.
///
/// Checks the email shape, then that an active account exists for it. The
/// password itself is verified by the auth gate.
pub async fn validate_login(
    form: LoginForm,
    store: &dyn CredentialStore,
) -> Result<LoginCredentials, LoginRejection> {
    let credentials = LoginCredentials::try_from_parts(&form.username, form.password)?;
    if store.find_active_by_email(credentials.email()).await?.is_none() {
        info!("login attempted for unknown or inactive account");
        return Err(LoginError::UnknownAccount.into());
    }
    Ok(credentials)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for login validation.
    use super::*;
    use crate::domain::ports::MockCredentialStore;
    use crate::domain::{
        AccountStatus, DisplayName, ErrorCode, Mobile, ProfileText, Role, User, UserId,
        UserProfile,
    };
    use chrono::Utc;
    use rstest::rstest;

    fn form(username: &str, password: &str) -> LoginForm {
        LoginForm {
            username: username.to_owned(),
            password: PlainPassword::new(password),
        }
    }

    fn user(email: &str) -> User {
        let profile = UserProfile {
            name: DisplayName::new("Ada").expect("name"),
            email: Email::parse(email).expect("email"),
            role: Role::Student,
            country: ProfileText::new("UK").expect("country"),
            nationality: ProfileText::new("British").expect("nationality"),
            mobile: Mobile::new("5551234").expect("mobile"),
        };
        User::new(UserId::random(), profile, AccountStatus::default(), Utc::now())
    }

    #[rstest]
    #[case("", "pw", LoginError::InvalidEmail)]
    #[case("not-an-email", "pw", LoginError::InvalidEmail)]
    #[case("a@x.com", "", LoginError::EmptyPassword)]
    fn malformed_credentials_are_rejected(
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected: LoginError,
    ) {
        let err = LoginCredentials::try_from_parts(username, PlainPassword::new(password))
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[tokio::test]
    async fn unknown_account_is_rejected() {
        let mut store = MockCredentialStore::new();
        store
            .expect_find_active_by_email()
            .returning(|_| Ok(None));

        let err = validate_login(form("a@x.com", "pw"), &store)
            .await
            .expect_err("no account");
        assert_eq!(err, LoginRejection::Invalid(LoginError::UnknownAccount));
    }

    #[tokio::test]
    async fn lookup_uses_normalised_email() {
        let mut store = MockCredentialStore::new();
        store
            .expect_find_active_by_email()
            .withf(|email| email.as_ref() == "a@x.com")
            .returning(|email| Ok(Some(user(email.as_ref()))));

        let creds = validate_login(form("  A@X.COM ", "pw"), &store)
            .await
            .expect("account exists");
        assert_eq!(creds.email().as_ref(), "a@x.com");
    }

    #[rstest]
    #[case(LoginError::UnknownAccount)]
    #[case(LoginError::InvalidCredentials)]
    fn account_failures_share_one_generic_message(#[case] err: LoginError) {
        let error = Error::from(LoginRejection::Invalid(err));
        assert_eq!(error.code(), ErrorCode::Unauthorized);
        assert_eq!(error.message(), INVALID_LOGIN_MESSAGE);
        assert!(error.details().is_none());
    }

    #[rstest]
    fn shape_failures_are_field_errors() {
        let error = Error::from(LoginRejection::Invalid(LoginError::InvalidEmail));
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        let details = error.details().expect("details");
        assert_eq!(
            details["fieldErrors"]["username"][0],
            "Enter a valid email address."
        );
    }

    #[rstest]
    #[case(CredentialStoreError::connection("down"), ErrorCode::ServiceUnavailable)]
    #[case(CredentialStoreError::query("bad"), ErrorCode::InternalError)]
    #[case(CredentialStoreError::hashing("bad"), ErrorCode::InternalError)]
    #[case(CredentialStoreError::duplicate_email("a@x.com"), ErrorCode::Conflict)]
    fn store_failures_map_to_domain_codes(
        #[case] error: CredentialStoreError,
        #[case] expected: ErrorCode,
    ) {
        assert_eq!(map_store_error(error).code(), expected);
    }
}
