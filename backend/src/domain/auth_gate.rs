//! Credential verification and session establishment.
//!
//! The gate is the only component that turns credentials into an
//! [`Identity`]. It consults the credential store, stamps the login time, and
//! binds the identity to the caller's session.

use std::sync::Arc;

use mockable::Clock;
use tracing::{error, info};

use super::auth::map_store_error;
use super::ports::{CredentialStore, CredentialStoreError, SessionBinding};
use super::{
    Error, Identity, LoginCredentials, LoginError, LoginForm, LoginRejection,
    RegistrationError, RegistrationErrors, RegistrationField, RegistrationForm,
    ValidatedRegistration, validate_login, validate_registration,
};

/// Message returned when a validated registration could not be saved.
pub const REGISTRATION_FAILED_MESSAGE: &str =
    "Registration failed; the account could not be saved. Please try again.";

/// Failures of [`AuthGate::register_and_login`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthGateError {
    /// Another registration claimed the email after validation passed.
    #[error("an account already exists for {email}")]
    DuplicateEmail {
        /// The email that was already taken.
        email: String,
    },
    /// The account could not be persisted.
    #[error("registration failed: {source}")]
    RegistrationFailed {
        /// The underlying store failure.
        #[source]
        source: CredentialStoreError,
    },
    /// The account was saved but signing it in failed.
    #[error("sign-in after registration failed: {0}")]
    SignIn(Error),
}

impl From<AuthGateError> for Error {
    fn from(value: AuthGateError) -> Self {
        match value {
            AuthGateError::DuplicateEmail { .. } => {
                let mut errors = RegistrationErrors::default();
                errors.push(RegistrationField::Email, RegistrationError::DuplicateEmail);
                errors.into()
            }
            AuthGateError::RegistrationFailed { .. } => {
                Error::internal(REGISTRATION_FAILED_MESSAGE)
            }
            AuthGateError::SignIn(err) => err,
        }
    }
}

/// Verifies credentials and establishes sessions.
#[derive(Clone)]
pub struct AuthGate {
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
}

impl AuthGate {
    /// Create a gate over `store`, stamping logins with `clock`.
    ///
    /// ```
    /// # use std::sync::Arc;
    /// # use mockable::DefaultClock;
    /// # use portal::domain::AuthGate;
    /// # use portal::outbound::memory::InMemoryCredentialStore;
    /// let gate = AuthGate::new(
    ///     Arc::new(InMemoryCredentialStore::default()),
    ///     Arc::new(DefaultClock),
    /// );
    /// # let _ = gate;
    /// ```
    pub fn new(store: Arc<dyn CredentialStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Credential store consulted by the gate.
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    /// Verify `credentials` and bind the resulting identity to `session`.
    ///
    /// Unknown emails, inactive accounts, and wrong passwords all return
    /// `Ok(None)` without touching the session.
    pub async fn authenticate(
        &self,
        credentials: &LoginCredentials,
        session: &dyn SessionBinding,
    ) -> Result<Option<Identity>, Error> {
        let verified = self
            .store
            .verify_password(credentials.email(), credentials.password())
            .await
            .map_err(map_store_error)?;
        let Some(user) = verified else {
            info!("credentials did not verify");
            return Ok(None);
        };

        let identity = Identity::from(&user);
        self.store
            .record_login(identity.user_id(), self.clock.utc())
            .await
            .map_err(map_store_error)?;
        session.establish(&identity)?;
        info!(user_id = %identity.user_id(), role = %identity.role(), "session established");
        Ok(Some(identity))
    }

    /// Persist a validated registration and sign the new account in.
    ///
    /// Persistence failures are logged and reported; they never fall through
    /// to a signed-out success.
    pub async fn register_and_login(
        &self,
        registration: ValidatedRegistration,
        session: &dyn SessionBinding,
    ) -> Result<Identity, AuthGateError> {
        let (profile, password) = registration.into_parts();
        let user = match self.store.create(&profile, &password).await {
            Ok(user) => user,
            Err(CredentialStoreError::DuplicateEmail { email }) => {
                info!("registration lost a race for an existing email");
                return Err(AuthGateError::DuplicateEmail { email });
            }
            Err(source) => {
                error!(error = %source, "not able to save user data");
                return Err(AuthGateError::RegistrationFailed { source });
            }
        };
        info!(user_id = %user.id(), role = %user.role(), "account registered");

        let credentials = LoginCredentials::new(profile.email, password);
        match self.authenticate(&credentials, session).await {
            Ok(Some(identity)) => Ok(identity),
            Ok(None) => {
                error!(user_id = %user.id(), "new account did not verify");
                Err(AuthGateError::SignIn(Error::internal(
                    "new account could not be signed in",
                )))
            }
            Err(err) => Err(AuthGateError::SignIn(err)),
        }
    }

    /// Validate a registration form, persist it, and sign the account in.
    pub async fn register(
        &self,
        form: RegistrationForm,
        session: &dyn SessionBinding,
    ) -> Result<Identity, Error> {
        let registration = validate_registration(form, self.store.as_ref()).await?;
        Ok(self.register_and_login(registration, session).await?)
    }

    /// Validate a login form and sign the account in.
    ///
    /// Credential failures surface as [`LoginError::InvalidCredentials`].
    pub async fn login(
        &self,
        form: LoginForm,
        session: &dyn SessionBinding,
    ) -> Result<Identity, Error> {
        let credentials = validate_login(form, self.store.as_ref()).await?;
        self.authenticate(&credentials, session)
            .await?
            .ok_or_else(|| LoginRejection::Invalid(LoginError::InvalidCredentials).into())
    }
}

#[cfg(test)]
mod tests {
    //! Auth gate behaviour against a mocked credential store.
    use std::cell::RefCell;

    use super::*;
    use crate::domain::ports::MockCredentialStore;
    use crate::domain::{
        AccountStatus, DisplayName, Email, ErrorCode, Mobile, PlainPassword, ProfileText, Role,
        User, UserId, UserProfile, check,
    };
    use chrono::{DateTime, Local, TimeZone, Utc};
    use rstest::{fixture, rstest};

    struct FixtureClock(DateTime<Utc>);

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.0.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[derive(Default)]
    struct RecordingSession {
        established: RefCell<Vec<Identity>>,
    }

    impl SessionBinding for RecordingSession {
        fn establish(&self, identity: &Identity) -> Result<(), Error> {
            self.established.borrow_mut().push(*identity);
            Ok(())
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5)
            .single()
            .expect("valid timestamp")
    }

    fn gate(store: MockCredentialStore) -> AuthGate {
        AuthGate::new(Arc::new(store), Arc::new(FixtureClock(now())))
    }

    fn profile(role: Role) -> UserProfile {
        UserProfile {
            name: DisplayName::new("Ada").expect("name"),
            email: Email::parse("a@x.com").expect("email"),
            role,
            country: ProfileText::new("UK").expect("country"),
            nationality: ProfileText::new("British").expect("nationality"),
            mobile: Mobile::new("5551234").expect("mobile"),
        }
    }

    fn user(role: Role) -> User {
        User::new(UserId::random(), profile(role), AccountStatus::default(), now())
    }

    #[fixture]
    fn registration() -> ValidatedRegistration {
        check(RegistrationForm {
            name: "Ada".to_owned(),
            email: "a@x.com".to_owned(),
            password1: PlainPassword::new("Secret123!"),
            password2: PlainPassword::new("Secret123!"),
            role: "student".to_owned(),
            country: "UK".to_owned(),
            nationality: "British".to_owned(),
            mobile: "5551234".to_owned(),
        })
        .expect("valid registration")
    }

    fn credentials(password: &str) -> LoginCredentials {
        LoginCredentials::try_from_parts("a@x.com", PlainPassword::new(password))
            .expect("credentials")
    }

    #[tokio::test]
    async fn verified_credentials_establish_a_session() {
        let account = user(Role::Staff);
        let expected = Identity::from(&account);
        let mut store = MockCredentialStore::new();
        store
            .expect_verify_password()
            .times(1)
            .returning(move |_, _| Ok(Some(account.clone())));
        store
            .expect_record_login()
            .withf(|_, at| *at == now())
            .times(1)
            .returning(|_, _| Ok(()));
        let session = RecordingSession::default();

        let identity = gate(store)
            .authenticate(&credentials("Secret123!"), &session)
            .await
            .expect("authenticate");

        assert_eq!(identity, Some(expected));
        assert_eq!(session.established.borrow().as_slice(), &[expected]);
    }

    #[tokio::test]
    async fn wrong_password_yields_no_identity_and_no_session() {
        let mut store = MockCredentialStore::new();
        store.expect_verify_password().returning(|_, _| Ok(None));
        store.expect_record_login().never();
        let session = RecordingSession::default();

        let identity = gate(store)
            .authenticate(&credentials("wrong"), &session)
            .await
            .expect("authenticate");

        assert!(identity.is_none());
        assert!(session.established.borrow().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn persistence_failure_is_reported(registration: ValidatedRegistration) {
        let mut store = MockCredentialStore::new();
        store
            .expect_create()
            .returning(|_, _| Err(CredentialStoreError::query("disk full")));
        store.expect_verify_password().never();
        let session = RecordingSession::default();

        let err = gate(store)
            .register_and_login(registration, &session)
            .await
            .expect_err("persistence fails");

        assert!(matches!(err, AuthGateError::RegistrationFailed { .. }));
        assert!(session.established.borrow().is_empty());
        let error = Error::from(err);
        assert_eq!(error.code(), ErrorCode::InternalError);
        assert_eq!(error.message(), REGISTRATION_FAILED_MESSAGE);
    }

    #[rstest]
    #[tokio::test]
    async fn racing_duplicate_becomes_a_field_error(registration: ValidatedRegistration) {
        let mut store = MockCredentialStore::new();
        store
            .expect_create()
            .returning(|_, _| Err(CredentialStoreError::duplicate_email("a@x.com")));
        let session = RecordingSession::default();

        let err = gate(store)
            .register_and_login(registration, &session)
            .await
            .expect_err("duplicate");

        let error = Error::from(err);
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        let details = error.details().expect("details");
        assert_eq!(details["fieldErrors"]["email"][0], "This email already exists");
    }

    #[rstest]
    #[tokio::test]
    async fn registration_signs_the_account_in(registration: ValidatedRegistration) {
        let mut store = MockCredentialStore::new();
        store
            .expect_create()
            .withf(|profile, password| {
                profile.role == Role::Student && password.expose() == "Secret123!"
            })
            .times(1)
            .returning(|profile, _| {
                Ok(User::new(
                    UserId::random(),
                    profile.clone(),
                    AccountStatus::default(),
                    now(),
                ))
            });
        store
            .expect_verify_password()
            .times(1)
            .returning(|_, _| Ok(Some(user(Role::Student))));
        store.expect_record_login().returning(|_, _| Ok(()));
        let session = RecordingSession::default();

        let identity = gate(store)
            .register_and_login(registration, &session)
            .await
            .expect("registered");

        assert_eq!(identity.role(), Role::Student);
        assert_eq!(session.established.borrow().len(), 1);
    }

    #[tokio::test]
    async fn login_reports_invalid_credentials_generically() {
        let mut store = MockCredentialStore::new();
        store
            .expect_find_active_by_email()
            .returning(|_| Ok(Some(user(Role::Student))));
        store.expect_verify_password().returning(|_, _| Ok(None));
        let session = RecordingSession::default();
        let form = LoginForm {
            username: "a@x.com".to_owned(),
            password: PlainPassword::new("wrong"),
        };

        let err = gate(store).login(form, &session).await.expect_err("rejected");

        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(err.message(), crate::domain::INVALID_LOGIN_MESSAGE);
        assert!(session.established.borrow().is_empty());
    }

    #[tokio::test]
    async fn store_outage_during_login_is_unavailable() {
        let mut store = MockCredentialStore::new();
        store
            .expect_verify_password()
            .returning(|_, _| Err(CredentialStoreError::connection("refused")));
        let session = RecordingSession::default();

        let err = gate(store)
            .authenticate(&credentials("Secret123!"), &session)
            .await
            .expect_err("outage");

        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
