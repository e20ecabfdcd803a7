//! User account model.
//!
//! Every field of a [`User`] is validated on construction so adapters and
//! handlers can rely on the invariants without re-checking them.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// Maximum length of the display name.
pub const DISPLAY_NAME_MAX: usize = 75;
/// Maximum length of an email address.
pub const EMAIL_MAX: usize = 200;
/// Maximum length of the country and nationality fields.
pub const PROFILE_TEXT_MAX: usize = 100;
/// Maximum length of a mobile number.
pub const MOBILE_MAX: usize = 20;

/// Validation errors raised by the user field constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Identifier is not a UUID.
    #[error("user id must be a valid UUID")]
    InvalidId,
    /// Field was blank once trimmed.
    #[error("This field is required.")]
    Empty,
    /// Field exceeds its maximum length.
    #[error("Ensure this value has at most {max} characters (it has {actual}).")]
    TooLong {
        /// Maximum allowed characters.
        max: usize,
        /// Characters supplied.
        actual: usize,
    },
    /// Email does not look like `local@domain.tld`.
    #[error("Enter a valid email address.")]
    InvalidEmail,
    /// Mobile number contains a non-digit character.
    #[error("Mobile number should contain only digits.")]
    InvalidMobile,
}

fn bounded(raw: &str, max: usize) -> Result<String, UserValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UserValidationError::Empty);
    }
    let actual = trimmed.chars().count();
    if actual > max {
        return Err(UserValidationError::TooLong { max, actual });
    }
    Ok(trimmed.to_owned())
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from string input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Length is enforced separately; this only checks the overall shape.
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Case-normalised email address.
///
/// ## Invariants
/// - trimmed and lowercased, so equality is case-insensitive;
/// - at most [`EMAIL_MAX`] characters;
/// - shaped like `local@domain.tld`.
///
/// # Examples
/// ```
/// use portal::domain::Email;
///
/// let email = Email::parse("  Ada@Example.COM ").unwrap();
/// assert_eq!(email.as_ref(), "ada@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Normalise and validate an email address.
    pub fn parse(raw: &str) -> Result<Self, UserValidationError> {
        let normalised = bounded(raw, EMAIL_MAX)?.to_lowercase();
        if !email_regex().is_match(&normalised) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

/// Human readable name shown on landing pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Validate and construct a [`DisplayName`].
    pub fn new(raw: &str) -> Result<Self, UserValidationError> {
        bounded(raw, DISPLAY_NAME_MAX).map(Self)
    }
}

impl AsRef<str> for DisplayName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

/// Free-text profile field such as country or nationality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfileText(String);

impl ProfileText {
    /// Validate and construct a [`ProfileText`].
    pub fn new(raw: &str) -> Result<Self, UserValidationError> {
        bounded(raw, PROFILE_TEXT_MAX).map(Self)
    }
}

impl AsRef<str> for ProfileText {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<ProfileText> for String {
    fn from(value: ProfileText) -> Self {
        value.0
    }
}

impl TryFrom<String> for ProfileText {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

/// Mobile number made only of ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Mobile(String);

impl Mobile {
    /// Validate and construct a [`Mobile`].
    ///
    /// # Examples
    /// ```
    /// use portal::domain::{Mobile, UserValidationError};
    ///
    /// assert!(Mobile::new("5551234").is_ok());
    /// assert_eq!(Mobile::new("555-1234"), Err(UserValidationError::InvalidMobile));
    /// ```
    pub fn new(raw: &str) -> Result<Self, UserValidationError> {
        // Not trimmed: surrounding whitespace counts as a non-digit character.
        if raw.is_empty() {
            return Err(UserValidationError::Empty);
        }
        if !raw.chars().all(|c| c.is_ascii_digit()) {
            return Err(UserValidationError::InvalidMobile);
        }
        let actual = raw.len();
        if actual > MOBILE_MAX {
            return Err(UserValidationError::TooLong {
                max: MOBILE_MAX,
                actual,
            });
        }
        Ok(Self(raw.to_owned()))
    }
}

impl AsRef<str> for Mobile {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Mobile> for String {
    fn from(value: Mobile) -> Self {
        value.0
    }
}

impl TryFrom<String> for Mobile {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

/// Validated profile fields captured at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Display name.
    pub name: DisplayName,
    /// Lowercased login email.
    pub email: Email,
    /// Role fixed at registration.
    pub role: Role,
    /// Country of residence.
    pub country: ProfileText,
    /// Nationality.
    pub nationality: ProfileText,
    /// Mobile number.
    pub mobile: Mobile,
}

/// Activation and privilege flags of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountStatus {
    /// Inactive accounts cannot log in. Accounts are deactivated, never deleted.
    pub is_active: bool,
    /// Administrative flag kept for the record; roles drive access.
    pub is_staff: bool,
    /// Superuser flag kept for the record.
    pub is_superuser: bool,
}

impl Default for AccountStatus {
    /// Freshly registered accounts are active without elevated privileges.
    fn default() -> Self {
        Self {
            is_active: true,
            is_staff: false,
            is_superuser: false,
        }
    }
}

/// Application user as held by the credential store.
///
/// The password hash never leaves the store, so it is not part of this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    profile: UserProfile,
    status: AccountStatus,
    date_joined: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Build a user from validated components.
    pub fn new(
        id: UserId,
        profile: UserProfile,
        status: AccountStatus,
        date_joined: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            profile,
            status,
            date_joined,
            last_login: None,
        }
    }

    /// Set the last successful login timestamp.
    pub fn with_last_login(mut self, last_login: Option<DateTime<Utc>>) -> Self {
        self.last_login = last_login;
        self
    }

    /// Replace the activation and privilege flags.
    pub fn with_status(mut self, status: AccountStatus) -> Self {
        self.status = status;
        self
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Registered profile fields.
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Normalised login email.
    pub fn email(&self) -> &Email {
        &self.profile.email
    }

    /// Account role governing landing pages.
    pub fn role(&self) -> Role {
        self.profile.role
    }

    /// Activation and privilege flags.
    pub fn status(&self) -> AccountStatus {
        self.status
    }

    /// Whether the account may log in.
    pub fn is_active(&self) -> bool {
        self.status.is_active
    }

    /// Registration timestamp.
    pub fn date_joined(&self) -> DateTime<Utc> {
        self.date_joined
    }

    /// Timestamp of the last successful login, if any.
    pub fn last_login(&self) -> Option<DateTime<Utc>> {
        self.last_login
    }
}
