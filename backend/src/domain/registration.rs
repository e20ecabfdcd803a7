//! Registration input validation.
//!
//! [`check`] performs every rule that only needs the submitted form.
//! [`validate_registration`] adds the uniqueness lookup against the
//! credential store. Neither persists anything.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde_json::json;

use super::auth::map_store_error;
use super::ports::{CredentialStore, CredentialStoreError};
use super::{
    DisplayName, Email, Error, Mobile, PlainPassword, ProfileText, Role, UserProfile,
    UserValidationError,
};

/// Minimum accepted password length.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// bcrypt only reads this many bytes of a password.
pub const PASSWORD_MAX_BYTES: usize = 72;

/// Similarity at or above `NUMERATOR / DENOMINATOR` rejects a password.
const MAX_SIMILARITY_NUMERATOR: usize = 7;
const MAX_SIMILARITY_DENOMINATOR: usize = 10;

/// Message attached to the whole form when any field is rejected.
pub const REGISTRATION_INVALID_MESSAGE: &str = "Please correct the errors below.";

/// Fields of the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegistrationField {
    /// `name`
    Name,
    /// `email`
    Email,
    /// `password1`
    Password1,
    /// `password2`, the confirmation; password rules report here.
    Password2,
    /// `role`
    Role,
    /// `country`
    Country,
    /// `nationality`
    Nationality,
    /// `mobile`
    Mobile,
}

impl RegistrationField {
    /// Every field in form order.
    pub const ALL: [RegistrationField; 8] = [
        Self::Name,
        Self::Email,
        Self::Password1,
        Self::Password2,
        Self::Role,
        Self::Country,
        Self::Nationality,
        Self::Mobile,
    ];

    /// Form field name as submitted.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Password1 => "password1",
            Self::Password2 => "password2",
            Self::Role => "role",
            Self::Country => "country",
            Self::Nationality => "nationality",
            Self::Mobile => "mobile",
        }
    }
}

impl fmt::Display for RegistrationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field-level registration failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// Another account already uses the email, ignoring case.
    #[error("This email already exists")]
    DuplicateEmail,
    /// The mobile number has a character other than an ASCII digit.
    #[error("Mobile number should contain only digits.")]
    InvalidMobile,
    /// Not an email address.
    #[error("Enter a valid email address.")]
    InvalidEmail,
    /// Display name over its limit.
    #[error("Ensure this value has at most {max} characters (it has {actual}).")]
    NameTooLong {
        /// Maximum allowed characters.
        max: usize,
        /// Characters supplied.
        actual: usize,
    },
    /// Blank or whitespace-only value.
    #[error("This field is required.")]
    EmptyField,
    /// Any other field over its limit.
    #[error("Ensure this value has at most {max} characters (it has {actual}).")]
    FieldTooLong {
        /// Maximum allowed characters.
        max: usize,
        /// Characters supplied.
        actual: usize,
    },
    /// Role outside the four known values.
    #[error("Select a valid choice. {value} is not one of the available choices.")]
    UnknownRole {
        /// The rejected role value.
        value: String,
    },
    /// `password1` and `password2` differ.
    #[error("The two password fields didn’t match.")]
    PasswordMismatch,
    /// Fewer than [`PASSWORD_MIN_LENGTH`] characters.
    #[error("This password is too short. It must contain at least {min} characters.")]
    PasswordTooShort {
        /// Minimum required characters.
        min: usize,
    },
    /// Only digits.
    #[error("This password is entirely numeric.")]
    PasswordEntirelyNumeric,
    /// More than [`PASSWORD_MAX_BYTES`] bytes.
    #[error("This password is too long. It must contain at most {max} bytes.")]
    PasswordTooLong {
        /// Maximum allowed bytes.
        max: usize,
    },
    /// Shares too many characters with the name or email.
    #[error("The password is too similar to the {attribute}.")]
    PasswordTooSimilar {
        /// The attribute the password resembles.
        attribute: &'static str,
    },
}

impl RegistrationError {
    fn from_field(field: RegistrationField, err: UserValidationError) -> Self {
        match err {
            UserValidationError::Empty => Self::EmptyField,
            UserValidationError::TooLong { max, actual } if field == RegistrationField::Name => {
                Self::NameTooLong { max, actual }
            }
            UserValidationError::TooLong { max, actual } => Self::FieldTooLong { max, actual },
            UserValidationError::InvalidEmail => Self::InvalidEmail,
            UserValidationError::InvalidMobile => Self::InvalidMobile,
            UserValidationError::InvalidId => Self::EmptyField,
        }
    }
}

/// Field errors collected while validating one registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationErrors {
    errors: Vec<(RegistrationField, RegistrationError)>,
}

impl RegistrationErrors {
    /// Record an error against `field`.
    pub fn push(&mut self, field: RegistrationField, error: RegistrationError) {
        self.errors.push((field, error));
    }

    /// No errors recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether `error` was raised for any field.
    pub fn contains(&self, error: &RegistrationError) -> bool {
        self.errors.iter().any(|(_, candidate)| candidate == error)
    }

    /// Errors raised for `field`, in the order they were found.
    pub fn for_field(
        &self,
        field: RegistrationField,
    ) -> impl Iterator<Item = &RegistrationError> + '_ {
        self.errors
            .iter()
            .filter(move |(candidate, _)| *candidate == field)
            .map(|(_, error)| error)
    }

    /// Field name to rendered messages, as exposed in error details.
    pub fn to_field_map(&self) -> BTreeMap<&'static str, Vec<String>> {
        let mut map: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
        for (field, error) in &self.errors {
            map.entry(field.as_str()).or_default().push(error.to_string());
        }
        map
    }
}

impl From<RegistrationErrors> for Error {
    fn from(value: RegistrationErrors) -> Self {
        Error::invalid_request(REGISTRATION_INVALID_MESSAGE).with_details(json!({
            "fieldErrors": value.to_field_map(),
        }))
    }
}

/// Why a registration form was turned away before persistence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationRejection {
    /// One or more fields failed validation.
    #[error("registration form is invalid")]
    Invalid(RegistrationErrors),
    /// The uniqueness lookup could not run.
    #[error(transparent)]
    Store(#[from] CredentialStoreError),
}

impl From<RegistrationRejection> for Error {
    fn from(value: RegistrationRejection) -> Self {
        match value {
            RegistrationRejection::Invalid(errors) => errors.into(),
            RegistrationRejection::Store(err) => map_store_error(err),
        }
    }
}

/// Raw registration form as submitted.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    /// Display name.
    pub name: String,
    /// Email address as typed.
    pub email: String,
    /// Password.
    pub password1: PlainPassword,
    /// Password confirmation.
    pub password2: PlainPassword,
    /// Role name.
    pub role: String,
    /// Country of residence.
    pub country: String,
    /// Nationality.
    pub nationality: String,
    /// Mobile number.
    pub mobile: String,
}

/// Registration input that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRegistration {
    profile: UserProfile,
    password: PlainPassword,
}

impl ValidatedRegistration {
    /// Profile to store.
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Password to hash.
    pub fn password(&self) -> &PlainPassword {
        &self.password
    }

    /// Split into the profile and the raw password.
    pub fn into_parts(self) -> (UserProfile, PlainPassword) {
        (self.profile, self.password)
    }
}

fn field<T>(
    errors: &mut RegistrationErrors,
    field: RegistrationField,
    parsed: Result<T, UserValidationError>,
) -> Option<T> {
    match parsed {
        Ok(value) => Some(value),
        Err(err) => {
            errors.push(field, RegistrationError::from_field(field, err));
            None
        }
    }
}

fn parse_role(errors: &mut RegistrationErrors, raw: &str) -> Option<Role> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.push(RegistrationField::Role, RegistrationError::EmptyField);
        return None;
    }
    match raw.parse::<Role>() {
        Ok(role) => Some(role),
        Err(_) => {
            errors.push(
                RegistrationField::Role,
                RegistrationError::UnknownRole {
                    value: raw.to_owned(),
                },
            );
            None
        }
    }
}

/// Characters `a` and `b` have in common, counted with multiplicity and
/// ignoring order.
fn shared_chars(a: &[char], b: &[char]) -> usize {
    let mut available: HashMap<char, usize> = HashMap::new();
    for c in b {
        *available.entry(*c).or_default() += 1;
    }
    a.iter()
        .filter(|c| {
            available.get_mut(*c).is_some_and(|left| {
                let found = *left > 0;
                *left = left.saturating_sub(1);
                found
            })
        })
        .count()
}

/// A part far shorter than the password cannot make it guessable.
const fn too_short_to_compare(password_len: usize, part_len: usize) -> bool {
    password_len >= 10 * part_len
        && 2 * MAX_SIMILARITY_DENOMINATOR * part_len < MAX_SIMILARITY_NUMERATOR * password_len
}

/// Whether the character overlap ratio `2 * shared / (len_a + len_b)`
/// reaches the similarity ceiling.
fn is_similar(password: &[char], part: &str) -> bool {
    let chars: Vec<char> = part.chars().collect();
    if too_short_to_compare(password.len(), chars.len()) {
        return false;
    }
    let total = password.len() + chars.len();
    total > 0
        && 2 * shared_chars(password, &chars) * MAX_SIMILARITY_DENOMINATOR
            >= MAX_SIMILARITY_NUMERATOR * total
}

/// Compare against the whole attribute and each run of word characters in it.
fn too_similar(password: &str, attribute: &str) -> bool {
    let lowered: Vec<char> = password.to_lowercase().chars().collect();
    let value = attribute.to_lowercase();
    value
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .chain(std::iter::once(value.as_str()))
        .any(|part| is_similar(&lowered, part))
}

fn check_password(
    errors: &mut RegistrationErrors,
    password: &PlainPassword,
    name: &str,
    email: &str,
) {
    let raw = password.expose();
    let target = RegistrationField::Password2;
    if too_similar(raw, email) {
        errors.push(
            target,
            RegistrationError::PasswordTooSimilar {
                attribute: "email address",
            },
        );
    } else if too_similar(raw, name) {
        errors.push(target, RegistrationError::PasswordTooSimilar { attribute: "name" });
    }
    if raw.chars().count() < PASSWORD_MIN_LENGTH {
        errors.push(
            target,
            RegistrationError::PasswordTooShort {
                min: PASSWORD_MIN_LENGTH,
            },
        );
    }
    if raw.chars().all(|c| c.is_ascii_digit()) {
        errors.push(target, RegistrationError::PasswordEntirelyNumeric);
    }
    if raw.len() > PASSWORD_MAX_BYTES {
        errors.push(
            target,
            RegistrationError::PasswordTooLong {
                max: PASSWORD_MAX_BYTES,
            },
        );
    }
}

/// Validate everything that does not need the credential store.
///
/// Password strength rules only run once both password fields are present
/// and equal; their errors are reported against `password2`.
///
/// # Examples
/// ```
/// use portal::domain::{check, PlainPassword, RegistrationForm, Role};
///
/// let form = RegistrationForm {
///     name: "Ada".into(),
///     email: "A@X.com".into(),
///     password1: PlainPassword::new("Secret123!"),
///     password2: PlainPassword::new("Secret123!"),
///     role: "student".into(),
///     country: "UK".into(),
///     nationality: "British".into(),
///     mobile: "5551234".into(),
/// };
/// let validated = check(form).unwrap();
/// assert_eq!(validated.profile().email.as_ref(), "a@x.com");
/// assert_eq!(validated.profile().role, Role::Student);
/// ```
pub fn check(form: RegistrationForm) -> Result<ValidatedRegistration, RegistrationErrors> {
    let mut errors = RegistrationErrors::default();
    let name = field(&mut errors, RegistrationField::Name, DisplayName::new(&form.name));
    let email = field(&mut errors, RegistrationField::Email, Email::parse(&form.email));
    let role = parse_role(&mut errors, &form.role);
    let country = field(
        &mut errors,
        RegistrationField::Country,
        ProfileText::new(&form.country),
    );
    let nationality = field(
        &mut errors,
        RegistrationField::Nationality,
        ProfileText::new(&form.nationality),
    );
    let mobile = field(&mut errors, RegistrationField::Mobile, Mobile::new(&form.mobile));

    if form.password1.is_empty() {
        errors.push(RegistrationField::Password1, RegistrationError::EmptyField);
    }
    if form.password2.is_empty() {
        errors.push(RegistrationField::Password2, RegistrationError::EmptyField);
    } else if !form.password1.is_empty() {
        if form.password1 == form.password2 {
            check_password(&mut errors, &form.password2, &form.name, &form.email);
        } else {
            errors.push(
                RegistrationField::Password2,
                RegistrationError::PasswordMismatch,
            );
        }
    }

    match (name, email, role, country, nationality, mobile) {
        (Some(name), Some(email), Some(role), Some(country), Some(nationality), Some(mobile))
            if errors.is_empty() =>
        {
            Ok(ValidatedRegistration {
                profile: UserProfile {
                    name,
                    email,
                    role,
                    country,
                    nationality,
                    mobile,
                },
                password: form.password1,
            })
        }
        _ => Err(errors),
    }
}

/// Validate a registration form, including the case-insensitive uniqueness
/// check against the credential store.
pub async fn validate_registration(
    form: RegistrationForm,
    store: &dyn CredentialStore,
) -> Result<ValidatedRegistration, RegistrationRejection> {
    let duplicate = match Email::parse(&form.email) {
        Ok(email) => store.email_exists(&email).await?,
        Err(_) => false,
    };
    match check(form) {
        Ok(validated) if !duplicate => Ok(validated),
        Ok(_) => {
            let mut errors = RegistrationErrors::default();
            errors.push(RegistrationField::Email, RegistrationError::DuplicateEmail);
            Err(RegistrationRejection::Invalid(errors))
        }
        Err(mut errors) => {
            if duplicate {
                errors.push(RegistrationField::Email, RegistrationError::DuplicateEmail);
            }
            Err(RegistrationRejection::Invalid(errors))
        }
    }
}
