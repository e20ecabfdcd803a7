//! Domain primitives, validation, and services.
//!
//! Purpose: Define strongly typed account entities and the registration,
//! authentication, and role-dispatch rules that act on them. Types here are
//! transport agnostic; inbound adapters map them onto HTTP.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - User (alias to `user::User`): account held by the credential store.
//! - AuthGate: turns credentials into a session-bound [`Identity`].
//! - route_after_login / guard: role dispatch and access checks.

pub mod auth;
pub mod auth_gate;
pub mod error;
pub mod identity;
pub mod landing;
pub mod password;
pub mod ports;
pub mod registration;
pub mod role;
pub mod role_router;
pub mod trace_id;
pub mod user;

pub use self::auth::{
    INVALID_LOGIN_MESSAGE, LoginCredentials, LoginError, LoginForm, LoginRejection,
    validate_login,
};
pub use self::auth_gate::{AuthGate, AuthGateError, REGISTRATION_FAILED_MESSAGE};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::identity::Identity;
pub use self::landing::{LandingPage, ProfileView};
pub use self::password::PlainPassword;
pub use self::registration::{
    PASSWORD_MIN_LENGTH, REGISTRATION_INVALID_MESSAGE, RegistrationError, RegistrationErrors,
    RegistrationField, RegistrationForm, RegistrationRejection, ValidatedRegistration, check,
    validate_registration,
};
pub use self::role::{Role, RoleError};
pub use self::role_router::{
    Access, Destination, FORBIDDEN_MESSAGE, guard, route_after_login,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    AccountStatus, DISPLAY_NAME_MAX, DisplayName, EMAIL_MAX, Email, MOBILE_MAX, Mobile,
    PROFILE_TEXT_MAX, ProfileText, User, UserId, UserProfile, UserValidationError,
};
