//! Role-based dispatch and access control.
//!
//! [`route_after_login`] picks the landing page for an identity and [`guard`]
//! is the precondition every role-restricted view runs before rendering.

use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use super::{Error, Identity, Role};

/// Message returned when a role-restricted page is requested by another role.
pub const FORBIDDEN_MESSAGE: &str = "You don't have permission to access this page.";

/// Role landing pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Destination {
    /// `/student/`
    StudentHome,
    /// `/staff/`
    StaffHome,
    /// `/admin/`
    AdminHome,
    /// `/editor/`
    EditorHome,
}

impl Destination {
    /// Landing page reserved for `role`.
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Student => Self::StudentHome,
            Role::Staff => Self::StaffHome,
            Role::Admin => Self::AdminHome,
            Role::Editor => Self::EditorHome,
        }
    }

    /// Role allowed to view this page.
    pub fn role(self) -> Role {
        match self {
            Self::StudentHome => Role::Student,
            Self::StaffHome => Role::Staff,
            Self::AdminHome => Role::Admin,
            Self::EditorHome => Role::Editor,
        }
    }

    /// Request path of the page.
    pub fn path(self) -> &'static str {
        match self {
            Self::StudentHome => "/student/",
            Self::StaffHome => "/staff/",
            Self::AdminHome => "/admin/",
            Self::EditorHome => "/editor/",
        }
    }
}

/// Select the landing page for an authenticated identity.
///
/// Role strings outside the enum are rejected earlier, when the identity is
/// rebuilt from the session or the credential store, so every identity has
/// exactly one destination.
///
/// # Examples
/// ```
/// use portal::domain::{route_after_login, Destination, Identity, Role, UserId};
///
/// let identity = Identity::new(UserId::random(), Role::Staff);
/// assert_eq!(route_after_login(&identity), Destination::StaffHome);
/// ```
pub fn route_after_login(identity: &Identity) -> Destination {
    Destination::for_role(identity.role())
}

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The identity holds one of the allowed roles.
    Allowed,
    /// It does not.
    Denied,
}

impl Access {
    /// Convert a denial into a `Forbidden` error.
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            Self::Allowed => Ok(()),
            Self::Denied => Err(Error::forbidden(FORBIDDEN_MESSAGE)),
        }
    }
}

/// Allow the identity through iff its role is one of `allowed_roles`.
pub fn guard(identity: &Identity, allowed_roles: &[Role]) -> Access {
    if allowed_roles.contains(&identity.role()) {
        Access::Allowed
    } else {
        warn!(
            user_id = %identity.user_id(),
            role = %identity.role(),
            "role-restricted page denied"
        );
        Access::Denied
    }
}
