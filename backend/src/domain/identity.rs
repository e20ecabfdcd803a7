//! Authenticated identity carried by a session.

use super::{Role, User, UserId};

/// The authenticated representation of a user for the duration of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    user_id: UserId,
    role: Role,
}

impl Identity {
    /// Build an identity from its parts.
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Identifier of the authenticated user.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Role used for landing-page dispatch and access checks.
    pub fn role(&self) -> Role {
        self.role
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self::new(*user.id(), user.role())
    }
}
