//! Account roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Raised when a role string falls outside the fixed set of roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleError {
    /// The value names no known role.
    #[error("Select a valid choice. {value} is not one of the available choices.")]
    UnknownRole {
        /// The rejected role value.
        value: String,
    },
}

/// Fixed set of account categories.
///
/// # Examples
/// ```
/// use portal::domain::Role;
///
/// let role: Role = "editor".parse().unwrap();
/// assert_eq!(role, Role::Editor);
/// assert!("lecturer".parse::<Role>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Enrolled student.
    Student,
    /// Teaching or support staff.
    Staff,
    /// Site administrator.
    Admin,
    /// Content editor.
    Editor,
}

impl Role {
    /// Every role, in the order offered on the registration form.
    pub const ALL: [Role; 4] = [Role::Student, Role::Staff, Role::Admin, Role::Editor];

    /// Stored and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Staff => "staff",
            Self::Admin => "admin",
            Self::Editor => "editor",
        }
    }

    /// Human-readable label for form choices.
    pub fn label(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Staff => "Staff",
            Self::Admin => "Admin",
            Self::Editor => "Editor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == value)
            .ok_or_else(|| RoleError::UnknownRole {
                value: value.to_owned(),
            })
    }
}
