//! Role landing page view models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{Destination, Role, User};

/// Profile details shown to the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    /// Account id.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    /// Display name.
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    /// Login email.
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Stored role.
    pub role: Role,
    /// Country of residence.
    pub country: String,
    /// Nationality.
    pub nationality: String,
    /// Mobile number.
    #[schema(example = "5551234")]
    pub mobile: String,
    /// Registration time.
    pub date_joined: DateTime<Utc>,
    /// Most recent successful login.
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&User> for ProfileView {
    fn from(user: &User) -> Self {
        let profile = user.profile();
        Self {
            id: user.id().to_string(),
            name: profile.name.as_ref().to_owned(),
            email: profile.email.as_ref().to_owned(),
            role: profile.role,
            country: profile.country.as_ref().to_owned(),
            nationality: profile.nationality.as_ref().to_owned(),
            mobile: profile.mobile.as_ref().to_owned(),
            date_joined: user.date_joined(),
            last_login: user.last_login(),
        }
    }
}

/// A rendered role landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LandingPage {
    /// Which landing page this is.
    pub page: Destination,
    /// Role label used as the heading.
    #[schema(example = "Student")]
    pub title: String,
    /// The signed-in account.
    pub user: ProfileView,
}

impl LandingPage {
    /// Build the page for `destination` showing `user`.
    pub fn new(destination: Destination, user: &User) -> Self {
        Self {
            page: destination,
            title: destination.role().label().to_owned(),
            user: ProfileView::from(user),
        }
    }
}
