//! Port for binding an authenticated identity to the caller's session.
//!
//! Handlers pass their session explicitly into the authentication use-cases
//! instead of relying on ambient framework state.

use crate::domain::{Error, Identity};

/// Session sink the auth gate writes identities into.
pub trait SessionBinding {
    /// Bind `identity` to the current session, replacing any previous one.
    fn establish(&self, identity: &Identity) -> Result<(), Error>;
}
