//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` so they depend only on the auth
//! gate and the credential store port.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::AuthGate;
use crate::domain::ports::CredentialStore;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Registration and login workflows.
    pub auth: AuthGate,
    /// Account lookups for pages that need the stored user.
    pub store: Arc<dyn CredentialStore>,
}

impl HttpState {
    /// Build state around `store`, stamping logins with `clock`.
    pub fn new(store: Arc<dyn CredentialStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            auth: AuthGate::new(Arc::clone(&store), clock),
            store,
        }
    }
}
