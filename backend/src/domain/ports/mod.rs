//! Domain ports at the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod credential_store;
mod session_binding;

#[cfg(test)]
pub use credential_store::MockCredentialStore;
pub use credential_store::{CredentialStore, CredentialStoreError};
pub use session_binding::SessionBinding;
