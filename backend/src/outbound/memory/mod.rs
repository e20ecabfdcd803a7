//! Process-local adapters used in development mode and tests.

mod credential_store;

pub use credential_store::InMemoryCredentialStore;
