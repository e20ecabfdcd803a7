//! PostgreSQL persistence via Diesel, `diesel-async`, and `bb8`.
//!
//! Row structs and the table definition stay private to this module; only the
//! store and its pool are exported.

mod diesel_credential_store;
mod models;
mod pool;
mod schema;

pub use diesel_credential_store::DieselCredentialStore;
pub use pool::{DbPool, PoolConfig, PoolError};
