//! Outbound adapters implementing domain ports.
//!
//! - **memory**: process-local credential store for development and tests
//! - **persistence**: PostgreSQL credential store using Diesel
//! - **password**: bcrypt hashing shared by both stores

pub mod memory;
pub mod password;
pub mod persistence;
