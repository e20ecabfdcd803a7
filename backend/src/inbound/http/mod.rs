//! HTTP inbound adapter: form endpoints, role landing pages, and health checks.

pub mod error;
pub mod forms;
pub mod health;
pub mod landing;
pub mod login;
pub mod redirect;
pub mod register;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;

pub use error::ApiResult;
