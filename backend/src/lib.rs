//! Registration, login, and role-based landing pages for a campus portal.
//!
//! The crate is split into a transport-agnostic [`domain`], inbound adapters
//! under [`inbound`], and storage adapters under [`outbound`].

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
