//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use actix_web::test;
use mockable::DefaultClock;

use super::session_config::SESSION_COOKIE_NAME;
use super::state::HttpState;
use crate::domain::Error;
use crate::outbound::memory::InMemoryCredentialStore;
use crate::outbound::password::PasswordHasher;

/// Session middleware with a fresh key and the `Secure` flag off for plain
/// HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name(SESSION_COOKIE_NAME.to_owned())
        .cookie_secure(false)
        .build()
}

/// State over an empty in-memory store using the cheapest bcrypt cost.
pub fn memory_state() -> (HttpState, Arc<InMemoryCredentialStore>) {
    let store = Arc::new(InMemoryCredentialStore::new(
        PasswordHasher::new(4),
        Arc::new(DefaultClock),
    ));
    let state = HttpState::new(store.clone(), Arc::new(DefaultClock));
    (state, store)
}

/// The session cookie set by `res`.
///
/// # Panics
///
/// Panics when the response did not set a session cookie.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Decode the JSON error envelope of `res`.
pub async fn read_error<B: MessageBody>(res: ServiceResponse<B>) -> Error {
    test::read_body_json(res).await
}
