//! Shared wiring for the HTTP integration suites.

use std::sync::Arc;

use actix_web::cookie::{Cookie, Key, SameSite};
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use mockable::DefaultClock;
use portal::inbound::http::session_config::{SESSION_COOKIE_NAME, SessionSettings};
use portal::inbound::http::state::HttpState;
use portal::outbound::memory::InMemoryCredentialStore;
use portal::outbound::password::PasswordHasher;

/// Plain-HTTP session settings with a throwaway key.
pub fn session_settings() -> SessionSettings {
    SessionSettings {
        key: Key::generate(),
        cookie_secure: false,
        same_site: SameSite::Lax,
    }
}

/// Handler state over an empty in-memory store with the cheapest bcrypt cost.
pub fn state() -> (HttpState, Arc<InMemoryCredentialStore>) {
    let store = Arc::new(InMemoryCredentialStore::new(
        PasswordHasher::new(4),
        Arc::new(DefaultClock),
    ));
    (
        HttpState::new(store.clone(), Arc::new(DefaultClock)),
        store,
    )
}

/// Build the portal service the way the server does.
macro_rules! portal_app {
    ($state:expr) => {{
        use actix_web::{App, test, web};
        use portal::Trace;
        use portal::inbound::http::landing::{admin_home, editor_home, staff_home, student_home};
        use portal::inbound::http::login::{login, login_page, logout};
        use portal::inbound::http::register::{register, register_form};

        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .wrap(Trace)
                .service(
                    web::scope("")
                        .wrap($crate::support::session_settings().middleware())
                        .service(register_form)
                        .service(register)
                        .service(login_page)
                        .service(login)
                        .service(logout)
                        .service(student_home)
                        .service(staff_home)
                        .service(admin_home)
                        .service(editor_home),
                ),
        )
    }};
}

/// Registration form fields for a valid student account.
pub fn registration(email: &str, role: &str) -> Vec<(&'static str, String)> {
    vec![
        ("name", "Ada Lovelace".to_owned()),
        ("email", email.to_owned()),
        ("password1", "Secret123!".to_owned()),
        ("password2", "Secret123!".to_owned()),
        ("role", role.to_owned()),
        ("country", "United Kingdom".to_owned()),
        ("nationality", "British".to_owned()),
        ("mobile", "5551234".to_owned()),
    ]
}

/// Value of the `Location` header.
pub fn location<B>(res: &ServiceResponse<B>) -> Option<String> {
    res.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// The live session cookie set by `res`, if any.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME && !cookie.value().is_empty())
        .map(Cookie::into_owned)
}
