//! Redirect responses shared by the form and landing handlers.

use actix_web::HttpResponse;
use actix_web::http::header;

/// Login form path; unauthenticated visitors are sent here.
pub const LOGIN_PATH: &str = "/login/";

/// `303 See Other` to `location`, used after a successful form post.
pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.to_owned()))
        .finish()
}

/// `302 Found` to the login form, remembering where the visitor was going.
pub fn to_login(next: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, format!("{LOGIN_PATH}?next={next}")))
        .finish()
}
