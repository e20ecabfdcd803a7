//! Login and logout handlers.
//!
//! ```text
//! GET  /login/
//! POST /login/  username=ada@example.com&password=...
//! POST /logout/
//! ```
//!
//! The login form calls the email field `username`, matching what browsers
//! autofill for credential forms.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use super::forms::{FormDescriptor, login_form};
use super::redirect::{LOGIN_PATH, see_other};
use super::session::SessionContext;
use super::state::HttpState;
use super::ApiResult;
use crate::domain::{Error, Identity, LoginForm, PlainPassword, route_after_login};

/// Form body for `POST /login/`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    /// Email address of the account.
    #[schema(example = "ada@example.com")]
    pub username: String,
    /// Password.
    pub password: String,
}

impl From<LoginRequest> for LoginForm {
    fn from(value: LoginRequest) -> Self {
        Self {
            username: value.username,
            password: PlainPassword::new(value.password),
        }
    }
}

/// Empty login form, or the role landing page when already signed in.
///
/// Registration finishes here with a live session, so a new account lands
/// on its own page. The redirect follows the stored role of the account.
#[utoipa::path(
    get,
    path = "/login/",
    params(("next" = Option<String>, Query, description = "Page the visitor was sent away from")),
    responses(
        (status = 200, description = "Login form", body = FormDescriptor),
        (
            status = 303,
            description = "Already signed in",
            headers(("Location" = String, description = "Role landing page"))
        )
    ),
    tags = ["auth"],
    operation_id = "loginForm",
    security([])
)]
#[get("/login/")]
pub async fn login_page(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    if let Some(user) = session.current_user(state.store.as_ref()).await? {
        return Ok(see_other(route_after_login(&Identity::from(&user)).path()));
    }
    Ok(HttpResponse::Ok().json(login_form()))
}

/// Authenticate and redirect to the landing page for the account's role.
#[utoipa::path(
    post,
    path = "/login/",
    request_body(
        content = LoginRequest,
        content_type = "application/x-www-form-urlencoded"
    ),
    responses(
        (
            status = 303,
            description = "Signed in; redirected to the role landing page",
            headers(
                ("Location" = String, description = "/student/, /staff/, /admin/ or /editor/"),
                ("Set-Cookie" = String, description = "Session cookie")
            )
        ),
        (status = 400, description = "Field errors under details.fieldErrors", body = Error),
        (status = 401, description = "Invalid email or password", body = Error),
        (status = 503, description = "Credential store unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login/")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let identity = state.auth.login(form.into_inner().into(), &session).await?;
    let destination = route_after_login(&identity);
    info!(user_id = %identity.user_id(), role = %identity.role(), "login succeeded");
    Ok(see_other(destination.path()))
}

/// Drop the session and return to the login form.
#[utoipa::path(
    post,
    path = "/logout/",
    responses((
        status = 303,
        description = "Session cleared",
        headers(("Location" = String, description = "/login/"))
    )),
    tags = ["auth"],
    operation_id = "logout"
)]
#[post("/logout/")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    see_other(LOGIN_PATH)
}
