//! Role landing pages.
//!
//! Each page runs the same precondition before rendering: visitors without a
//! session are sent to the login form, and signed-in users whose stored role
//! is another one get `403 Forbidden`.

use actix_web::{HttpResponse, get, web};
use tracing::info;

use super::redirect::to_login;
use super::session::SessionContext;
use super::state::HttpState;
use super::ApiResult;
use crate::domain::{Destination, Error, Identity, LandingPage, guard};

/// Shared body of the four landing handlers.
async fn render_landing(
    destination: Destination,
    session: &SessionContext,
    state: &HttpState,
) -> ApiResult<HttpResponse> {
    let Some(user) = session.current_user(state.store.as_ref()).await? else {
        return Ok(to_login(destination.path()));
    };
    guard(&Identity::from(&user), &[destination.role()]).into_result()?;

    info!(user_id = %user.id(), page = destination.path(), "landing page rendered");
    Ok(HttpResponse::Ok().json(LandingPage::new(destination, &user)))
}

/// Landing page for students.
#[utoipa::path(
    get,
    path = "/student/",
    responses(
        (status = 200, description = "Student landing page", body = LandingPage),
        (status = 302, description = "Not signed in; redirected to /login/?next=/student/"),
        (status = 403, description = "Signed in with another role", body = Error)
    ),
    tags = ["pages"],
    operation_id = "studentHome"
)]
#[get("/student/")]
pub async fn student_home(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    render_landing(Destination::StudentHome, &session, &state).await
}

/// Landing page for staff.
#[utoipa::path(
    get,
    path = "/staff/",
    responses(
        (status = 200, description = "Staff landing page", body = LandingPage),
        (status = 302, description = "Not signed in; redirected to /login/?next=/staff/"),
        (status = 403, description = "Signed in with another role", body = Error)
    ),
    tags = ["pages"],
    operation_id = "staffHome"
)]
#[get("/staff/")]
pub async fn staff_home(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    render_landing(Destination::StaffHome, &session, &state).await
}

/// Landing page for administrators.
#[utoipa::path(
    get,
    path = "/admin/",
    responses(
        (status = 200, description = "Admin landing page", body = LandingPage),
        (status = 302, description = "Not signed in; redirected to /login/?next=/admin/"),
        (status = 403, description = "Signed in with another role", body = Error)
    ),
    tags = ["pages"],
    operation_id = "adminHome"
)]
#[get("/admin/")]
pub async fn admin_home(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    render_landing(Destination::AdminHome, &session, &state).await
}

/// Landing page for editors.
#[utoipa::path(
    get,
    path = "/editor/",
    responses(
        (status = 200, description = "Editor landing page", body = LandingPage),
        (status = 302, description = "Not signed in; redirected to /login/?next=/editor/"),
        (status = 403, description = "Signed in with another role", body = Error)
    ),
    tags = ["pages"],
    operation_id = "editorHome"
)]
#[get("/editor/")]
pub async fn editor_home(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    render_landing(Destination::EditorHome, &session, &state).await
}
