//! Registration handlers.
//!
//! ```text
//! GET  /register/
//! POST /register/ name=..&email=..&password1=..&password2=..&role=..&country=..&nationality=..&mobile=..
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use super::forms::{FormDescriptor, registration_form};
use super::redirect::{LOGIN_PATH, see_other};
use super::session::SessionContext;
use super::state::HttpState;
use super::ApiResult;
use crate::domain::{Error, PlainPassword, RegistrationForm};

/// Form body for `POST /register/`.
///
/// Missing fields deserialise as empty strings so they are reported as
/// required rather than rejected wholesale.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct RegisterRequest {
    /// Display name.
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    /// Email address; compared case-insensitively.
    #[schema(example = "ada@example.com")]
    pub email: String,
    /// Password.
    pub password1: String,
    /// Password confirmation.
    pub password2: String,
    /// `student`, `staff`, `admin` or `editor`.
    #[schema(example = "student")]
    pub role: String,
    /// Country of residence.
    #[schema(example = "United Kingdom")]
    pub country: String,
    /// Nationality.
    #[schema(example = "British")]
    pub nationality: String,
    /// Digits only.
    #[schema(example = "5551234")]
    pub mobile: String,
}

impl From<RegisterRequest> for RegistrationForm {
    fn from(value: RegisterRequest) -> Self {
        Self {
            name: value.name,
            email: value.email,
            password1: PlainPassword::new(value.password1),
            password2: PlainPassword::new(value.password2),
            role: value.role,
            country: value.country,
            nationality: value.nationality,
            mobile: value.mobile,
        }
    }
}

/// Empty registration form.
#[utoipa::path(
    get,
    path = "/register/",
    responses((status = 200, description = "Registration form", body = FormDescriptor)),
    tags = ["auth"],
    operation_id = "registrationForm",
    security([])
)]
#[get("/register/")]
pub async fn register_form() -> web::Json<FormDescriptor> {
    web::Json(registration_form())
}

/// Create an account, sign it in, and redirect to the login page.
#[utoipa::path(
    post,
    path = "/register/",
    request_body(
        content = RegisterRequest,
        content_type = "application/x-www-form-urlencoded"
    ),
    responses(
        (
            status = 303,
            description = "Account created and session started",
            headers(
                ("Location" = String, description = "/login/"),
                ("Set-Cookie" = String, description = "Session cookie")
            )
        ),
        (status = 400, description = "Field errors under details.fieldErrors", body = Error),
        (status = 500, description = "Registration could not be saved", body = Error),
        (status = 503, description = "Credential store unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/register/")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let identity = state
        .auth
        .register(form.into_inner().into(), &session)
        .await?;
    info!(user_id = %identity.user_id(), "registration completed");
    Ok(see_other(LOGIN_PATH))
}

#[cfg(test)]
mod tests {
    //! Handler-level coverage; the full flow lives in the integration tests.
    use super::*;
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use rstest::{fixture, rstest};

    use crate::domain::{Email, ErrorCode};
    use crate::domain::ports::CredentialStore;
    use crate::inbound::http::test_utils::{
        memory_state, read_error, session_cookie, test_session_middleware,
    };

    #[fixture]
    fn request() -> RegisterRequest {
        RegisterRequest {
            name: "Ada".to_owned(),
            email: "a@x.com".to_owned(),
            password1: "Secret123!".to_owned(),
            password2: "Secret123!".to_owned(),
            role: "student".to_owned(),
            country: "UK".to_owned(),
            nationality: "British".to_owned(),
            mobile: "5551234".to_owned(),
        }
    }

    #[actix_web::test]
    async fn form_lists_registration_fields() {
        let app = test::init_service(App::new().service(register_form)).await;
        let res =
            test::call_service(&app, test::TestRequest::get().uri("/register/").to_request())
                .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["form"], "register");
        assert_eq!(body["fields"].as_array().map(Vec::len), Some(8));
    }

    #[rstest]
    #[actix_web::test]
    async fn valid_registration_redirects_with_a_session(request: RegisterRequest) {
        let (state, store) = memory_state();
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .app_data(web::Data::new(state))
                .service(register),
        )
        .await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/register/")
                .set_form(&request)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()),
            Some("/login/")
        );
        let _ = session_cookie(&res);
        let email = Email::parse("a@x.com").expect("email");
        assert!(store.email_exists(&email).await.expect("lookup"));
    }

    #[rstest]
    #[actix_web::test]
    async fn invalid_mobile_is_reported_without_a_session(mut request: RegisterRequest) {
        request.mobile = "555-1234".to_owned();
        let (state, store) = memory_state();
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .app_data(web::Data::new(state))
                .service(register),
        )
        .await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/register/")
                .set_form(&request)
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(res.response().cookies().next().is_none());
        let error = read_error(res).await;
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
        let details = error.details().expect("details");
        assert_eq!(
            details["fieldErrors"]["mobile"][0],
            "Mobile number should contain only digits."
        );
        assert!(store.is_empty().expect("len"));
    }

    #[actix_web::test]
    async fn missing_fields_are_required() {
        let (state, _) = memory_state();
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .app_data(web::Data::new(state))
                .service(register),
        )
        .await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/register/")
                .set_form([("email", "a@x.com")])
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let error = read_error(res).await;
        let details = error.details().expect("details");
        assert_eq!(details["fieldErrors"]["name"][0], "This field is required.");
        assert_eq!(details["fieldErrors"]["mobile"][0], "This field is required.");
    }
}
