//! OpenAPI documentation for the portal.
//!
//! Registers every handler under [`crate::inbound::http`] together with the
//! form, landing page, and error schemas, and describes the session cookie
//! that the landing pages require. Served by Swagger UI in debug builds and
//! exported by the `openapi-dump` binary.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Destination, Error, ErrorCode, LandingPage, ProfileView, Role};
use crate::inbound::http::forms::{Choice, FieldDescriptor, FieldKind, FormDescriptor};
use crate::inbound::http::login::LoginRequest;
use crate::inbound::http::register::RegisterRequest;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Private session cookie issued by POST /login/ and POST /register/.",
            ))),
        );
    }
}

/// OpenAPI document for the portal.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Portal API",
        description = "Account registration, email login, and role landing pages."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::register::register_form,
        crate::inbound::http::register::register,
        crate::inbound::http::login::login_page,
        crate::inbound::http::login::login,
        crate::inbound::http::login::logout,
        crate::inbound::http::landing::student_home,
        crate::inbound::http::landing::staff_home,
        crate::inbound::http::landing::admin_home,
        crate::inbound::http::landing::editor_home,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Role,
        Destination,
        ProfileView,
        LandingPage,
        FormDescriptor,
        FieldDescriptor,
        FieldKind,
        Choice,
        RegisterRequest,
        LoginRequest,
    )),
    tags(
        (name = "auth", description = "Registration, login, and logout"),
        (name = "pages", description = "Role landing pages"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
