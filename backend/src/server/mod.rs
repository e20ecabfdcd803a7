//! Server construction and middleware wiring.

mod config;

pub use config::{ServerConfig, ServerSettings};

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use tracing::{info, warn};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use portal::Trace;
#[cfg(debug_assertions)]
use portal::doc::ApiDoc;
use portal::domain::ports::CredentialStore;
use portal::inbound::http::health::{HealthState, live, ready};
use portal::inbound::http::landing::{admin_home, editor_home, staff_home, student_home};
use portal::inbound::http::login::{login, login_page, logout};
use portal::inbound::http::register::{register, register_form};
use portal::inbound::http::session_config::SessionSettings;
use portal::inbound::http::state::HttpState;
use portal::outbound::memory::InMemoryCredentialStore;
use portal::outbound::persistence::DieselCredentialStore;

/// Pick the credential store: PostgreSQL when a pool is configured,
/// otherwise an in-memory map that is lost on restart.
fn build_store(config: &ServerConfig) -> Arc<dyn CredentialStore> {
    match &config.db_pool {
        Some(pool) => {
            info!("using PostgreSQL credential store");
            Arc::new(DieselCredentialStore::new(pool.clone(), config.hasher))
        }
        None => {
            warn!("no database configured; accounts are kept in memory");
            Arc::new(InMemoryCredentialStore::new(
                config.hasher,
                Arc::new(DefaultClock),
            ))
        }
    }
}

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    session: SessionSettings,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        session,
    } = deps;

    let pages = web::scope("")
        .wrap(session.middleware())
        .service(register_form)
        .service(register)
        .service(login_page)
        .service(login)
        .service(logout)
        .service(student_home)
        .service(staff_home)
        .service(admin_home)
        .service(editor_home);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app.service(pages)
}

/// Construct an Actix HTTP server from `config`.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = web::Data::new(HttpState::new(
        build_store(&config),
        Arc::new(DefaultClock),
    ));
    let ServerConfig {
        session,
        bind_addr,
        hasher: _,
        db_pool: _,
    } = config;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            session: session.clone(),
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_listening();
    info!(%bind_addr, "server listening");
    Ok(server)
}
