//! Liveness and readiness endpoints for orchestrators and load balancers.
//!
//! Liveness only says the process answers HTTP. Readiness additionally needs
//! the listener to be bound and the credential store to answer a ping, so a
//! lost database connection takes the instance out of rotation.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, HttpResponseBuilder, get, http::header, web};
use tracing::warn;

use super::state::HttpState;

/// Whether the listener has been bound.
#[derive(Default)]
pub struct HealthState {
    listening: AtomicBool,
}

impl HealthState {
    /// A server that is not yet listening.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the listener is bound and requests can arrive.
    pub fn mark_listening(&self) {
        self.listening.store(true, Ordering::Release);
    }

    /// Whether [`Self::mark_listening`] has been called.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Acquire)
    }
}

fn uncached(mut response: HttpResponseBuilder) -> HttpResponse {
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

/// Readiness endpoint.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Listening and the credential store answers"),
        (status = 503, description = "Not listening yet, or the credential store is unreachable")
    )
)]
#[get("/health/ready")]
pub async fn ready(
    health: web::Data<HealthState>,
    state: web::Data<HttpState>,
) -> HttpResponse {
    if !health.is_listening() {
        return uncached(HttpResponse::ServiceUnavailable());
    }
    match state.store.ping().await {
        Ok(()) => uncached(HttpResponse::Ok()),
        Err(error) => {
            warn!(%error, "credential store failed readiness check");
            uncached(HttpResponse::ServiceUnavailable())
        }
    }
}

/// Liveness endpoint.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses((status = 200, description = "Process is serving requests"))
)]
#[get("/health/live")]
pub async fn live() -> HttpResponse {
    uncached(HttpResponse::Ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use mockable::DefaultClock;
    use rstest::rstest;

    use crate::domain::ports::{CredentialStoreError, MockCredentialStore};
    use crate::inbound::http::test_utils::memory_state;

    fn cache_control<B>(res: &actix_web::dev::ServiceResponse<B>) -> Option<&str> {
        res.headers()
            .get(header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
    }

    #[rstest]
    #[case(false, "/health/ready", StatusCode::SERVICE_UNAVAILABLE)]
    #[case(true, "/health/ready", StatusCode::OK)]
    #[case(false, "/health/live", StatusCode::OK)]
    #[actix_web::test]
    async fn endpoints_follow_listener_state(
        #[case] listening: bool,
        #[case] path: &str,
        #[case] expected: StatusCode,
    ) {
        let health = web::Data::new(HealthState::new());
        if listening {
            health.mark_listening();
        }
        let (state, _) = memory_state();
        let app = test::init_service(
            App::new()
                .app_data(health)
                .app_data(web::Data::new(state))
                .service(ready)
                .service(live),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;

        assert_eq!(res.status(), expected);
        assert_eq!(cache_control(&res), Some("no-store"));
    }

    #[actix_web::test]
    async fn unreachable_store_fails_readiness() {
        let mut store = MockCredentialStore::new();
        store
            .expect_ping()
            .times(1)
            .returning(|| Err(CredentialStoreError::connection("pool timed out")));
        let health = web::Data::new(HealthState::new());
        health.mark_listening();
        let state = HttpState::new(Arc::new(store), Arc::new(DefaultClock));
        let app = test::init_service(
            App::new()
                .app_data(health)
                .app_data(web::Data::new(state))
                .service(ready)
                .service(live),
        )
        .await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/health/ready").to_request())
                .await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(cache_control(&res), Some("no-store"));

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/health/live").to_request())
                .await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
