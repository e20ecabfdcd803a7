//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! The cookie holds the user id and the role string. Handlers only see an
//! [`Identity`] rebuilt from those two values.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::{info, warn};

use crate::domain::auth::map_store_error;
use crate::domain::ports::{CredentialStore, SessionBinding};
use crate::domain::{Error, Identity, Role, User, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";
pub(crate) const ROLE_KEY: &str = "role";

/// Explicit session object passed into each handler.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Wrap the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    fn read(&self, key: &str) -> Result<Option<String>, Error> {
        self.0
            .get::<String>(key)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))
    }

    /// The identity bound to this session, if any.
    ///
    /// A malformed user id or a role outside the known set is treated as no
    /// session at all.
    pub fn identity(&self) -> Result<Option<Identity>, Error> {
        let (Some(raw_id), Some(raw_role)) = (self.read(USER_ID_KEY)?, self.read(ROLE_KEY)?)
        else {
            return Ok(None);
        };
        let user_id = match UserId::new(&raw_id) {
            Ok(id) => id,
            Err(error) => {
                warn!(%error, "invalid user id in session cookie");
                return Ok(None);
            }
        };
        match raw_role.parse::<Role>() {
            Ok(role) => Ok(Some(Identity::new(user_id, role))),
            Err(error) => {
                warn!(%error, %user_id, "unknown role in session cookie");
                Ok(None)
            }
        }
    }

    /// The signed-in account as currently stored.
    ///
    /// The cookie only names the account; authorization uses the role read
    /// back from `store`. A session naming a missing or inactive account is
    /// purged. A session whose role no longer matches the account is bound
    /// again with the stored role.
    pub async fn current_user(
        &self,
        store: &dyn CredentialStore,
    ) -> Result<Option<User>, Error> {
        let Some(identity) = self.identity()? else {
            return Ok(None);
        };
        let stored = store
            .find_by_id(identity.user_id())
            .await
            .map_err(map_store_error)?;
        let Some(user) = stored.filter(User::is_active) else {
            warn!(user_id = %identity.user_id(), "session refers to a missing or inactive account");
            self.purge();
            return Ok(None);
        };
        if user.role() != identity.role() {
            info!(
                user_id = %user.id(),
                from = %identity.role(),
                to = %user.role(),
                "session role refreshed from the account"
            );
            self.establish(&Identity::from(&user))?;
        }
        Ok(Some(user))
    }

    /// Drop every value and expire the cookie.
    pub fn purge(&self) {
        self.0.purge();
    }
}

impl SessionBinding for SessionContext {
    fn establish(&self, identity: &Identity) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, identity.user_id().to_string())
            .and_then(|()| self.0.insert(ROLE_KEY, identity.role().as_str()))
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;

    use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};

    const USER_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

    async fn whoami(session: SessionContext) -> Result<HttpResponse, Error> {
        let identity = session
            .identity()?
            .ok_or_else(|| Error::unauthorized("login required"))?;
        Ok(HttpResponse::Ok().body(format!("{} {}", identity.user_id(), identity.role())))
    }

    #[actix_web::test]
    async fn established_identity_round_trips() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route(
                    "/set",
                    web::get().to(|session: SessionContext| async move {
                        let id = UserId::new(USER_ID).expect("fixture id");
                        session.establish(&Identity::new(id, Role::Editor))?;
                        Ok::<_, Error>(HttpResponse::Ok())
                    }),
                )
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let set = test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        let cookie = session_cookie(&set);
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/whoami").cookie(cookie).to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let body = test::read_body(res).await;
        assert_eq!(body, format!("{USER_ID} editor"));
    }

    #[actix_web::test]
    async fn missing_identity_is_unauthorised() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route("/whoami", web::get().to(whoami)),
        )
        .await;
        let res =
            test::call_service(&app, test::TestRequest::get().uri("/whoami").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[case("not-a-uuid", "student")]
    #[case(USER_ID, "lecturer")]
    #[case(USER_ID, "Admin")]
    #[actix_web::test]
    async fn tampered_values_are_not_an_identity(#[case] id: &'static str, #[case] role: &'static str) {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route(
                    "/set",
                    web::get().to(move |session: Session| async move {
                        session.insert(USER_ID_KEY, id).expect("set id");
                        session.insert(ROLE_KEY, role).expect("set role");
                        HttpResponse::Ok()
                    }),
                )
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let set = test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        let cookie = session_cookie(&set);
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/whoami").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
