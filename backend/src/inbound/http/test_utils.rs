//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header::LOCATION;
use actix_web::{App, web};

use super::configure;
use super::state::HttpState;
use crate::domain::ports::{
    MockLoginService, MockRegistrationService, MockUserProfileCommand, MockUserProfileQuery,
};

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Driving-port mocks; untouched mocks panic if a handler calls them.
#[derive(Default)]
pub struct MockPorts {
    pub login: MockLoginService,
    pub registration: MockRegistrationService,
    pub profile_query: MockUserProfileQuery,
    pub profile_command: MockUserProfileCommand,
}

impl MockPorts {
    pub fn into_state(self) -> HttpState {
        HttpState {
            login: Arc::new(self.login),
            registration: Arc::new(self.registration),
            profile_query: Arc::new(self.profile_query),
            profile_command: Arc::new(self.profile_command),
        }
    }
}

/// Every gateway route behind a test session middleware.
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .wrap(test_session_middleware())
        .configure(configure)
}

/// The `session` cookie set by a response, if any.
pub fn session_cookie(res: &ServiceResponse) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
}

/// The `Location` header of a redirect.
pub fn location(res: &ServiceResponse) -> Option<String> {
    res.headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}
