//! End-to-end credential flows against the real gateway service.
//!
//! Handlers, the session middleware, the credential service, the in-memory
//! store and Argon2 all run for real; only the Argon2 cost is lowered.

use std::sync::Arc;

use actix_http::Request;
use actix_session::SessionMiddleware;
use actix_session::config::CookieContentSecurity;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::LOCATION;
use actix_web::{App, test, web};
use gateway::Trace;
use gateway::domain::CredentialGateway;
use gateway::inbound::http::configure;
use gateway::inbound::http::state::HttpState;
use gateway::outbound::{Argon2PasswordHasher, InMemoryUserRepository};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

/// Browser stand-in that keeps the latest session cookie.
#[derive(Default)]
struct CookieJar(Option<Cookie<'static>>);

impl CookieJar {
    fn absorb(&mut self, res: &ServiceResponse) {
        if let Some(cookie) = res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
        {
            self.0 = if cookie.value().is_empty() {
                None
            } else {
                Some(cookie.into_owned())
            };
        }
    }

    fn attach(&self, req: test::TestRequest) -> test::TestRequest {
        match &self.0 {
            Some(cookie) => req.cookie(cookie.clone()),
            None => req,
        }
    }
}

#[fixture]
fn state() -> HttpState {
    let users = Arc::new(InMemoryUserRepository::new());
    let hasher = Arc::new(Argon2PasswordHasher::with_params(1024, 1, 1).expect("argon2 params"));
    HttpState::from_service(Arc::new(CredentialGateway::new(users, hasher)))
}

async fn gateway_app(
    state: HttpState,
) -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
    let session = SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .cookie_content_security(CookieContentSecurity::Private)
        .build();
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .wrap(session)
            .wrap(Trace)
            .configure(configure),
    )
    .await
}

async fn post(
    app: &impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
    jar: &mut CookieJar,
    uri: &str,
    form: &[(&str, &str)],
) -> ServiceResponse {
    let req = jar.attach(test::TestRequest::post().uri(uri).set_form(form));
    let res = test::call_service(app, req.to_request()).await;
    jar.absorb(&res);
    res
}

async fn get(
    app: &impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
    jar: &mut CookieJar,
    uri: &str,
) -> ServiceResponse {
    let req = jar.attach(test::TestRequest::get().uri(uri));
    let res = test::call_service(app, req.to_request()).await;
    jar.absorb(&res);
    res
}

async fn view(
    app: &impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
    jar: &mut CookieJar,
    uri: &str,
) -> Value {
    let res = get(app, jar, uri).await;
    assert_eq!(res.status(), StatusCode::OK, "GET {uri}");
    let body = test::read_body(res).await;
    serde_json::from_slice(&body).expect("json view")
}

fn location(res: &ServiceResponse) -> Option<&str> {
    res.headers().get(LOCATION)?.to_str().ok()
}

async fn register(
    app: &impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
    name: &str,
    email: &str,
    password: &str,
) {
    let mut jar = CookieJar::default();
    let res = post(
        app,
        &mut jar,
        "/register",
        &[("name", name), ("email", email), ("password", password)],
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), Some("/login"));
}

async fn login(
    app: &impl Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
    jar: &mut CookieJar,
    email: &str,
    password: &str,
) -> Option<String> {
    let res = post(
        app,
        jar,
        "/login",
        &[("email", email), ("password", password)],
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    location(&res).map(str::to_owned)
}

#[rstest]
#[actix_web::test]
async fn register_login_and_change_password(state: HttpState) {
    let app = gateway_app(state).await;
    let mut jar = CookieJar::default();

    let res = post(
        &app,
        &mut jar,
        "/register",
        &[("name", "Ann"), ("email", "ann@x.com"), ("password", "password1")],
    )
    .await;
    assert_eq!(location(&res), Some("/login"));
    let login_view = view(&app, &mut jar, "/login").await;
    assert_eq!(login_view["status"], "Registration successful!");

    assert_eq!(
        login(&app, &mut jar, "ann@x.com", "password1").await.as_deref(),
        Some("/profile")
    );
    let profile = view(&app, &mut jar, "/profile").await;
    assert_eq!(profile["user"]["name"], "Ann");
    assert_eq!(profile["user"]["email"], "ann@x.com");

    let res = post(
        &app,
        &mut jar,
        "/change-password",
        &[
            ("current_password", "password1"),
            ("new_password", "newpass1"),
            ("new_password_confirmation", "newpass1"),
        ],
    )
    .await;
    assert_eq!(location(&res), Some("/profile"));
    let profile = view(&app, &mut jar, "/profile").await;
    assert_eq!(profile["status"], "Password changed successfully!");

    post(&app, &mut jar, "/logout", &[]).await;
    assert_eq!(
        login(&app, &mut jar, "ann@x.com", "password1").await.as_deref(),
        Some("/login")
    );
    let login_view = view(&app, &mut jar, "/login").await;
    assert_eq!(login_view["errors"], json!({ "email": "invalid credentials" }));

    assert_eq!(
        login(&app, &mut jar, "ann@x.com", "newpass1").await.as_deref(),
        Some("/profile")
    );
}

#[rstest]
#[actix_web::test]
async fn second_registration_with_same_email_is_rejected(state: HttpState) {
    let app = gateway_app(state).await;
    register(&app, "Ann", "ann@x.com", "password1").await;

    let mut jar = CookieJar::default();
    let res = post(
        &app,
        &mut jar,
        "/register",
        &[("name", "Other Ann"), ("email", "ANN@x.com"), ("password", "password2")],
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&test::read_body(res).await).expect("json error");
    assert_eq!(body["details"]["fields"][0]["field"], "email");
    assert_eq!(body["details"]["fields"][0]["code"], "email_taken");
    assert!(body["traceId"].is_string());

    assert_eq!(
        login(&app, &mut jar, "ann@x.com", "password1").await.as_deref(),
        Some("/profile")
    );
}

#[rstest]
#[actix_web::test]
async fn wrong_password_leaves_no_session(state: HttpState) {
    let app = gateway_app(state).await;
    register(&app, "Ann", "ann@x.com", "password1").await;
    let mut jar = CookieJar::default();

    assert_eq!(
        login(&app, &mut jar, "ann@x.com", "wrongpass").await.as_deref(),
        Some("/login")
    );
    let res = get(&app, &mut jar, "/profile").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), Some("/login"));
}

#[rstest]
#[actix_web::test]
async fn logout_is_idempotent(state: HttpState) {
    let app = gateway_app(state).await;
    register(&app, "Ann", "ann@x.com", "password1").await;
    let mut jar = CookieJar::default();
    login(&app, &mut jar, "ann@x.com", "password1").await;

    for _ in 0..2 {
        let res = post(&app, &mut jar, "/logout", &[]).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), Some("/login"));
    }

    let res = get(&app, &mut jar, "/profile").await;
    assert_eq!(location(&res), Some("/login"));
    let login_view = view(&app, &mut jar, "/login").await;
    assert_eq!(login_view["status"], "Login required!");
}

#[rstest]
#[actix_web::test]
async fn profile_update_keeps_own_email_and_rejects_anothers(state: HttpState) {
    let app = gateway_app(state).await;
    register(&app, "Ann", "ann@x.com", "password1").await;
    register(&app, "Bob", "bob@x.com", "password1").await;
    let mut jar = CookieJar::default();
    login(&app, &mut jar, "ann@x.com", "password1").await;

    let res = post(
        &app,
        &mut jar,
        "/profile",
        &[("name", "Ann Smith"), ("email", "ann@x.com")],
    )
    .await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), Some("/profile"));
    let profile = view(&app, &mut jar, "/profile").await;
    assert_eq!(profile["user"]["name"], "Ann Smith");

    let res = post(&app, &mut jar, "/profile", &[("email", "bob@x.com")]).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let profile = view(&app, &mut jar, "/profile").await;
    assert_eq!(profile["user"]["email"], "ann@x.com");
}

#[rstest]
#[actix_web::test]
async fn wrong_current_password_keeps_the_old_one(state: HttpState) {
    let app = gateway_app(state).await;
    register(&app, "Ann", "ann@x.com", "password1").await;
    let mut jar = CookieJar::default();
    login(&app, &mut jar, "ann@x.com", "password1").await;

    let res = post(
        &app,
        &mut jar,
        "/change-password",
        &[
            ("current_password", "password9"),
            ("new_password", "newpass1"),
            ("new_password_confirmation", "newpass1"),
        ],
    )
    .await;
    assert_eq!(location(&res), Some("/change-password"));
    let form = view(&app, &mut jar, "/change-password").await;
    assert!(form["errors"]["current_password"].is_string());

    post(&app, &mut jar, "/logout", &[]).await;
    assert_eq!(
        login(&app, &mut jar, "ann@x.com", "password1").await.as_deref(),
        Some("/profile")
    );
}

#[rstest]
#[actix_web::test]
async fn responses_carry_a_trace_id(state: HttpState) {
    let app = gateway_app(state).await;
    let mut jar = CookieJar::default();
    let res = get(&app, &mut jar, "/login").await;
    assert!(res.headers().contains_key("trace-id"));
}
