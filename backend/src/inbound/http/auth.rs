//! Login, logout and registration handlers.
//!
//! ```text
//! GET  /login
//! POST /login     email=ann@x.com&password=password1
//! POST /logout
//! GET  /register
//! POST /register  name=Ann&email=ann@x.com&password=password1
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{LoginCredentials, Registration};

use super::ApiResult;
use super::redirect::{
    LOGIN_PATH, PROFILE_PATH, back_with_auth_error, see_other, see_other_with_status,
};
use super::schemas::ErrorSchema;
use super::session::SessionContext;
use super::state::HttpState;
use super::views::{LOGIN_VIEW, REGISTER_VIEW, ViewResponse};

pub const REGISTRATION_SUCCESSFUL: &str = "Registration successful!";

/// Login form body. Fields are optional so absence is reported per field.
#[derive(Default, Deserialize, ToSchema)]
pub struct LoginForm {
    #[schema(example = "ann@x.com")]
    pub email: Option<String>,
    #[schema(example = "password1")]
    pub password: Option<String>,
}

/// Registration form body.
#[derive(Default, Deserialize, ToSchema)]
pub struct RegisterForm {
    #[schema(example = "Ann")]
    pub name: Option<String>,
    #[schema(example = "ann@x.com")]
    pub email: Option<String>,
    #[schema(example = "password1")]
    pub password: Option<String>,
}

/// Show the login form.
#[utoipa::path(
    get,
    path = "/login",
    responses((status = 200, description = "Login view", body = ViewResponse)),
    tags = ["auth"],
    operation_id = "showLogin",
    security([])
)]
#[get("/login")]
pub async fn show_login(session: SessionContext) -> ApiResult<web::Json<ViewResponse>> {
    Ok(web::Json(ViewResponse::new(LOGIN_VIEW, session.take_flash()?)))
}

/// Authenticate and bind the session to the user.
///
/// Wrong credentials redirect back to the form with a generic error flashed
/// on `email`.
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to /profile on success or back to /login",
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid form", body = ErrorSchema),
        (status = 503, description = "User store unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<LoginForm>,
) -> ApiResult<HttpResponse> {
    let LoginForm { email, password } = form.into_inner();
    let credentials = LoginCredentials::try_from_parts(email.as_deref(), password.as_deref())?;
    match state.login.authenticate(&credentials).await {
        Ok(user_id) => {
            session.login(&user_id)?;
            Ok(see_other(PROFILE_PATH))
        }
        Err(error) => back_with_auth_error(&session, error, LOGIN_PATH),
    }
}

/// End the session. Succeeds whether or not one existed.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 303, description = "Redirect to /login")),
    tags = ["auth"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    if let Ok(Some(user_id)) = session.user_id() {
        info!(user_id = %user_id, "user logged out");
    }
    session.logout();
    see_other(LOGIN_PATH)
}

/// Show the registration form.
#[utoipa::path(
    get,
    path = "/register",
    responses((status = 200, description = "Registration view", body = ViewResponse)),
    tags = ["auth"],
    operation_id = "showRegister",
    security([])
)]
#[get("/register")]
pub async fn show_register(session: SessionContext) -> ApiResult<web::Json<ViewResponse>> {
    Ok(web::Json(ViewResponse::new(
        REGISTER_VIEW,
        session.take_flash()?,
    )))
}

/// Create an account and send the user to the login form.
#[utoipa::path(
    post,
    path = "/register",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to /login with a status message"),
        (status = 400, description = "Invalid form or email already taken", body = ErrorSchema),
        (status = 503, description = "User store unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<RegisterForm>,
) -> ApiResult<HttpResponse> {
    let RegisterForm {
        name,
        email,
        password,
    } = form.into_inner();
    let registration =
        Registration::try_from_parts(name.as_deref(), email.as_deref(), password.as_deref())?;
    state.registration.register(&registration).await?;
    see_other_with_status(&session, LOGIN_PATH, REGISTRATION_SUCCESSFUL)
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
