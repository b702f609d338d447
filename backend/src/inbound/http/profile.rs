//! Profile and password handlers for the signed-in user.
//!
//! An anonymous caller, or one whose session names a user that no longer
//! exists, is redirected to the login form with "Login required!" flashed.

use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{Error, ErrorCode, PasswordChange, ProfileChanges};

use super::ApiResult;
use super::redirect::{
    CHANGE_PASSWORD_PATH, PROFILE_PATH, back_with_auth_error, login_required, see_other,
    see_other_with_status,
};
use super::schemas::ErrorSchema;
use super::session::SessionContext;
use super::state::HttpState;
use super::views::{CHANGE_PASSWORD_VIEW, PROFILE_VIEW, ViewResponse};

pub const PASSWORD_CHANGED: &str = "Password changed successfully!";

/// Profile form body. Absent fields are left unchanged.
#[derive(Default, Deserialize, ToSchema)]
pub struct ProfileForm {
    #[schema(example = "Ann Smith")]
    pub name: Option<String>,
    #[schema(example = "ann.smith@x.com")]
    pub email: Option<String>,
}

/// Password change form body.
#[derive(Default, Deserialize, ToSchema)]
pub struct ChangePasswordForm {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub new_password_confirmation: Option<String>,
}

/// Treat a vanished user as anonymous; pass other errors through.
fn stale_session_or(session: &SessionContext, error: Error) -> ApiResult<HttpResponse> {
    if error.code() == ErrorCode::NotFound {
        session.forget_user();
        return login_required(session);
    }
    Err(error)
}

/// Show the current user's profile.
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Profile view with the current user", body = ViewResponse),
        (status = 303, description = "Redirect to /login when not signed in"),
        (status = 503, description = "User store unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["profile"],
    operation_id = "showProfile"
)]
#[get("/profile")]
pub async fn show_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let Some(user_id) = session.user_id()? else {
        return login_required(&session);
    };
    match state.profile_query.fetch_profile(&user_id).await {
        Ok(user) => {
            let view = ViewResponse::new(PROFILE_VIEW, session.take_flash()?).with_user(&user);
            Ok(HttpResponse::Ok().json(view))
        }
        Err(error) => stale_session_or(&session, error),
    }
}

/// Update the display name and/or email.
#[utoipa::path(
    post,
    path = "/profile",
    request_body(content = ProfileForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to /profile, or to /login when not signed in"),
        (status = 400, description = "Invalid form or email already taken", body = ErrorSchema),
        (status = 503, description = "User store unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["profile"],
    operation_id = "updateProfile"
)]
#[post("/profile")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<ProfileForm>,
) -> ApiResult<HttpResponse> {
    let Some(user_id) = session.user_id()? else {
        return login_required(&session);
    };
    let ProfileForm { name, email } = form.into_inner();
    let changes = ProfileChanges::try_from_parts(name.as_deref(), email.as_deref())?;
    match state.profile_command.update_profile(&user_id, &changes).await {
        Ok(_) => Ok(see_other(PROFILE_PATH)),
        Err(error) => stale_session_or(&session, error),
    }
}

/// Show the password change form.
#[utoipa::path(
    get,
    path = "/change-password",
    responses((status = 200, description = "Change password view", body = ViewResponse)),
    tags = ["profile"],
    operation_id = "showChangePassword"
)]
#[get("/change-password")]
pub async fn show_change_password(session: SessionContext) -> ApiResult<web::Json<ViewResponse>> {
    Ok(web::Json(ViewResponse::new(
        CHANGE_PASSWORD_VIEW,
        session.take_flash()?,
    )))
}

/// Replace the password after checking the current one.
///
/// A wrong current password redirects back to the form with the error
/// flashed on `current_password`.
#[utoipa::path(
    post,
    path = "/change-password",
    request_body(content = ChangePasswordForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to /profile on success, back to the form, or to /login"),
        (status = 400, description = "Invalid form", body = ErrorSchema),
        (status = 503, description = "User store unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["profile"],
    operation_id = "changePassword"
)]
#[post("/change-password")]
pub async fn change_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    form: web::Form<ChangePasswordForm>,
) -> ApiResult<HttpResponse> {
    let Some(user_id) = session.user_id()? else {
        return login_required(&session);
    };
    let ChangePasswordForm {
        current_password,
        new_password,
        new_password_confirmation,
    } = form.into_inner();
    let change = PasswordChange::try_from_parts(
        current_password.as_deref(),
        new_password.as_deref(),
        new_password_confirmation.as_deref(),
    )?;
    match state.profile_command.change_password(&user_id, &change).await {
        Ok(()) => see_other_with_status(&session, PROFILE_PATH, PASSWORD_CHANGED),
        Err(error) if error.code() == ErrorCode::NotFound => stale_session_or(&session, error),
        Err(error) => back_with_auth_error(&session, error, CHANGE_PASSWORD_PATH),
    }
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
