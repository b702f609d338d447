//! Post/redirect/get helpers shared by the form handlers.

use actix_web::HttpResponse;
use actix_web::http::header::LOCATION;
use tracing::debug;

use crate::domain::{Error, ErrorCode};

use super::ApiResult;
use super::session::SessionContext;

pub const LOGIN_PATH: &str = "/login";
pub const PROFILE_PATH: &str = "/profile";
pub const CHANGE_PASSWORD_PATH: &str = "/change-password";

pub const LOGIN_REQUIRED: &str = "Login required!";

/// `303 See Other` to `location`.
pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}

/// Flash `status` and redirect.
pub fn see_other_with_status(
    session: &SessionContext,
    location: &str,
    status: &str,
) -> ApiResult<HttpResponse> {
    session.flash_status(status)?;
    Ok(see_other(location))
}

/// Send an anonymous caller to the login form.
pub fn login_required(session: &SessionContext) -> ApiResult<HttpResponse> {
    see_other_with_status(session, LOGIN_PATH, LOGIN_REQUIRED)
}

/// Turn a credential rejection into a flashed field error and a redirect
/// back to the form. Other errors propagate.
pub fn back_with_auth_error(
    session: &SessionContext,
    error: Error,
    form_path: &str,
) -> ApiResult<HttpResponse> {
    if error.code() != ErrorCode::Unauthorized {
        return Err(error);
    }
    let field = error
        .details()
        .and_then(|details| details.get("field"))
        .and_then(|field| field.as_str())
        .unwrap_or("email");
    debug!(field, form = form_path, "credential rejected");
    session.flash_error(field, error.message())?;
    Ok(see_other(form_path))
}
