//! HTTP inbound adapter exposing the credential gateway's form endpoints.
//!
//! Handlers parse urlencoded forms into domain request types, call a
//! driving port from [`state::HttpState`], and answer with either a view
//! payload or a `303 See Other`.

pub mod auth;
pub mod error;
pub mod profile;
pub mod redirect;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod views;

pub use error::ApiResult;

use actix_web::web;

use crate::domain::Error;

/// Form extractor settings: undecodable bodies become `invalid_request`.
pub fn form_config() -> web::FormConfig {
    web::FormConfig::default().error_handler(|err, _req| {
        Error::invalid_request(format!("malformed form body: {err}")).into()
    })
}

/// Register every gateway route on `cfg`.
///
/// The caller supplies the session middleware and `web::Data<HttpState>`.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use gateway::inbound::http::configure;
///
/// let _app = App::new().configure(configure);
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(form_config())
        .service(auth::show_login)
        .service(auth::login)
        .service(auth::logout)
        .service(auth::show_register)
        .service(auth::register)
        .service(profile::show_profile)
        .service(profile::update_profile)
        .service(profile::show_change_password)
        .service(profile::change_password);
}
