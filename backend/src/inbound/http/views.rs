//! View payloads returned by the form endpoints.
//!
//! Templating is left to the client; each `GET` returns the data a template
//! would need: which view to render, any flashed status and field errors,
//! and for the profile page the current user.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::User;

use super::session::Flash;

/// Template names.
pub const LOGIN_VIEW: &str = "login";
pub const REGISTER_VIEW: &str = "register";
pub const PROFILE_VIEW: &str = "profile";
pub const CHANGE_PASSWORD_VIEW: &str = "change_password";

/// Public projection of a user. The password hash never leaves the domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserView {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    #[schema(example = "Ann")]
    pub name: String,
    #[schema(example = "ann@x.com")]
    pub email: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            name: user.display_name().to_string(),
            email: user.email().to_string(),
        }
    }
}

/// Data for rendering one of the gateway's forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ViewResponse {
    /// Template to render.
    #[schema(example = "login")]
    pub view: String,
    /// Flashed status message.
    #[schema(example = "Registration successful!")]
    pub status: Option<String>,
    /// Flashed errors keyed by form field.
    pub errors: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserView>,
}

impl ViewResponse {
    /// View populated from consumed flash data.
    pub fn new(view: &str, flash: Flash) -> Self {
        Self {
            view: view.to_owned(),
            status: flash.status,
            errors: flash.errors,
            user: None,
        }
    }

    pub fn with_user(mut self, user: &User) -> Self {
        self.user = Some(UserView::from(user));
        self
    }
}
