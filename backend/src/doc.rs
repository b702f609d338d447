//! OpenAPI document for the credential gateway.
//!
//! Registers every form endpoint, the view and form schemas, and the domain
//! error wrappers from [`crate::inbound::http::schemas`]. Served by Swagger
//! UI in debug builds and printed by the `openapi-dump` binary.

use crate::inbound::http::auth::{LoginForm, RegisterForm};
use crate::inbound::http::profile::{ChangePasswordForm, ProfileForm};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::views::{UserView, ViewResponse};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Adds the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Encrypted session cookie issued by POST /login.",
            ))),
        );
    }
}

/// OpenAPI document for the gateway's HTTP surface.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Credential gateway",
        description = "Registration, login, profile editing and password change over urlencoded forms."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::show_login,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::show_register,
        crate::inbound::http::auth::register,
        crate::inbound::http::profile::show_profile,
        crate::inbound::http::profile::update_profile,
        crate::inbound::http::profile::show_change_password,
        crate::inbound::http::profile::change_password,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        ViewResponse,
        UserView,
        LoginForm,
        RegisterForm,
        ProfileForm,
        ChangePasswordForm,
    )),
    tags(
        (name = "auth", description = "Login, logout and registration"),
        (name = "profile", description = "Signed-in user's profile and password")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn object_fields(schema: &RefOr<Schema>) -> Vec<String> {
        match schema {
            RefOr::T(Schema::Object(obj)) => obj.properties.keys().cloned().collect(),
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("/login")]
    #[case("/logout")]
    #[case("/register")]
    #[case("/profile")]
    #[case("/change-password")]
    fn every_route_is_documented(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[rstest]
    fn error_schema_matches_wire_shape() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let fields = object_fields(schemas.get("crate.domain.Error").expect("Error schema"));
        for field in ["code", "message", "traceId", "details"] {
            assert!(fields.iter().any(|f| f == field), "missing {field}");
        }
    }

    #[rstest]
    fn user_view_never_exposes_the_hash() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let mut fields = object_fields(schemas.get("UserView").expect("UserView schema"));
        fields.sort();
        assert_eq!(fields, vec!["email", "id", "name"]);
    }

    #[rstest]
    fn session_cookie_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("SessionCookie"));
    }
}
