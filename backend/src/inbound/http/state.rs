//! Shared HTTP adapter state.
//!
//! Handlers receive this through `actix_web::web::Data` and depend only on
//! driving ports, so they can be exercised with doubles and no I/O.

use std::sync::Arc;

use crate::domain::ports::{
    LoginService, RegistrationService, UserProfileCommand, UserProfileQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub login: Arc<dyn LoginService>,
    pub registration: Arc<dyn RegistrationService>,
    pub profile_query: Arc<dyn UserProfileQuery>,
    pub profile_command: Arc<dyn UserProfileCommand>,
}

impl HttpState {
    /// Wire every port to the same service, which is how the credential
    /// gateway is deployed.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use gateway::domain::CredentialGateway;
    /// use gateway::inbound::http::state::HttpState;
    /// use gateway::outbound::{Argon2PasswordHasher, InMemoryUserRepository};
    ///
    /// let service = Arc::new(CredentialGateway::new(
    ///     Arc::new(InMemoryUserRepository::new()),
    ///     Arc::new(Argon2PasswordHasher::default()),
    /// ));
    /// let state = HttpState::from_service(service);
    /// let _login = state.login.clone();
    /// ```
    pub fn from_service<S>(service: Arc<S>) -> Self
    where
        S: LoginService + RegistrationService + UserProfileQuery + UserProfileCommand + 'static,
    {
        Self {
            login: service.clone(),
            registration: service.clone(),
            profile_query: service.clone(),
            profile_command: service,
        }
    }
}
