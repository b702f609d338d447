//! Builders for the shared HTTP state.

use std::sync::Arc;

use tracing::{info, warn};

use gateway::domain::CredentialGateway;
use gateway::inbound::http::state::HttpState;
use gateway::outbound::persistence::DieselUserRepository;
use gateway::outbound::{Argon2PasswordHasher, InMemoryUserRepository};

use super::ServerConfig;

/// Wire the credential gateway to PostgreSQL when a pool is configured,
/// otherwise to an in-memory store that is lost on restart.
pub(super) fn build_http_state(config: &ServerConfig) -> HttpState {
    let hasher = Arc::new(config.hasher.clone());
    match &config.db_pool {
        Some(pool) => {
            info!("using PostgreSQL user store");
            let users = Arc::new(DieselUserRepository::new(pool.clone()));
            HttpState::from_service(Arc::new(CredentialGateway::new(users, hasher)))
        }
        None => {
            warn!("no database configured; users are kept in memory");
            in_memory_state(hasher)
        }
    }
}

fn in_memory_state(hasher: Arc<Argon2PasswordHasher>) -> HttpState {
    let users = Arc::new(InMemoryUserRepository::new());
    HttpState::from_service(Arc::new(CredentialGateway::new(users, hasher)))
}
