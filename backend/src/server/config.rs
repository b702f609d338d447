//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use gateway::inbound::http::session_config::SessionSettings;
use gateway::outbound::Argon2PasswordHasher;
use gateway::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) hasher: Argon2PasswordHasher,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a server configuration with the default password hasher and
    /// an in-memory user store.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr) -> Self {
        Self {
            session,
            bind_addr,
            hasher: Argon2PasswordHasher::default(),
            db_pool: None,
        }
    }

    /// Attach a database connection pool.
    ///
    /// When provided, users are stored in PostgreSQL instead of memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Replace the password hasher.
    #[must_use]
    pub fn with_hasher(mut self, hasher: Argon2PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }
}
