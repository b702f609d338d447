//! Gateway configuration loaded via OrthoConfig.
//!
//! Values come from `GATEWAY_*` environment variables and matching CLI
//! flags. Session cookie settings are read separately by
//! [`crate::inbound::http::session_config`].

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_BIND_PORT: u16 = 8080;

fn default_bind_addr() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, DEFAULT_BIND_PORT))
}

/// Process-level settings for the gateway binary.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "GATEWAY")]
pub struct GatewaySettings {
    /// Socket address the HTTP server listens on.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL URL. Without one the gateway keeps users in memory.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    #[ortho_config(default = 10)]
    pub db_max_connections: u32,
    /// Argon2 memory cost in KiB.
    #[ortho_config(default = 19456)]
    pub argon2_memory_kib: u32,
    /// Argon2 iteration count.
    #[ortho_config(default = 2)]
    pub argon2_iterations: u32,
    /// Argon2 lane count.
    #[ortho_config(default = 1)]
    pub argon2_parallelism: u32,
}

/// Argon2 cost parameters as `(memory_kib, iterations, parallelism)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Cost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl GatewaySettings {
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or_else(default_bind_addr)
    }

    /// Database URL with blank values treated as unset.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn argon2_cost(&self) -> Argon2Cost {
        Argon2Cost {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }
}
