//! Gateway entry-point: loads configuration, prepares storage and serves the
//! credential forms.

mod server;

use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use gateway::config::GatewaySettings;
use gateway::inbound::http::session_config::{BuildMode, session_settings_from_env};
use gateway::outbound::Argon2PasswordHasher;
use gateway::outbound::persistence::{DbPool, PoolConfig, apply_migrations};

use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        GatewaySettings::load().map_err(|err| eyre!("failed to load configuration: {err}"))?;

    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    info!(
        fingerprint = %session.key_fingerprint(),
        "session signing key loaded"
    );

    let cost = settings.argon2_cost();
    let hasher = Argon2PasswordHasher::with_params(cost.memory_kib, cost.iterations, cost.parallelism)
        .wrap_err("invalid argon2 parameters")?;

    let mut config = ServerConfig::new(session, settings.bind_addr()).with_hasher(hasher);

    if let Some(url) = settings.database_url() {
        let applied = apply_migrations(url.to_owned())
            .await
            .wrap_err("database migration failed")?;
        info!(applied, "database migrations applied");

        let pool = DbPool::new(
            PoolConfig::new(url).with_max_size(settings.db_max_connections),
        )
        .await
        .wrap_err("failed to build database pool")?;
        config = config.with_db_pool(pool);
    }

    let bind_addr = settings.bind_addr();
    let server = create_server(config).wrap_err_with(|| format!("failed to bind {bind_addr}"))?;
    info!(%bind_addr, "gateway listening");
    server.await.wrap_err("server terminated with an error")
}
