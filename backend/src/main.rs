//! Backend entry-point: loads configuration, builds the store, and serves HTTP.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use ideaboard::inbound::http::health::HealthState;
use ideaboard::inbound::http::token_config::{BuildMode, token_settings_from_env};
use ideaboard::outbound::persistence::{DbPool, PoolConfig};
use ideaboard::settings::ServerSettings;
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
        ServerSettings::load().map_err(|e| eyre!("failed to load server settings: {e}"))?;
    let tokens = token_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid token configuration")?;
    if tokens.ephemeral {
        warn!("using ephemeral token secret; tokens will not survive a restart");
    }
    info!(
        fingerprint = %tokens.fingerprint(),
        ttl_minutes = tokens.ttl.num_minutes(),
        "token secret loaded"
    );

    let bind_addr = settings.bind_addr();
    let mut config = ServerConfig::new(tokens.secret, tokens.ttl, bind_addr);
    if let Some(url) = settings.database_url() {
        let pool_config = PoolConfig::new(url).with_max_size(settings.db_max_connections());
        let pool = DbPool::new(pool_config)
            .await
            .wrap_err("failed to build database pool")?;
        config = config.with_db_pool(pool);
    }

    info!(
        bind_addr = %bind_addr,
        store = config.store_kind().as_str(),
        "starting server"
    );
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config).wrap_err("failed to start server")?;
    server.await.wrap_err("server terminated with an error")
}
