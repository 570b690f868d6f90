//! Builders wiring repository adapters into the HTTP state.

use std::sync::Arc;

use actix_web::web;
use chrono::Duration;
use mockable::{Clock, DefaultClock};
use zeroize::Zeroizing;

use ideaboard::inbound::http::state::{HttpState, HttpStatePorts};
use ideaboard::outbound::memory::MemoryStore;
use ideaboard::outbound::persistence::{
    DbPool, DieselEvaluationRepository, DieselFollowRepository, DieselIdeaRepository,
    DieselUserRepository,
};
use ideaboard::outbound::security::{Argon2Hasher, JwtTokenService};

use super::ServerConfig;

/// Repository ports over the configured store, without the security adapters.
fn store_ports(
    pool: Option<&DbPool>,
    clock: &Arc<dyn Clock>,
    hasher: Arc<Argon2Hasher>,
    tokens: Arc<JwtTokenService>,
) -> HttpStatePorts {
    match pool {
        Some(pool) => HttpStatePorts {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            follows: Arc::new(DieselFollowRepository::new(pool.clone(), clock.clone())),
            ideas: Arc::new(DieselIdeaRepository::new(pool.clone())),
            evaluations: Arc::new(DieselEvaluationRepository::new(pool.clone(), clock.clone())),
            hasher,
            tokens,
        },
        None => {
            let store = MemoryStore::new(clock.clone());
            HttpStatePorts {
                users: Arc::new(store.clone()),
                follows: Arc::new(store.clone()),
                ideas: Arc::new(store.clone()),
                evaluations: Arc::new(store),
                hasher,
                tokens,
            }
        }
    }
}

fn build_state(
    pool: Option<&DbPool>,
    secret: Zeroizing<Vec<u8>>,
    token_ttl: Duration,
    clock: Arc<dyn Clock>,
) -> HttpState {
    let hasher = Arc::new(Argon2Hasher::new());
    let tokens = Arc::new(JwtTokenService::new(secret, clock.clone()));
    let ports = store_ports(pool, &clock, hasher, tokens);
    HttpState::new(ports, clock, token_ttl)
}

/// Build the shared HTTP state from the server configuration.
///
/// Uses the Diesel adapters when a pool is configured and a fresh
/// [`MemoryStore`] otherwise. The token secret is copied into the signing
/// service; the configuration keeps its own zeroizing copy.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let secret = Zeroizing::new(config.token_secret.to_vec());
    web::Data::new(build_state(
        config.db_pool.as_ref(),
        secret,
        config.token_ttl,
        clock,
    ))
}
