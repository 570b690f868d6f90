//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without I/O.

use std::sync::Arc;

use chrono::Duration;
use mockable::Clock;

use crate::domain::ports::{
    CredentialHasher, EvaluationRepository, FollowRepository, IdeaRepository, TokenService,
    UserRepository,
};
use crate::domain::{
    AccountPorts, AccountService, EvaluationPorts, EvaluationService, IdeaPorts, IdeaService,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub users: Arc<dyn UserRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub ideas: Arc<dyn IdeaRepository>,
    pub evaluations: Arc<dyn EvaluationRepository>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub tokens: Arc<dyn TokenService>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: AccountService,
    pub ideas: IdeaService,
    pub evaluations: EvaluationService,
}

impl HttpState {
    /// Wire the services over one set of ports.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use chrono::Duration;
    /// use ideaboard::inbound::http::state::{HttpState, HttpStatePorts};
    /// use ideaboard::outbound::memory::MemoryStore;
    /// use ideaboard::outbound::security::{Argon2Hasher, JwtTokenService};
    /// use mockable::DefaultClock;
    /// use zeroize::Zeroizing;
    ///
    /// let clock = Arc::new(DefaultClock);
    /// let store = MemoryStore::new(clock.clone());
    /// let ports = HttpStatePorts {
    ///     users: Arc::new(store.clone()),
    ///     follows: Arc::new(store.clone()),
    ///     ideas: Arc::new(store.clone()),
    ///     evaluations: Arc::new(store),
    ///     hasher: Arc::new(Argon2Hasher::new()),
    ///     tokens: Arc::new(JwtTokenService::new(
    ///         Zeroizing::new(vec![7; 32]),
    ///         clock.clone(),
    ///     )),
    /// };
    /// let state = HttpState::new(ports, clock, Duration::minutes(60));
    /// let _accounts = state.accounts.clone();
    /// ```
    pub fn new(ports: HttpStatePorts, clock: Arc<dyn Clock>, token_ttl: Duration) -> Self {
        let HttpStatePorts {
            users,
            follows,
            ideas,
            evaluations,
            hasher,
            tokens,
        } = ports;
        let accounts = AccountService::new(
            AccountPorts {
                users: users.clone(),
                follows: follows.clone(),
                ideas: ideas.clone(),
                hasher,
                tokens,
            },
            clock.clone(),
        )
        .with_token_ttl(token_ttl);
        let idea_service = IdeaService::new(
            IdeaPorts {
                ideas: ideas.clone(),
                users: users.clone(),
                follows,
                evaluations: evaluations.clone(),
            },
            clock,
        );
        let evaluation_service = EvaluationService::new(EvaluationPorts {
            evaluations,
            ideas,
            users,
        });
        Self {
            accounts,
            ideas: idea_service,
            evaluations: evaluation_service,
        }
    }
}
