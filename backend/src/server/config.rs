//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use chrono::Duration;
use ideaboard::outbound::persistence::DbPool;
use ideaboard::settings::StoreKind;
use zeroize::Zeroizing;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) token_secret: Zeroizing<Vec<u8>>,
    pub(crate) token_ttl: Duration,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a server configuration from the token settings and listener.
    #[must_use]
    pub fn new(token_secret: Zeroizing<Vec<u8>>, token_ttl: Duration, bind_addr: SocketAddr) -> Self {
        Self {
            token_secret,
            token_ttl,
            bind_addr,
            db_pool: None,
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// Without a pool the server keeps all records in memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Store the repositories will be built over.
    #[must_use]
    pub fn store_kind(&self) -> StoreKind {
        if self.db_pool.is_some() {
            StoreKind::Postgres
        } else {
            StoreKind::Memory
        }
    }
}
