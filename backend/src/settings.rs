//! Server configuration loaded via OrthoConfig.
//!
//! Values come from `IDEABOARD_*` environment variables, configuration
//! files, and command-line flags, in increasing precedence.

use std::net::{Ipv4Addr, SocketAddr};

use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT))
}

/// Which store backs the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// PostgreSQL through the Diesel adapters.
    Postgres,
    /// In-process maps; nothing survives a restart.
    Memory,
}

impl StoreKind {
    /// Label used in startup logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Memory => "memory",
        }
    }
}

/// Settings controlling the HTTP listener and the backing store.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "IDEABOARD")]
pub struct ServerSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL connection string. Absent selects the in-memory store.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
}

impl ServerSettings {
    /// Return the configured bind address, falling back to `0.0.0.0:8080`.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or_else(default_bind_addr)
    }

    /// Return the configured pool size, falling back to 10.
    #[must_use]
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS)
    }

    /// Return the non-blank database URL, if any.
    #[must_use]
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Store selected by these settings.
    #[must_use]
    pub fn store_kind(&self) -> StoreKind {
        if self.database_url().is_some() {
            StoreKind::Postgres
        } else {
            StoreKind::Memory
        }
    }
}
