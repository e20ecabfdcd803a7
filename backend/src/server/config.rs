//! Server settings loaded via OrthoConfig, and the configuration object the
//! server is built from.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use portal::inbound::http::session_config::SessionSettings;
use portal::outbound::password::{DEFAULT_BCRYPT_COST, MAX_COST, MIN_COST, PasswordHasher};
use portal::outbound::persistence::DbPool;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Values read from the command line, `PORTAL_*` environment variables, or a
/// configuration file.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PORTAL")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; accounts are kept in memory when absent.
    pub database_url: Option<String>,
    /// bcrypt work factor for new password hashes.
    pub bcrypt_cost: Option<u32>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
}

/// Raised when a setting is present but unusable.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// `bind_addr` is not a socket address.
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    /// `bcrypt_cost` is outside what bcrypt accepts.
    #[error("bcrypt cost {value} is outside {min}..={max}", min = MIN_COST, max = MAX_COST)]
    BcryptCost { value: u32 },
}

impl ServerSettings {
    /// Check every setting that has a constrained range.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.bind_addr()?;
        self.bcrypt_cost()?;
        Ok(())
    }

    /// Address to bind, defaulting to all interfaces on port 8080.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|source| SettingsError::BindAddr {
            value: raw.to_owned(),
            source,
        })
    }

    /// bcrypt work factor, defaulting to 12.
    pub fn bcrypt_cost(&self) -> Result<u32, SettingsError> {
        let value = self.bcrypt_cost.unwrap_or(DEFAULT_BCRYPT_COST);
        if (MIN_COST..=MAX_COST).contains(&value) {
            Ok(value)
        } else {
            Err(SettingsError::BcryptCost { value })
        }
    }

    /// Pool size, defaulting to 10.
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }
}

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) hasher: PasswordHasher,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Configuration using the in-memory store until a pool is attached.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr, hasher: PasswordHasher) -> Self {
        Self {
            session,
            bind_addr,
            hasher,
            db_pool: None,
        }
    }

    /// Store accounts in PostgreSQL through `pool`.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}
