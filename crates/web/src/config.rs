//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Web server configuration.
///
/// Provider and processor settings are read by their own crates
/// (`LlmClientConfig::from_env`, `StripeConfig::from_env`).
#[derive(Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Origin used for checkout redirects when a request has no `Origin`.
    pub public_url: String,
    /// Built front end served at `/`.
    pub static_dir: PathBuf,
    /// Key for session cookies and identity assertions.
    pub session_secret: String,
    /// openId promoted to admin when it signs in.
    pub owner_open_id: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("database_url", &self.database_url)
            .field("public_url", &self.public_url)
            .field("static_dir", &self.static_dir)
            .field("owner_open_id", &self.owner_open_id)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `FLERTE_ADDR` | Server bind address | `127.0.0.1:3000` |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:flerte.db?mode=rwc` |
    /// | `FLERTE_PUBLIC_URL` | Fallback checkout origin | `http://localhost:3000` |
    /// | `FLERTE_STATIC_DIR` | Front-end build directory | `dist/public` |
    /// | `SESSION_SECRET` | Session signing key | (required) |
    /// | `OWNER_OPEN_ID` | openId promoted to admin | (none) |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("FLERTE_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:flerte.db?mode=rwc".to_string());

        let public_url = env::var("FLERTE_PUBLIC_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let static_dir = env::var("FLERTE_STATIC_DIR")
            .unwrap_or_else(|_| "dist/public".to_string())
            .into();

        let session_secret = env::var("SESSION_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSessionSecret)?;

        let owner_open_id = env::var("OWNER_OPEN_ID").ok().filter(|s| !s.is_empty());

        Ok(Self {
            addr,
            database_url,
            public_url,
            static_dir,
            session_secret,
            owner_open_id,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid FLERTE_ADDR format")]
    InvalidAddr,

    #[error("SESSION_SECRET environment variable is required")]
    MissingSessionSecret,
}
