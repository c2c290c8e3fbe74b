//! Runtime configuration.
//!
//! Values are layered, lowest priority first:
//!
//! 1. built-in defaults
//! 2. `DATABASE_URL` (the conventional unprefixed name)
//! 3. `CONTACTS_*` environment variables, e.g. `CONTACTS_BIND_ADDR`,
//!    `CONTACTS_MAX_PER_PAGE`
//!
//! A `.env` file in the working directory is read into the environment first.

use std::net::SocketAddr;

use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pagination::PageLimits;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// PostgreSQL URL. Without one the service keeps contacts in memory.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub default_per_page: u32,
    pub max_per_page: u32,
    /// Default `tracing` filter directive; `RUST_LOG` takes precedence.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let limits = PageLimits::default();
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            db_max_connections: u32::try_from(num_cpus::get() * 2).unwrap_or(10),
            default_per_page: limits.default_per_page,
            max_per_page: limits.max_per_page,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load from `.env`, the process environment and defaults.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_figment(Self::figment())
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(&["DATABASE_URL"]))
            .merge(Env::prefixed("CONTACTS_"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Config = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_max_connections == 0 {
            return Err(ConfigError::Invalid(
                "db_max_connections must be at least 1".to_string(),
            ));
        }
        if self.default_per_page == 0 || self.max_per_page == 0 {
            return Err(ConfigError::Invalid(
                "page sizes must be at least 1".to_string(),
            ));
        }
        if self.default_per_page > self.max_per_page {
            return Err(ConfigError::Invalid(format!(
                "default_per_page ({}) exceeds max_per_page ({})",
                self.default_per_page, self.max_per_page
            )));
        }
        Ok(())
    }

    pub fn page_limits(&self) -> PageLimits {
        PageLimits {
            default_per_page: self.default_per_page,
            max_per_page: self.max_per_page,
        }
    }
}
