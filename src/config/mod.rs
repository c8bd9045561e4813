//! Application configuration module
//!
//! Configuration is read from environment variables with the `BILLING` prefix,
//! nested values separated by a double underscore. A `.env` file is honoured
//! when present.
//!
//! # Example
//!
//! ```no_run
//! use billing_bridge::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod database;
mod error;
mod fiscal;
mod gateway;
mod server;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use fiscal::FiscalConfig;
pub use gateway::GatewayConfig;
pub use server::ServerConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL connection
    pub database: DatabaseConfig,

    /// Asaas credentials and endpoint
    pub gateway: GatewayConfig,

    /// Overrides for automatically issued invoices
    #[serde(default)]
    pub fiscal: FiscalConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// - `BILLING__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `BILLING__GATEWAY__API_KEY=...` -> `gateway.api_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or cannot be
    /// parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BILLING")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.gateway.validate()?;
        self.fiscal.validate()?;
        Ok(())
    }
}
