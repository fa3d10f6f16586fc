//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `BOOKING_AGENT` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use booking_agent::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Bookings are written to {}", config.storage.bookings_path.display());
//! ```

mod ai;
mod error;
mod server;
mod storage;

pub use ai::AiConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};
pub use storage::StorageConfig;

use serde::Deserialize;

/// Plain variable accepted when the prefixed API key is not set.
pub const FALLBACK_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Text generation provider configuration
    #[serde(default)]
    pub ai: AiConfig,

    /// Booking store configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Seeds `ai.gemini_api_key` from `GEMINI_API_KEY` when that is set
    /// 3. Reads environment variables with `BOOKING_AGENT` prefix, which win
    ///    over the seeded value
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `BOOKING_AGENT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `BOOKING_AGENT__AI__GEMINI_API_KEY=...` -> `ai.gemini_api_key = ...`
    /// - `BOOKING_AGENT__STORAGE__BOOKINGS_PATH=...` -> `storage.bookings_path = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    /// A missing API key is reported by [`AppConfig::validate`].
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Ok(key) = std::env::var(FALLBACK_API_KEY_VAR) {
            builder = builder.set_default("ai.gemini_api_key", key)?;
        }

        let config = builder
            .add_source(
                config::Environment::default()
                    .prefix("BOOKING_AGENT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid,
    /// including `MissingRequired("GEMINI_API_KEY")` when no key is set.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.ai.validate()?;
        self.storage.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
