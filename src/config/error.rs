//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Session idle timeout and sweep interval must be positive")]
    InvalidSessionExpiry,

    #[error("Invalid AI request timeout")]
    InvalidTimeout,

    #[error("At most {max} retries are allowed")]
    TooManyRetries { max: u32 },

    #[error("Temperature must be between 0.0 and 2.0")]
    InvalidTemperature,

    #[error("Bookings path must not be empty")]
    EmptyBookingsPath,
}
