// In crates/app-config/src/lib.rs

use config::{Config, Environment, File};
use rust_decimal::Decimal;
use std::path::Path;

pub mod error;
pub mod types;

// Re-export the most important types for easy access.
pub use error::{Error, Result};
pub use types::{
    AppSettings, DatabaseSettings, ExecutionSettings, ServerSettings, Settings, VenueSettings,
};

/// Loads the application settings from the `config/` directory.
///
/// This function orchestrates the layered configuration loading:
/// 1. Reads from a default `base.toml` file.
/// 2. Merges settings from an environment-specific file (e.g., `development.toml`).
/// 3. Merges settings from environment variables.
pub fn load_settings() -> Result<Settings> {
    load_settings_from("config")
}

/// Same as [`load_settings`], rooted at an arbitrary directory.
pub fn load_settings_from(dir: impl AsRef<Path>) -> Result<Settings> {
    let dir = dir.as_ref();
    // Get the current environment. Default to "development" if not set.
    let environment = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "development".into());

    let settings = Config::builder()
        .add_source(File::from(dir.join("base")))
        .add_source(File::from(dir.join(&environment)).required(false))
        // Settings from environment variables (e.g., `APP_DATABASE__URL=...`).
        // The prefix is `APP`, separator is `__`.
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let settings: Settings = settings.try_deserialize()?;
    validate(&settings)?;

    Ok(settings)
}

/// Rejects settings the engine cannot run safely with.
pub fn validate(settings: &Settings) -> Result<()> {
    let tolerance = settings.execution.price_tolerance;
    if tolerance < Decimal::ZERO || tolerance >= Decimal::ONE {
        return Err(Error::Invalid(format!(
            "execution.price_tolerance must be in [0, 1), got {tolerance}"
        )));
    }
    if settings.execution.live_guard_timeout_ms == 0 || settings.execution.store_timeout_ms == 0 {
        return Err(Error::Invalid("execution timeouts must be positive".into()));
    }
    if settings.venue.request_timeout_ms == 0 || settings.venue.connect_timeout_ms == 0 {
        return Err(Error::Invalid("venue timeouts must be positive".into()));
    }
    Ok(())
}
