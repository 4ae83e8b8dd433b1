// In crates/app-config/src/types.rs

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    /// The application's general settings.
    pub app: AppSettings,
    /// Endpoints of the trading venue.
    pub venue: VenueSettings,
    /// Execution policy: guard tolerance and timeouts.
    #[serde(default)]
    pub execution: ExecutionSettings,
    /// Settings for the database connection.
    pub database: DatabaseSettings,
    pub server: ServerSettings,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    /// The environment the application is running in (e.g., "development", "production").
    pub environment: String,
    /// The log level for the application.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct VenueSettings {
    /// The REST base URL serving `GET /book?token_id=...`.
    pub rest_base_url: String,
    /// The market-channel WebSocket URL for live quotes.
    pub ws_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl VenueSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ExecutionSettings {
    /// Maximum relative deviation between the submitted price and the live quote.
    #[serde(default = "default_price_tolerance")]
    pub price_tolerance: Decimal,
    /// Upper bound on connecting to the live stream and receiving a snapshot.
    #[serde(default = "default_live_guard_timeout_ms")]
    pub live_guard_timeout_ms: u64,
    /// Upper bound on each market, balance or holdings lookup.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            price_tolerance: default_price_tolerance(),
            live_guard_timeout_ms: default_live_guard_timeout_ms(),
            store_timeout_ms: default_store_timeout_ms(),
        }
    }
}

impl ExecutionSettings {
    pub fn live_guard_timeout(&self) -> Duration {
        Duration::from_millis(self.live_guard_timeout_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct DatabaseSettings {
    /// The connection URL for the PostgreSQL database.
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

// Helper functions for serde defaults
fn default_log_level() -> String { "info".to_string() }
fn default_request_timeout_ms() -> u64 { 10_000 }
fn default_connect_timeout_ms() -> u64 { 5_000 }
fn default_price_tolerance() -> Decimal { dec!(0.005) }
fn default_live_guard_timeout_ms() -> u64 { 5_000 }
fn default_store_timeout_ms() -> u64 { 3_000 }
fn default_max_connections() -> u32 { 5 }
