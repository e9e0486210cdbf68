//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use std::time::Duration;

use serde::Deserialize;

use crate::db::session::SessionConfig;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DB_HOST`, `DB_USER`, `DB_DATABASE` (required): MySQL connection target
/// - `DB_PASSWORD` (optional): defaults to an empty password
/// - `DB_PORT` (optional): MySQL port, defaults to 3306
/// - `DB_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `DB_ACQUIRE_TIMEOUT_SECS` (optional): how long a request waits for a pooled connection, defaults to 30
/// - `DB_SQL_MODE` (optional): session `sql_mode`, defaults to `TRADITIONAL`
/// - `DB_TIME_ZONE` (optional): session `time_zone`, defaults to `-08:00`
/// - `PORT` (optional): HTTP server port, defaults to 3000
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub db_host: String,

    #[serde(default = "default_db_port")]
    pub db_port: u16,

    pub db_user: String,

    #[serde(default)]
    pub db_password: String,

    pub db_database: String,

    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,

    #[serde(default = "default_acquire_timeout")]
    pub db_acquire_timeout_secs: u64,

    #[serde(default = "default_sql_mode")]
    pub db_sql_mode: String,

    #[serde(default = "default_time_zone")]
    pub db_time_zone: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_db_port() -> u16 {
    3306
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_sql_mode() -> String {
    "TRADITIONAL".to_string()
}

fn default_time_zone() -> String {
    "-08:00".to_string()
}

/// Default port if PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DB_HOST)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are converted: db_host -> DB_HOST
        envy::from_env::<Config>()
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs)
    }

    /// Session settings applied to every connection a request leases.
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            sql_mode: self.db_sql_mode.clone(),
            time_zone: self.db_time_zone.clone(),
        }
    }
}
