//! Configuration management

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::constants;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub session: SessionSettings,
    pub password: PasswordSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionSettings {
    /// Inactivity window after which a session times out.
    pub idle_timeout_secs: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PasswordSettings {
    pub min_length: usize,
    /// Number of previous hashes a new password is checked against.
    pub history_depth: u32,
    pub max_failed_logins: i32,
    pub lockout_secs: i64,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "fpms-server")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default(
                "session.idle_timeout_secs",
                constants::DEFAULT_SESSION_IDLE_TIMEOUT_SECS,
            )?
            .set_default("password.min_length", constants::MIN_PASSWORD_LENGTH as i64)?
            .set_default(
                "password.history_depth",
                constants::DEFAULT_PASSWORD_HISTORY_DEPTH as i64,
            )?
            .set_default(
                "password.max_failed_logins",
                constants::DEFAULT_MAX_FAILED_LOGINS as i64,
            )?
            .set_default("password.lockout_secs", constants::DEFAULT_LOCKOUT_SECS)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::default().separator("__").try_parsing(true))
            .build()?;
        config.try_deserialize()
    }
}
