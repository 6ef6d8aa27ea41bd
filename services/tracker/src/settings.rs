//! Service settings: defaults, optional `worktime.toml`, then `WORKTIME__*` env vars

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

use crate::clients::{DEFAULT_HTTP_TIMEOUT, holiday::DEFAULT_HOLIDAY_API_URL};

/// Where the built web frontend is looked up, relative to the working directory
pub const DEFAULT_STATIC_DIR: &str = "frontend/out";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl ServerSettings {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub holiday_api_url: String,
    /// Timeout of every outbound HTTP request, in seconds
    pub http_timeout_secs: u64,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Directory served for every path outside `/api` and `/health`
    pub static_dir: PathBuf,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080_i64)?
            .set_default("holiday_api_url", DEFAULT_HOLIDAY_API_URL)?
            .set_default("http_timeout_secs", DEFAULT_HTTP_TIMEOUT.as_secs())?
            .set_default("log_filter", "info")?
            .set_default("static_dir", DEFAULT_STATIC_DIR)?
            .add_source(File::with_name("worktime").required(false))
            .add_source(Environment::with_prefix("WORKTIME").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
