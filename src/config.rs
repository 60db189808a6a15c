use config::Environment;
use serde::Deserialize;
use std::time::Duration;

/// Where events, markets, bets and audit entries live
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Memory => "memory",
            StorageBackend::Postgres => "postgres",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub bind_address: String,
    pub storage_backend: StorageBackend,
    pub store_timeout_ms: u64,
    pub settlement_concurrency: usize,
    /// Zero disables the background settlement run
    pub settlement_interval_secs: u64,
    pub audit_channel_capacity: usize,
    pub request_timeout_secs: u64,
    /// Comma separated; empty allows any origin
    pub cors_origins: String,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::load(Environment::default().try_parsing(true))
    }

    fn load(env: Environment) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("bind_address", "0.0.0.0:8080")?
            .set_default("storage_backend", "memory")?
            .set_default("store_timeout_ms", 5000)?
            .set_default("settlement_concurrency", 16)?
            .set_default("settlement_interval_secs", 0)?
            .set_default("audit_channel_capacity", 1024)?
            .set_default("request_timeout_secs", 30)?
            .set_default("cors_origins", "")?
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    #[cfg(test)]
    pub(crate) fn from_map(vars: config::Map<String, String>) -> Result<Self, config::ConfigError> {
        Self::load(Environment::default().source(Some(vars)).try_parsing(true))
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect()
    }
}
