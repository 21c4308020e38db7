use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub poll: PollConfig,
    pub source: SourceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Origins allowed to open the push channel. `"*"` allows any.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub provider: Provider,
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub assets: Vec<TrackedAsset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Coingecko,
    Binance,
}

/// One tracked asset: the canonical id used on the wire to clients, plus
/// the exchange symbol used by providers that key on trading pairs.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackedAsset {
    pub id: String,
    pub symbol: String,
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("CRYPTODASH").separator("__"))
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| Error::ConfigError(e.to_string()))
    }
}
