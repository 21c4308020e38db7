pub mod binance;
pub mod coingecko;

use async_trait::async_trait;

use crate::config::{Provider, SourceConfig};
use crate::error::{FetchError, Result};
use crate::snapshot::Snapshot;

/// One upstream price provider, normalized to the canonical snapshot shape.
/// Providers differ in payload shape and rate limits; everything past this
/// trait is provider-agnostic.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetches current prices for every tracked asset. Any failure mode
    /// (network, status, rate limit, malformed or partial payload) is a
    /// `FetchError`; the poll loop treats them all the same.
    async fn fetch(&self) -> std::result::Result<Snapshot, FetchError>;

    fn provider_id(&self) -> &str;
}

/// Builds the configured provider. Swapping providers is a config change,
/// never a code change to the poll loop or hub.
pub fn build_source(cfg: &SourceConfig) -> Result<Box<dyn PriceSource>> {
    match cfg.provider {
        Provider::Coingecko => Ok(Box::new(coingecko::CoinGeckoSource::new(cfg)?)),
        Provider::Binance => Ok(Box::new(binance::BinanceSource::new(cfg)?)),
    }
}

fn http_client(cfg: &SourceConfig) -> Result<reqwest::Client> {
    // a hung upstream must not stall the poll cycle indefinitely
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(cfg.request_timeout_secs))
        .build()
        .map_err(|e| crate::error::Error::ConfigError(format!("http client: {e}")))
}
