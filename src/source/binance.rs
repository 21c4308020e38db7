use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::{SourceConfig, TrackedAsset};
use crate::error::{FetchError, Result};
use crate::snapshot::{AssetQuote, Snapshot};
use crate::source::PriceSource;

/// Binance 24hr ticker poller. The endpoint serves one symbol per request,
/// so a cycle issues one GET per tracked asset and joins the results; any
/// failed leg fails the whole cycle so a partial snapshot never escapes.
/// Prices arrive as decimal strings and are parsed to floats.
pub struct BinanceSource {
    client: Client,
    endpoint: String,
    assets: Vec<TrackedAsset>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    last_price: String,
    price_change_percent: String,
}

impl BinanceSource {
    pub fn new(cfg: &SourceConfig) -> Result<Self> {
        Ok(BinanceSource {
            client: super::http_client(cfg)?,
            endpoint: cfg.endpoint.trim_end_matches('/').to_string(),
            assets: cfg.assets.clone(),
        })
    }

    fn parse_f64(symbol: &str, field: &str, raw: &str) -> std::result::Result<f64, FetchError> {
        raw.trim()
            .parse()
            .map_err(|_| FetchError::Malformed(format!("{symbol}: bad {field} {raw:?}")))
    }
}

#[async_trait]
impl PriceSource for BinanceSource {
    async fn fetch(&self) -> std::result::Result<Snapshot, FetchError> {
        let mut quotes = BTreeMap::new();

        for asset in &self.assets {
            let url = format!("{}?symbol={}", self.endpoint, asset.symbol);
            let response = self.client.get(&url).send().await?;

            match response.status() {
                StatusCode::TOO_MANY_REQUESTS => return Err(FetchError::RateLimited),
                status if !status.is_success() => return Err(FetchError::Status(status)),
                _ => {}
            }

            let ticker: Ticker24h = response
                .json()
                .await
                .map_err(|e| FetchError::Malformed(e.to_string()))?;

            quotes.insert(
                asset.id.clone(),
                AssetQuote {
                    usd: Self::parse_f64(&asset.symbol, "lastPrice", &ticker.last_price)?,
                    usd_24h_change: Self::parse_f64(
                        &asset.symbol,
                        "priceChangePercent",
                        &ticker.price_change_percent,
                    )?,
                },
            );
        }

        Snapshot::from_quotes(quotes, self.assets.iter().map(|a| a.id.as_str()))
    }

    fn provider_id(&self) -> &str {
        "binance"
    }
}
