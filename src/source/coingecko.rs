use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::config::SourceConfig;
use crate::error::{FetchError, Result};
use crate::snapshot::{AssetQuote, Snapshot};
use crate::source::PriceSource;

/// CoinGecko `simple/price` poller. One GET per cycle returns every tracked
/// asset keyed by its CoinGecko id, which doubles as the canonical id, so
/// no symbol mapping is needed.
pub struct CoinGeckoSource {
    client: Client,
    url: String,
    asset_ids: Vec<String>,
}

impl CoinGeckoSource {
    pub fn new(cfg: &SourceConfig) -> Result<Self> {
        let asset_ids: Vec<String> = cfg.assets.iter().map(|a| a.id.clone()).collect();
        let url = format!(
            "{}?ids={}&vs_currencies=usd&include_24hr_change=true",
            cfg.endpoint.trim_end_matches('/'),
            asset_ids.join(","),
        );
        Ok(CoinGeckoSource {
            client: super::http_client(cfg)?,
            url,
            asset_ids,
        })
    }
}

#[async_trait]
impl PriceSource for CoinGeckoSource {
    async fn fetch(&self) -> std::result::Result<Snapshot, FetchError> {
        let response = self.client.get(&self.url).send().await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => return Err(FetchError::RateLimited),
            status if !status.is_success() => return Err(FetchError::Status(status)),
            _ => {}
        }

        let quotes: BTreeMap<String, AssetQuote> = response
            .json()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        Snapshot::from_quotes(quotes, self.asset_ids.iter().map(String::as_str))
    }

    fn provider_id(&self) -> &str {
        "coingecko"
    }
}
