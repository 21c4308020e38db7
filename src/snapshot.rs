use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FetchError;

/// Price and 24h change for one asset, in USD. Field names are the wire
/// format pushed to clients.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetQuote {
    #[serde(deserialize_with = "f64_or_string")]
    pub usd: f64,
    #[serde(deserialize_with = "f64_or_string")]
    pub usd_24h_change: f64,
}

/// A complete price reading across all tracked assets at one point in time.
/// Serializes as a JSON object keyed by asset id, e.g.
/// `{"bitcoin":{"usd":50000.0,"usd_24h_change":2.1},...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    quotes: BTreeMap<String, AssetQuote>,
}

impl Snapshot {
    /// Builds a snapshot from normalized quotes, checking completeness:
    /// every tracked asset must be present or the whole payload is rejected.
    /// Clients assume all tracked assets exist in every snapshot, so a
    /// partial reading is never cached or broadcast.
    pub fn from_quotes<'a>(
        quotes: BTreeMap<String, AssetQuote>,
        tracked: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, FetchError> {
        for id in tracked {
            if !quotes.contains_key(id) {
                return Err(FetchError::MissingAsset(id.to_string()));
            }
        }
        Ok(Snapshot { quotes })
    }

    pub fn get(&self, asset: &str) -> Option<&AssetQuote> {
        self.quotes.get(asset)
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.quotes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

/// Accepts both JSON numbers and numeric strings. CoinGecko serves numbers,
/// Binance serves decimal strings.
fn f64_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrStr {
        Num(f64),
        Str(String),
    }

    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
