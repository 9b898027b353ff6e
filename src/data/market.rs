//! Ranked market data: coin records and the CoinGecko supplier.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::config::{MarketDataConfig, RetryConfig};
use crate::data::retry::{check_status, RetryPolicy};
use crate::error::SupplierError;

pub type SupplierResult<T> = Result<T, SupplierError>;

/// One entry of the ranked universe, as served by `/coins/markets`.
/// Fields the pipeline does not read are kept in `extra` so a cached
/// snapshot round-trips unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub symbol: String,
    #[serde(rename = "market_cap_rank", default)]
    pub rank: Option<u32>,
    #[serde(rename = "total_volume", default)]
    pub volume: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CoinRecord {
    pub fn new(symbol: &str, rank: u32, volume: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            rank: Some(rank),
            volume: Some(volume),
            extra: Map::new(),
        }
    }

    /// 24h volume; missing or negative upstream values count as zero.
    pub fn volume(&self) -> f64 {
        self.volume.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0)
    }
}

#[async_trait]
pub trait MarketDataSupplier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Complete ranked list, or an error. Never a partial list.
    async fn fetch_ranked(&self) -> SupplierResult<Vec<CoinRecord>>;
}

#[derive(Clone)]
pub struct CoinGeckoClient {
    client: Client,
    config: MarketDataConfig,
    retry: RetryPolicy,
}

impl CoinGeckoClient {
    pub fn new(config: MarketDataConfig, retry: &RetryConfig) -> SupplierResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            retry: RetryPolicy::from(retry),
        })
    }

    fn markets_url(&self) -> String {
        format!("{}/coins/markets", self.config.base_url.trim_end_matches('/'))
    }

    async fn fetch_page(&self, page: u32) -> SupplierResult<Vec<CoinRecord>> {
        let url = self.markets_url();
        let query = [
            ("vs_currency", self.config.vs_currency.clone()),
            ("per_page", self.config.per_page.to_string()),
            ("page", page.to_string()),
        ];
        let (url, query) = (&url, &query);

        self.retry
            .run(self.name(), || async move {
                let resp = self.client.get(url).query(query).send().await?;
                let resp = check_status(self.name(), resp).await?;
                let text = resp.text().await?;
                let records: Vec<CoinRecord> = serde_json::from_str(&text)?;
                Ok(records)
            })
            .await
    }
}

#[async_trait]
impl MarketDataSupplier for CoinGeckoClient {
    fn name(&self) -> &'static str {
        "coingecko"
    }

    async fn fetch_ranked(&self) -> SupplierResult<Vec<CoinRecord>> {
        let mut all = Vec::new();
        for page in 1..=self.config.pages {
            info!("[FETCH] {} markets page {}/{}", self.name(), page, self.config.pages);
            let records = self.fetch_page(page).await?;
            all.extend(records);
        }
        info!("[FETCH] {} returned {} coin records", self.name(), all.len());
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coin_record_from_coingecko_json() {
        let raw = json!({
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "market_cap_rank": 1,
            "total_volume": 35000000000.0
        });
        let record: CoinRecord = serde_json::from_value(raw).unwrap();

        assert_eq!(record.symbol, "btc");
        assert_eq!(record.rank, Some(1));
        assert_eq!(record.volume(), 35000000000.0);
        assert_eq!(record.extra.get("id"), Some(&json!("bitcoin")));
    }

    #[test]
    fn test_coin_record_null_fields() {
        let raw = json!({"symbol": "new", "market_cap_rank": null, "total_volume": null});
        let record: CoinRecord = serde_json::from_value(raw).unwrap();

        assert_eq!(record.rank, None);
        assert_eq!(record.volume(), 0.0);
    }

    #[test]
    fn test_coin_record_keeps_unknown_fields() {
        let raw = json!({"symbol": "eth", "market_cap_rank": 2, "total_volume": 1.5, "image": "x.png"});
        let record: CoinRecord = serde_json::from_value(raw.clone()).unwrap();
        let back = serde_json::to_value(&record).unwrap();

        assert_eq!(back, raw);
    }

    #[test]
    fn test_negative_volume_counts_as_zero() {
        let record = CoinRecord::new("odd", 9, -5.0);
        assert_eq!(record.volume(), 0.0);
    }

    #[test]
    fn test_markets_url_trims_slash() {
        let config = MarketDataConfig {
            base_url: "https://example.test/api/v3/".to_string(),
            ..MarketDataConfig::default()
        };
        let client = CoinGeckoClient::new(config, &RetryConfig::default()).unwrap();
        assert_eq!(client.markets_url(), "https://example.test/api/v3/coins/markets");
    }
}
