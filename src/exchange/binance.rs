//! Binance listings adapter (spot + USDⓈ-M futures exchangeInfo).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use super::{
    traits::PairSupplier,
    types::{MarketKind, Pair, Venue},
};

use crate::config::{RetryConfig, VenueProfile};
use crate::constants::{market_data, venues};
use crate::data::market::SupplierResult;
use crate::data::retry::{check_status, RetryPolicy};

#[derive(Debug, Deserialize)]
pub(crate) struct ExchangeInfo {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SymbolInfo {
    pub status: String,
    pub base_asset: String,
    pub quote_asset: String,
    /// Futures only: "PERPETUAL", "CURRENT_QUARTER", ...
    #[serde(default)]
    pub contract_type: Option<String>,
}

impl ExchangeInfo {
    /// Trading pairs in `quote`; for perpetuals only PERPETUAL contracts.
    pub(crate) fn into_pairs(self, quote: &str, kind: MarketKind) -> Vec<Pair> {
        self.symbols
            .into_iter()
            .filter(|s| s.status == "TRADING" && s.quote_asset.eq_ignore_ascii_case(quote))
            .filter(|s| match kind {
                MarketKind::Spot => true,
                MarketKind::Perpetual => s.contract_type.as_deref() == Some("PERPETUAL"),
            })
            .map(|s| Pair::new(&s.base_asset.to_uppercase(), &s.quote_asset.to_uppercase(), kind))
            .collect()
    }
}

#[derive(Clone)]
pub struct BinanceExchange {
    client: Client,
    spot_url: String,
    futures_url: String,
    retry: RetryPolicy,
}

impl BinanceExchange {
    pub fn new(profile: &VenueProfile, retry: &RetryConfig) -> SupplierResult<Self> {
        let client = Client::builder()
            .timeout(market_data::REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            spot_url: profile
                .spot_url
                .clone()
                .unwrap_or_else(|| venues::BINANCE_SPOT_URL.to_string()),
            futures_url: profile
                .perpetual_url
                .clone()
                .unwrap_or_else(|| venues::BINANCE_FUTURES_URL.to_string()),
            retry: RetryPolicy::from(retry),
        })
    }

    async fn exchange_info(&self, kind: MarketKind) -> SupplierResult<ExchangeInfo> {
        let url = match kind {
            MarketKind::Spot => self.spot_url.as_str(),
            MarketKind::Perpetual => self.futures_url.as_str(),
        };

        self.retry
            .run("binance", || async move {
                let resp = self.client.get(url).send().await?;
                let resp = check_status("binance", resp).await?;
                let text = resp.text().await?;
                let info: ExchangeInfo = serde_json::from_str(&text)?;
                Ok(info)
            })
            .await
    }
}

#[async_trait]
impl PairSupplier for BinanceExchange {
    fn venue(&self) -> Venue {
        Venue::Binance
    }

    async fn fetch_pairs(&self, quote: &str, kind: MarketKind) -> SupplierResult<Vec<Pair>> {
        info!("[FETCH] Getting binance {} {} pairs...", quote, kind);
        let pairs = self.exchange_info(kind).await?.into_pairs(quote, kind);
        info!("[FETCH] binance {} {} pairs: {} found", quote, kind, pairs.len());
        Ok(pairs)
    }
}
