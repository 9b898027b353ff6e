//! Bybit listings adapter (v5 `market/instruments-info`, spot + linear).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::{
    traits::PairSupplier,
    types::{MarketKind, Pair, Venue},
};

use crate::config::{RetryConfig, VenueProfile};
use crate::constants::{market_data, venues};
use crate::data::market::SupplierResult;
use crate::data::retry::{check_status, RetryPolicy};
use crate::error::SupplierError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InstrumentsResponse {
    pub ret_code: i64,
    #[serde(default)]
    pub ret_msg: String,
    #[serde(default)]
    pub result: Option<InstrumentsPage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InstrumentsPage {
    #[serde(default)]
    pub list: Vec<Instrument>,
    #[serde(default)]
    pub next_page_cursor: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Instrument {
    pub status: String,
    pub base_coin: String,
    pub quote_coin: String,
    /// Linear only: "LinearPerpetual", "LinearFutures"
    #[serde(default)]
    pub contract_type: Option<String>,
}

impl InstrumentsResponse {
    /// Bybit reports failures in-band with HTTP 200.
    pub(crate) fn into_page(self) -> SupplierResult<InstrumentsPage> {
        if self.ret_code != 0 {
            return Err(SupplierError::Api {
                supplier: "bybit".to_string(),
                code: self.ret_code,
                message: self.ret_msg,
            });
        }
        Ok(self.result.unwrap_or_default())
    }
}

/// Trading instruments in `quote`; for perpetuals only linear perpetual contracts.
pub(crate) fn listed_pairs(instruments: Vec<Instrument>, quote: &str, kind: MarketKind) -> Vec<Pair> {
    instruments
        .into_iter()
        .filter(|i| i.status == "Trading" && i.quote_coin.eq_ignore_ascii_case(quote))
        .filter(|i| match kind {
            MarketKind::Spot => true,
            MarketKind::Perpetual => i.contract_type.as_deref() == Some("LinearPerpetual"),
        })
        .map(|i| Pair::new(&i.base_coin.to_uppercase(), &i.quote_coin.to_uppercase(), kind))
        .collect()
}

fn category(kind: MarketKind) -> &'static str {
    match kind {
        MarketKind::Spot => "spot",
        MarketKind::Perpetual => "linear",
    }
}

#[derive(Clone)]
pub struct BybitExchange {
    client: Client,
    instruments_url: String,
    retry: RetryPolicy,
}

impl BybitExchange {
    pub fn new(profile: &VenueProfile, retry: &RetryConfig) -> SupplierResult<Self> {
        let client = Client::builder()
            .timeout(market_data::REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            instruments_url: profile
                .perpetual_url
                .clone()
                .or_else(|| profile.spot_url.clone())
                .unwrap_or_else(|| venues::BYBIT_INSTRUMENTS_URL.to_string()),
            retry: RetryPolicy::from(retry),
        })
    }

    async fn instruments_page(
        &self,
        kind: MarketKind,
        cursor: &str,
    ) -> SupplierResult<InstrumentsPage> {
        let limit = venues::BYBIT_PAGE_LIMIT.to_string();
        let mut query = vec![("category", category(kind)), ("limit", limit.as_str())];
        if !cursor.is_empty() {
            query.push(("cursor", cursor));
        }
        let (url, query) = (&self.instruments_url, &query);

        self.retry
            .run("bybit", || async move {
                let resp = self.client.get(url).query(query).send().await?;
                let resp = check_status("bybit", resp).await?;
                let text = resp.text().await?;
                let parsed: InstrumentsResponse = serde_json::from_str(&text)?;
                parsed.into_page()
            })
            .await
    }

    async fn instruments(&self, kind: MarketKind) -> SupplierResult<Vec<Instrument>> {
        let mut all = Vec::new();
        let mut cursor = String::new();
        loop {
            let page = self.instruments_page(kind, &cursor).await?;
            debug!("[FETCH] bybit {} page: {} instruments", category(kind), page.list.len());
            all.extend(page.list);
            if page.next_page_cursor.is_empty() || page.next_page_cursor == cursor {
                break;
            }
            cursor = page.next_page_cursor;
        }
        Ok(all)
    }
}

#[async_trait]
impl PairSupplier for BybitExchange {
    fn venue(&self) -> Venue {
        Venue::Bybit
    }

    async fn fetch_pairs(&self, quote: &str, kind: MarketKind) -> SupplierResult<Vec<Pair>> {
        info!("[FETCH] Getting bybit {} {} pairs...", quote, kind);
        let pairs = listed_pairs(self.instruments(kind).await?, quote, kind);
        info!("[FETCH] bybit {} {} pairs: {} found", quote, kind, pairs.len());
        Ok(pairs)
    }
}
