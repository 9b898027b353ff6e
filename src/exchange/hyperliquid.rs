//! Hyperliquid listings adapter (`POST /info` meta and spotMeta).
//!
//! Perpetuals are all quoted in USDC and named by bare coin, with the
//! "k" prefix on scaled coins (kPEPE, kSHIB).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

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
pub(crate) struct PerpMeta {
    pub universe: Vec<PerpAsset>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PerpAsset {
    pub name: String,
    #[serde(default)]
    pub is_delisted: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpotMeta {
    pub tokens: Vec<SpotToken>,
    pub universe: Vec<SpotMarket>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpotToken {
    pub name: String,
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpotMarket {
    /// [base token index, quote token index]
    pub tokens: [usize; 2],
}

impl PerpMeta {
    pub(crate) fn into_pairs(self, quote: &str) -> Vec<Pair> {
        self.universe
            .into_iter()
            .filter(|a| !a.is_delisted)
            .map(|a| Pair::new(&a.name, quote, MarketKind::Perpetual))
            .collect()
    }
}

impl SpotMeta {
    pub(crate) fn into_pairs(self, quote: &str) -> Vec<Pair> {
        let token_name = |index: usize| {
            self.tokens
                .iter()
                .find(|t| t.index == index)
                .map(|t| t.name.as_str())
        };

        self.universe
            .iter()
            .filter_map(|m| {
                let base = token_name(m.tokens[0])?;
                let market_quote = token_name(m.tokens[1])?;
                market_quote
                    .eq_ignore_ascii_case(quote)
                    .then(|| Pair::new(base, &market_quote.to_uppercase(), MarketKind::Spot))
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct HyperliquidExchange {
    client: Client,
    info_url: String,
    native_quote: String,
    retry: RetryPolicy,
}

impl HyperliquidExchange {
    pub fn new(profile: &VenueProfile, retry: &RetryConfig) -> SupplierResult<Self> {
        let client = Client::builder()
            .timeout(market_data::REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            info_url: profile
                .perpetual_url
                .clone()
                .or_else(|| profile.spot_url.clone())
                .unwrap_or_else(|| venues::HYPERLIQUID_INFO_URL.to_string()),
            native_quote: profile
                .native_quote
                .clone()
                .unwrap_or_else(|| venues::HYPERLIQUID_QUOTE.to_string())
                .to_uppercase(),
            retry: RetryPolicy::from(retry),
        })
    }

    async fn info<T: serde::de::DeserializeOwned>(&self, request_type: &str) -> SupplierResult<T> {
        let body = json!({ "type": request_type });
        let body = &body;

        self.retry
            .run("hyperliquid", || async move {
                let resp = self.client.post(&self.info_url).json(body).send().await?;
                let resp = check_status("hyperliquid", resp).await?;
                let text = resp.text().await?;
                let parsed: T = serde_json::from_str(&text)?;
                Ok(parsed)
            })
            .await
    }
}

#[async_trait]
impl PairSupplier for HyperliquidExchange {
    fn venue(&self) -> Venue {
        Venue::Hyperliquid
    }

    async fn fetch_pairs(&self, quote: &str, kind: MarketKind) -> SupplierResult<Vec<Pair>> {
        let quote = quote.to_uppercase();
        if kind == MarketKind::Perpetual && quote != self.native_quote {
            return Err(SupplierError::Unsupported {
                venue: Venue::Hyperliquid.to_string(),
                market: format!("{} {}", quote, kind),
            });
        }

        let pairs = match kind {
            MarketKind::Perpetual => self.info::<PerpMeta>("meta").await?.into_pairs(&quote),
            MarketKind::Spot => self.info::<SpotMeta>("spotMeta").await?.into_pairs(&quote),
        };
        info!("[FETCH] hyperliquid {} {} pairs: {} found", quote, kind, pairs.len());
        Ok(pairs)
    }
}
