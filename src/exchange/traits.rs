use async_trait::async_trait;

use crate::data::market::SupplierResult;

use super::types::{MarketKind, Pair, Venue};

#[async_trait]
pub trait PairSupplier: Send + Sync {
    fn venue(&self) -> Venue;

    /// Active pairs quoted in `quote`, in the order the venue lists them.
    async fn fetch_pairs(&self, quote: &str, kind: MarketKind) -> SupplierResult<Vec<Pair>>;
}
