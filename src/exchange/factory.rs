use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::WatchlistError;

use super::{
    binance::BinanceExchange, bybit::BybitExchange, hyperliquid::HyperliquidExchange,
    traits::PairSupplier, types::Venue,
};

pub fn build_pair_supplier(
    config: &AppConfig,
    venue: Venue,
) -> Result<Arc<dyn PairSupplier>, WatchlistError> {
    let profile = config.venue(venue)?;

    let supplier: Arc<dyn PairSupplier> = match venue {
        Venue::Binance => Arc::new(BinanceExchange::new(profile, &config.retry)?),
        Venue::Bybit => Arc::new(BybitExchange::new(profile, &config.retry)?),
        Venue::Hyperliquid => Arc::new(HyperliquidExchange::new(profile, &config.retry)?),
    };
    Ok(supplier)
}
