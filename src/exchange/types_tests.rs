//! Unit tests for exchange types.

#[cfg(test)]
mod types_tests {
    use crate::error::WatchlistError;
    use crate::exchange::types::*;

    // ============= MarketSelection Tests =============

    #[test]
    fn test_selection_perpetual() {
        let sel: MarketSelection = "usdtperp".parse().unwrap();
        assert_eq!(sel.quote, "USDT");
        assert_eq!(sel.kind, MarketKind::Perpetual);
    }

    #[test]
    fn test_selection_spot() {
        let sel: MarketSelection = "fdusd".parse().unwrap();
        assert_eq!(sel.quote, "FDUSD");
        assert_eq!(sel.kind, MarketKind::Spot);
    }

    #[test]
    fn test_selection_mixed_case() {
        let sel: MarketSelection = "USDCPerp".parse().unwrap();
        assert_eq!(sel, MarketSelection::new("usdc", MarketKind::Perpetual));
    }

    #[test]
    fn test_selection_rejects_empty_quote() {
        assert!(matches!(
            "perp".parse::<MarketSelection>(),
            Err(WatchlistError::InvalidBase(_))
        ));
        assert!("".parse::<MarketSelection>().is_err());
        assert!("us/dt".parse::<MarketSelection>().is_err());
    }

    #[test]
    fn test_selection_display() {
        let sel = MarketSelection::new("usdt", MarketKind::Perpetual);
        assert_eq!(sel.to_string(), "USDT perpetual");
    }

    // ============= MarketKind Tests =============

    #[test]
    fn test_file_tags() {
        assert_eq!(MarketKind::Spot.file_tag(), "spot");
        assert_eq!(MarketKind::Perpetual.file_tag(), "swap");
    }

    #[test]
    fn test_market_kind_serde() {
        let json = serde_json::to_string(&MarketKind::Perpetual).unwrap();
        assert_eq!(json, "\"perpetual\"");
        let kind: MarketKind = serde_json::from_str("\"spot\"").unwrap();
        assert_eq!(kind, MarketKind::Spot);
    }

    // ============= Venue Tests =============

    #[test]
    fn test_venue_serde() {
        let venue: Venue = serde_yaml::from_str("hyperliquid").unwrap();
        assert_eq!(venue, Venue::Hyperliquid);
        let venue: Venue = serde_yaml::from_str("bybit").unwrap();
        assert_eq!(venue, Venue::Bybit);
        assert_eq!(Venue::Binance.to_string(), "binance");
    }

    #[test]
    fn test_venue_from_str() {
        assert_eq!("Bybit".parse::<Venue>().unwrap(), Venue::Bybit);
        assert_eq!("hype".parse::<Venue>().unwrap(), Venue::Hyperliquid);
        assert!(matches!(
            "kraken".parse::<Venue>(),
            Err(WatchlistError::InvalidVenue(_))
        ));
    }

    #[test]
    fn test_venue_list_tags() {
        assert_eq!(Venue::Hyperliquid.list_tag(), "hype");
        assert_eq!(Venue::Bybit.list_tag(), "bybit");
        assert_eq!(Venue::Binance.list_tag(), "binance");
    }

    // ============= Pair Tests =============

    #[test]
    fn test_pair_composite_and_display() {
        let pair = Pair::new("BTC", "USDT", MarketKind::Perpetual);
        assert_eq!(pair.composite(), "BTCUSDT");
        assert_eq!(pair.to_string(), "BTC/USDT");
        assert_eq!(pair.listing, None);
    }

    #[test]
    fn test_pair_serialization_skips_missing_listing() {
        let pair = Pair::new("ETH", "USDC", MarketKind::Spot);
        let json = serde_json::to_string(&pair).unwrap();
        assert!(!json.contains("listing"));
        assert!(json.contains("\"spot\""));
    }
}
