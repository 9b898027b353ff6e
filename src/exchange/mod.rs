pub mod factory;
pub mod traits;
pub mod types;

pub mod symbols;

pub mod binance;
pub mod bybit;
pub mod hyperliquid;

#[cfg(test)]
mod types_tests;
