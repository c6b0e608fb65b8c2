//! Exchange and market-data clients, plus the traits the trading core consumes.

mod binance;
mod coinmarketcap;
mod error;
mod types;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::models::{AssetQuote, OrderResult, SymbolRules};

pub use binance::BinanceClient;
pub use coinmarketcap::CoinMarketCapClient;
pub use error::ApiError;

/// Source of ranked market snapshots.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch the top `limit` assets by rank, optionally without stablecoins.
    async fn fetch_ranked_assets(
        &self,
        limit: usize,
        exclude_stablecoins: bool,
    ) -> Result<Vec<AssetQuote>, ApiError>;
}

/// Order submission and rule lookup on the exchange. Implementations sign
/// their own requests.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// Market buy spending `quote_notional` of the quote asset.
    async fn market_buy(
        &self,
        symbol: &str,
        quote_notional: Decimal,
    ) -> Result<OrderResult, ApiError>;

    /// Good-til-cancelled limit sell.
    async fn limit_sell(
        &self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<OrderResult, ApiError>;

    /// Market sell of `quantity` base units.
    async fn market_sell(&self, symbol: &str, quantity: Decimal) -> Result<OrderResult, ApiError>;

    /// Step and tick size for a symbol.
    async fn symbol_rules(&self, symbol: &str) -> Result<SymbolRules, ApiError>;
}
