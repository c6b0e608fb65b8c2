//! Market snapshot entry as delivered by the ranked market-data source.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One ranked asset in a market snapshot. Read-only input to classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetQuote {
    /// Exchange trading pair (e.g., "BTCUSDT")
    pub symbol: String,

    /// Last traded price in the quote asset
    pub last_price: Decimal,

    /// 24h price change in percent (negative for a decline)
    pub percent_change_24h: Decimal,
}

impl AssetQuote {
    pub fn new(symbol: impl Into<String>, last_price: Decimal, percent_change_24h: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            last_price,
            percent_change_24h,
        }
    }

    /// Base asset name with the quote suffix removed, for display.
    pub fn base_asset<'a>(&'a self, quote_asset: &str) -> &'a str {
        self.symbol
            .strip_suffix(quote_asset)
            .unwrap_or(&self.symbol)
    }
}
