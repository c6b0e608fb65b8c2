//! Wire types for the CoinMarketCap and Binance REST APIs.

use serde::Deserialize;

// ==================== CoinMarketCap ====================

/// Response from /v1/cryptocurrency/listings/latest.
#[derive(Debug, Clone, Deserialize)]
pub struct CmcListingResponse {
    pub status: CmcStatus,
    #[serde(default)]
    pub data: Vec<CmcListing>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CmcStatus {
    #[serde(default)]
    pub error_code: i64,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// One ranked coin in a listing.
#[derive(Debug, Clone, Deserialize)]
pub struct CmcListing {
    pub symbol: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub quote: CmcQuotes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CmcQuotes {
    #[serde(rename = "USD")]
    pub usd: CmcUsdQuote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CmcUsdQuote {
    pub price: Option<f64>,
    pub percent_change_24h: Option<f64>,
}

// ==================== Binance ====================

/// Error body returned by Binance on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct BinanceErrorBody {
    pub code: i64,
    pub msg: String,
}

/// Response from POST /api/v3/order (FULL response type).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceOrderResponse {
    pub symbol: String,
    pub order_id: i64,
    #[serde(default)]
    pub client_order_id: String,
    #[serde(default)]
    pub executed_qty: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub fills: Vec<BinanceFill>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BinanceFill {
    pub price: String,
    pub qty: String,
}

/// Response from GET /api/v3/exchangeInfo.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeInfo {
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub filters: Vec<SymbolFilter>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolFilter {
    pub filter_type: String,
    #[serde(default)]
    pub step_size: Option<String>,
    #[serde(default)]
    pub tick_size: Option<String>,
}

/// Response from GET /api/v3/account.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInfo {
    #[serde(default)]
    pub balances: Vec<AccountBalance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountBalance {
    pub asset: String,
    pub free: String,
}
