//! CoinMarketCap client for ranked market snapshots.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::models::AssetQuote;

use super::types::{CmcListing, CmcListingResponse};
use super::{ApiError, MarketDataSource};

const CMC_API_BASE: &str = "https://pro-api.coinmarketcap.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How many ranked listings to request so that enough remain after filtering.
pub const DEFAULT_FETCH_SIZE: usize = 50;

/// Symbols treated as stablecoins even when the listing carries no tag.
const KNOWN_STABLECOINS: &[&str] = &[
    "USDT", "USDC", "DAI", "FDUSD", "TUSD", "USDE", "USDD", "PYUSD", "BUSD", "USDS", "USD1",
];

/// Client for the CoinMarketCap Pro API (read-only).
pub struct CoinMarketCapClient {
    client: Client,
    base_url: String,
    api_key: String,
    quote_asset: String,
    fetch_size: usize,
}

impl CoinMarketCapClient {
    /// Create a client pricing pairs against `quote_asset` (e.g., "USDT").
    pub fn with_base_url(
        base_url: String,
        api_key: String,
        quote_asset: String,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
            quote_asset,
            fetch_size: DEFAULT_FETCH_SIZE,
        })
    }

    /// Create from environment variables:
    /// - COIN_MARKET_CAP_API_KEY
    /// - CMC_BASE_URL (optional)
    pub fn from_env(quote_asset: &str) -> Result<Self, ApiError> {
        let api_key = std::env::var("COIN_MARKET_CAP_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ApiError::Credentials("COIN_MARKET_CAP_API_KEY not set".to_string()))?;
        let base_url = std::env::var("CMC_BASE_URL").unwrap_or_else(|_| CMC_API_BASE.to_string());

        Self::with_base_url(base_url, api_key, quote_asset.to_string())
    }

    /// Override how many listings are requested per snapshot.
    pub fn with_fetch_size(mut self, fetch_size: usize) -> Self {
        self.fetch_size = fetch_size.max(1);
        self
    }

    async fn fetch_listings(&self, limit: usize) -> Result<Vec<CmcListing>, ApiError> {
        let url = format!(
            "{}/v1/cryptocurrency/listings/latest?start=1&limit={}&convert=USD",
            self.base_url, limit
        );

        debug!(url = %url, "Fetching listings");

        let response = self
            .client
            .get(&url)
            .header("X-CMC_PRO_API_KEY", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let listing: CmcListingResponse = serde_json::from_str(&body)?;

        if listing.status.error_code != 0 {
            return Err(ApiError::Api {
                code: listing.status.error_code,
                message: listing.status.error_message.unwrap_or_default(),
            });
        }

        Ok(listing.data)
    }
}

#[async_trait]
impl MarketDataSource for CoinMarketCapClient {
    async fn fetch_ranked_assets(
        &self,
        limit: usize,
        exclude_stablecoins: bool,
    ) -> Result<Vec<AssetQuote>, ApiError> {
        let listings = self.fetch_listings(self.fetch_size.max(limit)).await?;
        let assets = select_tradeable(&listings, limit, exclude_stablecoins, &self.quote_asset);

        debug!(
            fetched = listings.len(),
            selected = assets.len(),
            "Loaded ranked assets"
        );

        Ok(assets)
    }
}

/// Whether a listing is a stablecoin, by tag or by known symbol.
fn is_stablecoin(listing: &CmcListing) -> bool {
    listing.tags.iter().any(|t| t.eq_ignore_ascii_case("stablecoin"))
        || KNOWN_STABLECOINS
            .iter()
            .any(|s| s.eq_ignore_ascii_case(&listing.symbol))
}

/// Keep rank order, drop stablecoins if asked, and take the first `limit`
/// entries that carry a usable price and 24h change.
fn select_tradeable(
    listings: &[CmcListing],
    limit: usize,
    exclude_stablecoins: bool,
    quote_asset: &str,
) -> Vec<AssetQuote> {
    listings
        .iter()
        .filter(|l| !(exclude_stablecoins && is_stablecoin(l)))
        .filter_map(|l| {
            let usd = &l.quote.usd;
            let (Some(price), Some(change)) = (usd.price, usd.percent_change_24h) else {
                debug!(symbol = %l.symbol, "Listing without price or 24h change, skipping");
                return None;
            };

            match (Decimal::try_from(price), Decimal::try_from(change)) {
                (Ok(price), Ok(change)) => Some(AssetQuote::new(
                    format!("{}{}", l.symbol.to_uppercase(), quote_asset),
                    price,
                    change,
                )),
                _ => {
                    warn!(symbol = %l.symbol, price, change, "Unrepresentable listing values");
                    None
                }
            }
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const LISTING_JSON: &str = r#"{
        "status": {"error_code": 0, "error_message": null},
        "data": [
            {"symbol": "BTC", "name": "Bitcoin", "tags": ["mineable"],
             "quote": {"USD": {"price": 60000.5, "percent_change_24h": -1.25}}},
            {"symbol": "USDT", "name": "Tether", "tags": ["stablecoin"],
             "quote": {"USD": {"price": 1.0, "percent_change_24h": 0.01}}},
            {"symbol": "FDUSD", "name": "First Digital USD", "tags": [],
             "quote": {"USD": {"price": 1.0, "percent_change_24h": 0.0}}},
            {"symbol": "SOL", "name": "Solana",
             "quote": {"USD": {"price": 140.0, "percent_change_24h": -7.5}}},
            {"symbol": "NEW", "name": "Unpriced",
             "quote": {"USD": {"price": null, "percent_change_24h": null}}},
            {"symbol": "ETH", "name": "Ethereum", "tags": [],
             "quote": {"USD": {"price": 3000.0, "percent_change_24h": 2.0}}}
        ]
    }"#;

    fn listings() -> Vec<CmcListing> {
        let response: CmcListingResponse = serde_json::from_str(LISTING_JSON).unwrap();
        response.data
    }

    #[test]
    fn test_select_excludes_stablecoins_and_keeps_rank() {
        let assets = select_tradeable(&listings(), 20, true, "USDT");
        let symbols: Vec<_> = assets.iter().map(|a| a.symbol.as_str()).collect();

        assert_eq!(symbols, vec!["BTCUSDT", "SOLUSDT", "ETHUSDT"]);
        assert_eq!(assets[1].last_price, dec!(140));
        assert_eq!(assets[1].percent_change_24h, dec!(-7.5));
    }

    #[test]
    fn test_select_respects_limit() {
        let assets = select_tradeable(&listings(), 2, true, "USDT");
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].symbol, "BTCUSDT");
        assert_eq!(assets[1].symbol, "SOLUSDT");
    }

    #[test]
    fn test_select_keeps_stablecoins_when_not_excluded() {
        let assets = select_tradeable(&listings(), 20, false, "USDT");
        assert!(assets.iter().any(|a| a.symbol == "USDTUSDT"));
        assert_eq!(assets.len(), 5);
    }

    #[test]
    fn test_error_status_is_parsed() {
        let body = r#"{"status": {"error_code": 1002, "error_message": "API key missing."}}"#;
        let response: CmcListingResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.status.error_code, 1002);
        assert!(response.data.is_empty());
    }
}
