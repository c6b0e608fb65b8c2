//! Binance spot REST client for order execution.
//!
//! Handles:
//! - HMAC-SHA256 request signing over the exact parameter string
//! - Market buy by quote amount, GTC limit sell, market sell
//! - Symbol trading rules (LOT_SIZE / PRICE_FILTER)
//! - Free balance lookup for budget initialization

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, RequestBuilder};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use tracing::{debug, warn};

use crate::models::{Fill, OrderResult, SymbolRules};

use super::types::{AccountInfo, BinanceErrorBody, BinanceOrderResponse, ExchangeInfo};
use super::{ApiError, OrderGateway};

/// Binance mainnet REST endpoint
pub const BINANCE_URL: &str = "https://api.binance.com";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Decimal places used when sending quantities and prices.
const WIRE_DECIMALS: u32 = 8;

type HmacSha256 = Hmac<Sha256>;

/// Signed REST client for Binance spot trading.
pub struct BinanceClient {
    http: Client,
    base_url: String,
    api_key: String,
    secret_key: String,
}

impl BinanceClient {
    /// Create a new client. Both keys must be non-empty.
    pub fn new(api_key: &str, secret_key: &str, base_url: &str) -> Result<Self, ApiError> {
        if api_key.trim().is_empty() || secret_key.trim().is_empty() {
            return Err(ApiError::Credentials(
                "BINANCE_API_KEY and BINANCE_SECRET_KEY are required".to_string(),
            ));
        }

        let http = Client::builder().timeout(DEFAULT_TIMEOUT).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    /// Create from environment variables:
    /// - BINANCE_API_KEY
    /// - BINANCE_SECRET_KEY
    /// - BINANCE_BASE_URL (defaults to mainnet)
    pub fn from_env() -> Result<Self, ApiError> {
        let api_key = std::env::var("BINANCE_API_KEY").unwrap_or_default();
        let secret_key = std::env::var("BINANCE_SECRET_KEY").unwrap_or_default();
        let base_url =
            std::env::var("BINANCE_BASE_URL").unwrap_or_else(|_| BINANCE_URL.to_string());

        Self::new(&api_key, &secret_key, &base_url)
    }

    /// Free (unlocked) balance of `asset`.
    pub async fn free_balance(&self, asset: &str) -> Result<Decimal, ApiError> {
        let query = self.signed_query(&[])?;
        let url = format!("{}/api/v3/account?{}", self.base_url, query);

        let account: AccountInfo = self
            .send(self.http.get(&url).header("X-MBX-APIKEY", &self.api_key))
            .await?;

        let balance = account
            .balances
            .iter()
            .find(|b| b.asset == asset)
            .ok_or_else(|| ApiError::Parse(format!("{} balance not found in account", asset)))?;

        Decimal::from_str(&balance.free)
            .map_err(|e| ApiError::Parse(format!("invalid {} balance {:?}: {}", asset, balance.free, e)))
    }

    /// HMAC-SHA256 of `payload` with the secret key, hex encoded.
    fn sign(&self, payload: &str) -> Result<String, ApiError> {
        let mut mac = HmacSha256::new_from_slice(self.secret_key.as_bytes())
            .map_err(|e| ApiError::Credentials(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Join parameters, append the timestamp, and sign the resulting string.
    /// Values are symbols, decimals and hex ids, so no escaping is needed and
    /// the signed bytes are exactly the bytes sent.
    fn signed_query(&self, params: &[(&str, String)]) -> Result<String, ApiError> {
        let mut query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        query.push(format!("timestamp={}", Utc::now().timestamp_millis()));

        let query = query.join("&");
        let signature = self.sign(&query)?;
        Ok(format!("{}&signature={}", query, signature))
    }

    /// Submit a signed order.
    async fn post_order(&self, params: Vec<(&str, String)>) -> Result<OrderResult, ApiError> {
        let mut params = params;
        params.push(("newClientOrderId", uuid::Uuid::new_v4().simple().to_string()));
        params.push(("newOrderRespType", "FULL".to_string()));

        let body = self.signed_query(&params)?;
        let url = format!("{}/api/v3/order", self.base_url);

        let response: BinanceOrderResponse = self
            .send(
                self.http
                    .post(&url)
                    .header("X-MBX-APIKEY", &self.api_key)
                    .header("Content-Type", "application/x-www-form-urlencoded")
                    .body(body),
            )
            .await?;

        debug!(
            symbol = %response.symbol,
            order_id = response.order_id,
            client_order_id = %response.client_order_id,
            status = %response.status,
            "Order accepted"
        );

        Ok(into_order_result(response))
    }

    /// Send a request and decode the JSON body, mapping Binance error bodies.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<BinanceErrorBody>(&body) {
                Ok(err) => ApiError::Api {
                    code: err.code,
                    message: err.msg,
                },
                Err(_) => ApiError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl OrderGateway for BinanceClient {
    async fn market_buy(
        &self,
        symbol: &str,
        quote_notional: Decimal,
    ) -> Result<OrderResult, ApiError> {
        self.post_order(vec![
            ("symbol", symbol.to_string()),
            ("side", "BUY".to_string()),
            ("type", "MARKET".to_string()),
            ("quoteOrderQty", wire_decimal(quote_notional)),
        ])
        .await
    }

    async fn limit_sell(
        &self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<OrderResult, ApiError> {
        self.post_order(vec![
            ("symbol", symbol.to_string()),
            ("side", "SELL".to_string()),
            ("type", "LIMIT".to_string()),
            ("timeInForce", "GTC".to_string()),
            ("quantity", wire_decimal(quantity)),
            ("price", wire_decimal(price)),
        ])
        .await
    }

    async fn market_sell(&self, symbol: &str, quantity: Decimal) -> Result<OrderResult, ApiError> {
        self.post_order(vec![
            ("symbol", symbol.to_string()),
            ("side", "SELL".to_string()),
            ("type", "MARKET".to_string()),
            ("quantity", wire_decimal(quantity)),
        ])
        .await
    }

    async fn symbol_rules(&self, symbol: &str) -> Result<SymbolRules, ApiError> {
        let url = format!("{}/api/v3/exchangeInfo?symbol={}", self.base_url, symbol);
        let info: ExchangeInfo = self.send(self.http.get(&url)).await?;
        rules_from_exchange_info(symbol, info)
    }
}

/// Format a decimal for the wire: at most 8 places, no trailing zeros.
fn wire_decimal(value: Decimal) -> String {
    value.round_dp(WIRE_DECIMALS).normalize().to_string()
}

/// Convert an order response. Unparsable fills are dropped so that the
/// caller's fill-price fallback applies; an unparsable executed quantity
/// falls back to the summed fills.
fn into_order_result(response: BinanceOrderResponse) -> OrderResult {
    let fills: Vec<Fill> = response
        .fills
        .iter()
        .filter_map(|f| match (Decimal::from_str(&f.price), Decimal::from_str(&f.qty)) {
            (Ok(price), Ok(qty)) => Some(Fill { price, qty }),
            _ => {
                warn!(symbol = %response.symbol, price = %f.price, qty = %f.qty, "Dropping unparsable fill");
                None
            }
        })
        .collect();

    let executed_qty = Decimal::from_str(&response.executed_qty).unwrap_or_else(|_| {
        warn!(
            symbol = %response.symbol,
            executed_qty = %response.executed_qty,
            "Unparsable executed quantity, using summed fills"
        );
        fills.iter().map(|f| f.qty).sum()
    });

    OrderResult {
        symbol: response.symbol,
        order_id: response.order_id,
        executed_qty,
        fills,
        status: response.status,
    }
}

fn rules_from_exchange_info(symbol: &str, info: ExchangeInfo) -> Result<SymbolRules, ApiError> {
    let symbol_info = info
        .symbols
        .into_iter()
        .find(|s| s.symbol == symbol)
        .ok_or_else(|| ApiError::SymbolNotFound(symbol.to_string()))?;

    let mut rules = SymbolRules::default();
    for filter in symbol_info.filters {
        match filter.filter_type.as_str() {
            "LOT_SIZE" => rules.step_size = filter.step_size.unwrap_or_default(),
            "PRICE_FILTER" => rules.tick_size = filter.tick_size.unwrap_or_default(),
            _ => {}
        }
    }

    Ok(rules)
}
