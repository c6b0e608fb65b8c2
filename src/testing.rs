//! Scripted in-memory gateway and market-data source for tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::api::{ApiError, MarketDataSource, OrderGateway};
use crate::models::{AssetQuote, Fill, OrderResult, SymbolRules};
use crate::trading::TradingConfig;

/// Default config with every wait set to zero.
pub fn test_config() -> TradingConfig {
    TradingConfig {
        settlement_delay_secs: 0,
        sell_retry_delay_secs: 0,
        ..TradingConfig::default()
    }
}

/// Gateway double. By default buys fill 0.7 units without fill records,
/// rules report a 0.01 tick, and sells succeed.
pub struct MockGateway {
    fills: Vec<Fill>,
    executed_qty: Decimal,
    fail_buys: bool,
    rules: Option<SymbolRules>,
    sell_failures: u32,

    buy_calls: AtomicU32,
    sell_calls: AtomicU32,
    market_sell_calls: AtomicU32,
    rules_calls: AtomicU32,
    limit_sells: Mutex<Vec<(String, Decimal, Decimal)>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            fills: Vec::new(),
            executed_qty: dec!(0.7),
            fail_buys: false,
            rules: Some(SymbolRules {
                step_size: "0.001".to_string(),
                tick_size: "0.01".to_string(),
            }),
            sell_failures: 0,
            buy_calls: AtomicU32::new(0),
            sell_calls: AtomicU32::new(0),
            market_sell_calls: AtomicU32::new(0),
            rules_calls: AtomicU32::new(0),
            limit_sells: Mutex::new(Vec::new()),
        }
    }

    pub fn with_fills(mut self, fills: Vec<Fill>) -> Self {
        self.executed_qty = fills.iter().map(|f| f.qty).sum();
        self.fills = fills;
        self
    }

    pub fn with_executed_qty(mut self, qty: Decimal) -> Self {
        self.executed_qty = qty;
        self
    }

    pub fn failing_buys(mut self) -> Self {
        self.fail_buys = true;
        self
    }

    pub fn with_rules(mut self, rules: SymbolRules) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn without_rules(mut self) -> Self {
        self.rules = None;
        self
    }

    /// Fail the first `n` limit sells.
    pub fn with_sell_failures(mut self, n: u32) -> Self {
        self.sell_failures = n;
        self
    }

    pub fn buy_calls(&self) -> u32 {
        self.buy_calls.load(Ordering::SeqCst)
    }

    pub fn sell_calls(&self) -> u32 {
        self.sell_calls.load(Ordering::SeqCst)
    }

    pub fn rules_calls(&self) -> u32 {
        self.rules_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> u32 {
        self.buy_calls()
            + self.sell_calls()
            + self.rules_calls()
            + self.market_sell_calls.load(Ordering::SeqCst)
    }

    /// Accepted limit sells as (symbol, quantity, price).
    pub fn limit_sells(&self) -> Vec<(String, Decimal, Decimal)> {
        self.limit_sells.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderGateway for MockGateway {
    async fn market_buy(
        &self,
        symbol: &str,
        _quote_notional: Decimal,
    ) -> Result<OrderResult, ApiError> {
        let n = self.buy_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_buys {
            return Err(ApiError::Api {
                code: -2010,
                message: "Account has insufficient balance for requested action.".to_string(),
            });
        }

        Ok(OrderResult {
            symbol: symbol.to_string(),
            order_id: i64::from(n),
            executed_qty: self.executed_qty,
            fills: self.fills.clone(),
            status: "FILLED".to_string(),
        })
    }

    async fn limit_sell(
        &self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<OrderResult, ApiError> {
        let n = self.sell_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.sell_failures {
            return Err(ApiError::Api {
                code: -1013,
                message: format!("Filter failure: PRICE_FILTER (attempt {})", n),
            });
        }

        self.limit_sells
            .lock()
            .unwrap()
            .push((symbol.to_string(), quantity, price));

        Ok(OrderResult {
            symbol: symbol.to_string(),
            order_id: 1000 + i64::from(n),
            executed_qty: Decimal::ZERO,
            fills: Vec::new(),
            status: "NEW".to_string(),
        })
    }

    async fn market_sell(&self, symbol: &str, quantity: Decimal) -> Result<OrderResult, ApiError> {
        let n = self.market_sell_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(OrderResult {
            symbol: symbol.to_string(),
            order_id: 2000 + i64::from(n),
            executed_qty: quantity,
            fills: Vec::new(),
            status: "FILLED".to_string(),
        })
    }

    async fn symbol_rules(&self, symbol: &str) -> Result<SymbolRules, ApiError> {
        self.rules_calls.fetch_add(1, Ordering::SeqCst);
        self.rules
            .clone()
            .ok_or_else(|| ApiError::SymbolNotFound(symbol.to_string()))
    }
}

/// Market-data double returning a fixed snapshot, or failing when none is set.
pub struct MockMarketData {
    snapshot: Option<Vec<AssetQuote>>,
    calls: AtomicU32,
}

impl MockMarketData {
    pub fn new(snapshot: Vec<AssetQuote>) -> Self {
        Self {
            snapshot: Some(snapshot),
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            snapshot: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketDataSource for MockMarketData {
    async fn fetch_ranked_assets(
        &self,
        limit: usize,
        _exclude_stablecoins: bool,
    ) -> Result<Vec<AssetQuote>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.snapshot {
            Some(snapshot) => Ok(snapshot.iter().take(limit).cloned().collect()),
            None => Err(ApiError::Status {
                status: 503,
                body: "Service Unavailable".to_string(),
            }),
        }
    }
}

