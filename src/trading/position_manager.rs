//! Position manager: owns the budget and open positions, and executes buys.
//!
//! A buy is one market order for a fixed investment unit, followed after a
//! settlement delay by a take-profit limit sell placed under bounded retry.
//! Only the market buy can fail the call; problems with the take-profit order
//! leave the position open for manual monitoring.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::api::{ApiError, OrderGateway};
use crate::models::{AssetQuote, Position};

use super::pricing::round_to_tick;
use super::retry::{retry_fixed, FixedRetry};
use super::TradingConfig;

/// Result of a buy attempt that did not hit a submission error.
#[derive(Debug, Clone, PartialEq)]
pub enum BuyOutcome {
    /// A position was opened and the budget charged.
    Opened {
        position_id: u64,
        sell: SellPlacement,
    },
    /// Guard tripped; nothing was submitted.
    InsufficientBudget {
        available: Decimal,
        required: Decimal,
    },
}

/// What happened to the take-profit order of a position.
#[derive(Debug, Clone, PartialEq)]
pub enum SellPlacement {
    /// Resting on the book at the tick-normalized price.
    Placed { order_id: i64, price: Decimal },
    /// Trading rules could not be fetched; no order was attempted.
    RulesUnavailable(String),
    /// Every attempt failed; carries the last error.
    Exhausted { attempts: u32, error: String },
}

impl SellPlacement {
    pub fn is_placed(&self) -> bool {
        matches!(self, SellPlacement::Placed { .. })
    }
}

/// Owner of the trading budget and the open positions.
pub struct PositionManager {
    gateway: Arc<dyn OrderGateway>,
    config: TradingConfig,

    total_budget: Decimal,
    available_budget: Decimal,
    positions: Vec<Position>,
    next_position_id: u64,
}

impl PositionManager {
    /// Create a manager with `budget` available for buys.
    pub fn new(gateway: Arc<dyn OrderGateway>, config: TradingConfig, budget: Decimal) -> Self {
        let budget = budget.max(Decimal::ZERO);
        Self {
            gateway,
            config,
            total_budget: budget,
            available_budget: budget,
            positions: Vec::new(),
            next_position_id: 1,
        }
    }

    pub fn total_budget(&self) -> Decimal {
        self.total_budget
    }

    pub fn available_budget(&self) -> Decimal {
        self.available_budget
    }

    pub fn investment_unit(&self) -> Decimal {
        self.config.investment_unit
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Positions without a resting take-profit order.
    pub fn unprotected_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter().filter(|p| p.needs_manual_monitoring())
    }

    /// Sum of the current value of all positions.
    pub fn portfolio_value(&self) -> Decimal {
        self.positions.iter().map(|p| p.current_value).sum()
    }

    /// Whether another investment unit is available. A non-positive unit
    /// never passes, so the budget can only go down.
    pub fn can_afford_buy(&self) -> bool {
        self.config.investment_unit > Decimal::ZERO
            && self.available_budget >= self.config.investment_unit
    }

    /// Open one position in `asset` for one investment unit.
    ///
    /// Returns `Err` only when the market buy itself fails, in which case
    /// nothing has changed. Any accepted buy charges the budget, whether or
    /// not its take-profit order could be placed.
    pub async fn execute_buy(&mut self, asset: &AssetQuote) -> Result<BuyOutcome, ApiError> {
        let unit = self.config.investment_unit;

        if !self.can_afford_buy() {
            info!(
                symbol = %asset.symbol,
                available = %self.available_budget,
                required = %unit,
                "Insufficient budget, skipping buy"
            );
            return Ok(BuyOutcome::InsufficientBudget {
                available: self.available_budget,
                required: unit,
            });
        }

        info!(symbol = %asset.symbol, amount = %unit, price = %asset.last_price, "Submitting market buy");

        let order = self.gateway.market_buy(&asset.symbol, unit).await?;

        let quantity = order.executed_qty;
        let buy_price = order.average_fill_price().unwrap_or_else(|| {
            warn!(symbol = %asset.symbol, "No usable fills, using snapshot price");
            asset.last_price
        });

        let mut position = Position::open(
            self.next_position_id,
            asset.symbol.clone(),
            buy_price,
            quantity,
            unit,
            asset.percent_change_24h,
            self.config.target_profit,
        );

        info!(
            symbol = %asset.symbol,
            order_id = order.order_id,
            quantity = %quantity,
            buy_price = %buy_price,
            "Buy filled, waiting for settlement"
        );
        tokio::time::sleep(self.config.settlement_delay()).await;

        let sell = self
            .place_take_profit(&position.symbol, quantity, position.target_sell_price)
            .await;
        if let SellPlacement::Placed { order_id, price } = &sell {
            position.attach_sell_order(*order_id, *price);
        }

        let position_id = self.commit(position);

        info!(
            position_id,
            symbol = %asset.symbol,
            protected = sell.is_placed(),
            available = %self.available_budget,
            "Position opened"
        );

        Ok(BuyOutcome::Opened { position_id, sell })
    }

    /// Re-attempt the take-profit order for every unprotected position.
    /// Returns how many positions gained a sell order. Budget is untouched.
    pub async fn reconcile_sell_orders(&mut self) -> usize {
        let pending: Vec<(usize, String, Decimal, Decimal)> = self
            .positions
            .iter()
            .enumerate()
            .filter(|(_, p)| p.needs_manual_monitoring())
            .map(|(idx, p)| (idx, p.symbol.clone(), p.quantity, p.target_sell_price))
            .collect();

        let mut placed = 0;
        for (idx, symbol, quantity, target) in pending {
            if let SellPlacement::Placed { order_id, price } =
                self.place_take_profit(&symbol, quantity, target).await
            {
                self.positions[idx].attach_sell_order(order_id, price);
                placed += 1;
            }
        }

        if placed > 0 {
            info!(placed, "Reconciled take-profit orders");
        }
        placed
    }

    /// Fetch rules, normalize the target price, and place the limit sell
    /// under bounded retry. Never fails; problems degrade into the result.
    async fn place_take_profit(&self, symbol: &str, quantity: Decimal, target: Decimal) -> SellPlacement {
        let rules = match self.gateway.symbol_rules(symbol).await {
            Ok(rules) => rules,
            Err(e) => {
                warn!(
                    symbol = %symbol,
                    error = %e,
                    "Could not get symbol rules, position needs manual monitoring"
                );
                return SellPlacement::RulesUnavailable(e.to_string());
            }
        };

        let price = round_to_tick(target, &rules.tick_size);
        info!(
            symbol = %symbol,
            target = %target,
            rounded = %price,
            tick_size = %rules.tick_size,
            step_size = %rules.step_size,
            "Placing take-profit order"
        );

        let policy = FixedRetry::new(self.config.sell_retry_attempts, self.config.sell_retry_delay());
        let attempts = policy.max_attempts();
        let gateway = &self.gateway;

        match retry_fixed(policy, "limit_sell", || gateway.limit_sell(symbol, quantity, price)).await {
            Ok(order) => {
                info!(symbol = %symbol, order_id = order.order_id, price = %price, "Take-profit order placed");
                SellPlacement::Placed {
                    order_id: order.order_id,
                    price,
                }
            }
            Err(e) => {
                warn!(
                    symbol = %symbol,
                    attempts,
                    error = %e,
                    "Failed to place take-profit order, position needs manual monitoring"
                );
                SellPlacement::Exhausted {
                    attempts,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Record an accepted buy: append the position, charge one investment
    /// unit, advance the id counter. All three happen together under the
    /// exclusive borrow.
    fn commit(&mut self, position: Position) -> u64 {
        let id = position.id;
        self.positions.push(position);
        self.available_budget -= self.config.investment_unit;
        self.next_position_id += 1;
        id
    }
}
