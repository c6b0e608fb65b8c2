//! Position model representing a spot holding opened by a dip buy.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An open spot position. Created on a confirmed buy fill; afterwards only
/// the take-profit order fields change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Unique, strictly increasing position id
    pub id: u64,

    /// Exchange trading pair
    pub symbol: String,

    /// Average fill price of the buy
    pub buy_price: Decimal,

    /// Quantity bought
    pub quantity: Decimal,

    /// Quote amount spent (one investment unit)
    pub invested_amount: Decimal,

    /// Take-profit price; tick-normalized once a sell order is accepted
    pub target_sell_price: Decimal,

    /// When the buy was confirmed
    pub buy_time: DateTime<Utc>,

    /// 24h change (percent) at the moment of purchase
    pub drop_percentage: Decimal,

    /// Market value of the holding
    pub current_value: Decimal,

    /// Exchange id of the resting take-profit order
    #[serde(default)]
    pub sell_order_id: Option<i64>,

    /// Whether a take-profit order is resting on the book
    #[serde(default)]
    pub has_active_sell_order: bool,
}

impl Position {
    /// Open a position from a confirmed fill. The take-profit price starts at
    /// `buy_price * (1 + target_profit)` and no sell order is attached yet.
    pub fn open(
        id: u64,
        symbol: String,
        buy_price: Decimal,
        quantity: Decimal,
        invested_amount: Decimal,
        drop_percentage: Decimal,
        target_profit: Decimal,
    ) -> Self {
        Self {
            id,
            symbol,
            buy_price,
            quantity,
            invested_amount,
            target_sell_price: buy_price * (Decimal::ONE + target_profit),
            buy_time: Utc::now(),
            drop_percentage,
            current_value: buy_price * quantity,
            sell_order_id: None,
            has_active_sell_order: false,
        }
    }

    /// Record an accepted take-profit order at its normalized price.
    pub fn attach_sell_order(&mut self, order_id: i64, price: Decimal) {
        self.sell_order_id = Some(order_id);
        self.has_active_sell_order = true;
        self.target_sell_price = price;
    }

    /// True when no take-profit order protects this position and it has to be
    /// watched by hand.
    pub fn needs_manual_monitoring(&self) -> bool {
        !self.has_active_sell_order
    }

    /// Profit in quote currency if the take-profit order fills.
    pub fn expected_profit(&self) -> Decimal {
        self.target_sell_price * self.quantity - self.invested_amount
    }
}
