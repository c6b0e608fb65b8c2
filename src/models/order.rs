//! Exchange order results and per-symbol trading rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single execution record of a submitted order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub price: Decimal,
    pub qty: Decimal,
}

/// Outcome of an order submission, produced once by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    pub symbol: String,
    pub order_id: i64,
    /// Quantity executed at submission time (zero for a resting limit order)
    pub executed_qty: Decimal,
    pub fills: Vec<Fill>,
    pub status: String,
}

impl OrderResult {
    /// Total quantity across all fills.
    pub fn filled_qty(&self) -> Decimal {
        self.fills.iter().map(|f| f.qty).sum()
    }

    /// Volume-weighted average fill price, or `None` when nothing was filled.
    pub fn average_fill_price(&self) -> Option<Decimal> {
        let total_qty = self.filled_qty();
        if total_qty <= Decimal::ZERO {
            return None;
        }

        let notional: Decimal = self.fills.iter().map(|f| f.price * f.qty).sum();
        let avg = notional / total_qty;
        (avg > Decimal::ZERO).then_some(avg)
    }
}

/// Trading rules for a symbol. Values are kept as the exchange sends them
/// so that an unparsable filter degrades at the point of use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRules {
    /// Minimum quantity increment (LOT_SIZE)
    pub step_size: String,

    /// Minimum price increment (PRICE_FILTER)
    pub tick_size: String,
}
