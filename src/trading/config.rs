//! Trading configuration.

use std::time::Duration;

use anyhow::{ensure, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::SignalThresholds;

/// Configuration for the dip-buying strategy and order execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Quote amount spent on every accepted buy
    pub investment_unit: Decimal,

    /// Take-profit markup over the average fill price (0.05 = +5%)
    pub target_profit: Decimal,

    /// Quote asset every pair is traded against
    pub quote_asset: String,

    /// Number of ranked non-stablecoin assets scanned per cycle
    pub universe_size: usize,

    /// Number of ranked listings requested before filtering
    pub listing_fetch_size: usize,

    /// Wait after a buy before placing the take-profit order (seconds)
    pub settlement_delay_secs: u64,

    /// Total attempts for placing the take-profit order
    pub sell_retry_attempts: u32,

    /// Fixed wait between take-profit attempts (seconds)
    pub sell_retry_delay_secs: u64,

    /// Minutes between cycles
    pub cycle_interval_mins: u64,

    /// Warn at startup when the quote balance is below this amount
    pub low_balance_warning: Decimal,

    /// Re-attempt take-profit placement for unprotected positions each cycle
    pub reconcile_sell_orders: bool,

    /// 24h change zones
    pub thresholds: SignalThresholds,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            investment_unit: dec!(7),        // 7 USDT per trade
            target_profit: dec!(0.05),       // +5% take profit
            quote_asset: "USDT".to_string(),
            universe_size: 20,               // Top 20 non-stablecoins
            listing_fetch_size: 50,          // Fetch 50 to leave 20 after filtering
            settlement_delay_secs: 3,
            sell_retry_attempts: 3,
            sell_retry_delay_secs: 2,
            cycle_interval_mins: 60,
            low_balance_warning: dec!(20),
            reconcile_sell_orders: false,
            thresholds: SignalThresholds::default(),
        }
    }
}

impl TradingConfig {
    pub fn settlement_delay(&self) -> Duration {
        Duration::from_secs(self.settlement_delay_secs)
    }

    pub fn sell_retry_delay(&self) -> Duration {
        Duration::from_secs(self.sell_retry_delay_secs)
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_mins * 60)
    }

    /// Reject settings that would break budget accounting.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.investment_unit > Decimal::ZERO,
            "Investment unit must be positive, got {}",
            self.investment_unit
        );
        ensure!(
            self.target_profit >= Decimal::ZERO,
            "Target profit must not be negative, got {}",
            self.target_profit
        );
        ensure!(self.sell_retry_attempts > 0, "At least one sell attempt is required");
        Ok(())
    }
}
