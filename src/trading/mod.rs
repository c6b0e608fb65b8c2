//! Trading logic: signal zones, price normalization, retry, position management.

mod config;
mod position_manager;
mod pricing;
mod retry;
mod signal;

pub use config::TradingConfig;
pub use position_manager::{BuyOutcome, PositionManager, SellPlacement};
pub use signal::{classify_snapshot, ClassifiedAsset, SignalThresholds, SignalZone};
