//! Data models for market quotes, exchange orders, and open positions.

mod market;
mod order;
mod position;

pub use market::AssetQuote;
pub use order::{Fill, OrderResult, SymbolRules};
pub use position::Position;
