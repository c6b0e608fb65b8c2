//! Price conformance to exchange tick sizes.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Round `price` to the nearest multiple of `tick_size`, halves rounding up.
///
/// A missing, zero, negative or unparsable tick size returns the price
/// unchanged, as does a price too large to express in ticks; the exchange
/// rejects it later if it really is off-tick.
pub fn round_to_tick(price: Decimal, tick_size: &str) -> Decimal {
    let tick = match Decimal::from_str(tick_size.trim()) {
        Ok(tick) if tick > Decimal::ZERO => tick,
        _ => return price,
    };

    let Some(ticks) = price.checked_div(tick) else {
        return price;
    };
    let ticks = ticks.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    ticks.checked_mul(tick).unwrap_or(price)
}
