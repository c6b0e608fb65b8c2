//! Classification of 24h price changes into trading zones.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::AssetQuote;

/// Decision zone for a 24h percent change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalZone {
    /// Drop past the safety floor; possibly a hack or delisting
    Skip,
    /// Just above the safety floor; reported only
    Risky,
    /// Inside the buy band
    Buy,
    /// Approaching the buy band
    Watch,
    /// Not enough movement
    Hold,
}

impl SignalZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalZone::Skip => "SKIP",
            SignalZone::Risky => "RISKY",
            SignalZone::Buy => "BUY",
            SignalZone::Watch => "WATCH",
            SignalZone::Hold => "HOLD",
        }
    }
}

impl fmt::Display for SignalZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Zone boundaries, in percent. The buy band is closed on both ends: a change
/// equal to `buy_floor` or `buy_ceiling` is a buy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalThresholds {
    /// At or below: SKIP
    pub safety_floor: Decimal,
    /// Below (and above the safety floor): RISKY. At or above: BUY
    pub buy_floor: Decimal,
    /// At or below (and above the buy floor): BUY
    pub buy_ceiling: Decimal,
    /// At or below (and above the buy ceiling): WATCH
    pub watch_ceiling: Decimal,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            safety_floor: dec!(-11.0),
            buy_floor: dec!(-10.0),
            buy_ceiling: dec!(-5.0),
            watch_ceiling: dec!(-4.5),
        }
    }
}

impl SignalThresholds {
    /// Map a 24h percent change to its zone.
    pub fn classify(&self, change: Decimal) -> SignalZone {
        if change <= self.safety_floor {
            SignalZone::Skip
        } else if change < self.buy_floor {
            SignalZone::Risky
        } else if change <= self.buy_ceiling {
            SignalZone::Buy
        } else if change <= self.watch_ceiling {
            SignalZone::Watch
        } else {
            SignalZone::Hold
        }
    }
}

/// A snapshot entry with its zone attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedAsset {
    pub quote: AssetQuote,
    pub zone: SignalZone,
}

/// Classify every entry of a snapshot, preserving rank order.
pub fn classify_snapshot(thresholds: &SignalThresholds, snapshot: &[AssetQuote]) -> Vec<ClassifiedAsset> {
    snapshot
        .iter()
        .map(|quote| ClassifiedAsset {
            zone: thresholds.classify(quote.percent_change_24h),
            quote: quote.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(change: Decimal) -> SignalZone {
        SignalThresholds::default().classify(change)
    }

    #[test]
    fn test_zone_boundaries() {
        let cases = [
            (dec!(-50), SignalZone::Skip),
            (dec!(-11.0), SignalZone::Skip),
            (dec!(-10.99), SignalZone::Risky),
            (dec!(-10.0), SignalZone::Buy),
            (dec!(-9.99), SignalZone::Buy),
            (dec!(-7.0), SignalZone::Buy),
            (dec!(-5.0), SignalZone::Buy),
            (dec!(-4.99), SignalZone::Watch),
            (dec!(-4.5), SignalZone::Watch),
            (dec!(-4.49), SignalZone::Hold),
            (dec!(0), SignalZone::Hold),
            (dec!(12.3), SignalZone::Hold),
        ];

        for (change, expected) in cases {
            assert_eq!(classify(change), expected, "change {}", change);
        }
    }

    #[test]
    fn test_risky_band_is_half_open() {
        assert_eq!(classify(dec!(-10.5)), SignalZone::Risky);
        assert_eq!(classify(dec!(-10.000001)), SignalZone::Risky);
        assert_eq!(classify(dec!(-11.000001)), SignalZone::Skip);
    }

    #[test]
    fn test_buy_band_includes_both_edges() {
        let thresholds = SignalThresholds::default();
        assert_eq!(thresholds.classify(thresholds.buy_floor), SignalZone::Buy);
        assert_eq!(thresholds.classify(thresholds.buy_ceiling), SignalZone::Buy);
        assert_eq!(thresholds.classify(dec!(-10.0000001)), SignalZone::Risky);
    }

    #[test]
    fn test_classify_snapshot_keeps_order() {
        let snapshot = vec![
            AssetQuote::new("AUSDT", dec!(1), dec!(-12)),
            AssetQuote::new("BUSDT", dec!(1), dec!(-6)),
            AssetQuote::new("CUSDT", dec!(1), dec!(3)),
        ];

        let zones: Vec<_> = classify_snapshot(&SignalThresholds::default(), &snapshot)
            .into_iter()
            .map(|c| (c.quote.symbol, c.zone))
            .collect();

        assert_eq!(
            zones,
            vec![
                ("AUSDT".to_string(), SignalZone::Skip),
                ("BUSDT".to_string(), SignalZone::Buy),
                ("CUSDT".to_string(), SignalZone::Hold),
            ]
        );
    }
}
