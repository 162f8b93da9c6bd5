//! Candle — the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV candle for a single symbol and a single bar interval.
///
/// The simulator assumes candles arrive in strictly non-decreasing timestamp
/// order per symbol. Sanity checks belong to the data-loading caller; the
/// helpers here exist so that callers (and tests) share one definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Candle {
    /// Returns true if any OHLC field is non-finite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic OHLC sanity check: high >= low, open/close inside the range,
    /// non-zero range, positive prices.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.high > self.low
            && self.low > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_candle() -> Candle {
        Candle {
            symbol: "NQ".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap(),
            open: 18000.0,
            high: 18025.0,
            low: 17990.0,
            close: 18010.0,
            volume: 42_000,
        }
    }

    #[test]
    fn candle_is_sane() {
        assert!(sample_candle().is_sane());
    }

    #[test]
    fn candle_detects_void() {
        let mut candle = sample_candle();
        candle.low = f64::NAN;
        assert!(candle.is_void());
        assert!(!candle.is_sane());
    }

    #[test]
    fn candle_rejects_zero_range() {
        let mut candle = sample_candle();
        candle.high = 18000.0;
        candle.low = 18000.0;
        candle.open = 18000.0;
        candle.close = 18000.0;
        assert!(!candle.is_sane());
    }

    #[test]
    fn candle_serialization_roundtrip() {
        let candle = sample_candle();
        let json = serde_json::to_string(&candle).unwrap();
        let deser: Candle = serde_json::from_str(&json).unwrap();
        assert_eq!(candle.symbol, deser.symbol);
        assert_eq!(candle.timestamp, deser.timestamp);
        assert_eq!(candle.close, deser.close);
    }
}
