//! Hybrid structural trailing.
//!
//! Below the structure threshold the trade runs under its original fixed
//! stop alone. Once MFE reaches the threshold the trade switches permanently
//! to swing-based trailing — same mechanics as composite Phase 2, with its
//! own lookback, buffer, and minimum swing size.

use crate::domain::{Candle, ExitReason, Trade};
use crate::exits::swing::structural_stop;

pub fn apply(trade: &mut Trade, window: &[Candle]) {
    let Some(cfg) = trade.intent.hybrid else {
        return;
    };
    if !trade.hybrid_active && trade.mfe() >= cfg.structure_threshold {
        trade.hybrid_active = true;
    }
    if !trade.hybrid_active {
        return;
    }
    if let Some(level) = structural_stop(
        trade.side,
        window,
        cfg.swing_lookback,
        cfg.swing_buffer,
        cfg.min_swing_size,
    ) {
        trade.propose_stop(level, ExitReason::HybridTrail);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryType, OrderIntent, Side, TradeId};
    use crate::exits::config::HybridConfig;
    use chrono::{Duration, TimeZone, Utc};

    fn long_hybrid(threshold: f64) -> Trade {
        let mut intent = OrderIntent::new(Side::Long, EntryType::Limit, "NQ", 100.0, 90.0, 1.0);
        intent.hybrid = Some(HybridConfig {
            structure_threshold: threshold,
            swing_lookback: 2,
            swing_buffer: 1.0,
            min_swing_size: 2.0,
        });
        let mut trade = Trade::from_intent(
            TradeId(1),
            intent,
            Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap(),
        );
        trade.fill(100.0);
        trade
    }

    fn window_with_lows(lows: &[f64]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 30, 0).unwrap();
        lows.iter()
            .enumerate()
            .map(|(i, &low)| Candle {
                symbol: "NQ".into(),
                timestamp: start + Duration::minutes(i as i64),
                open: low + 2.0,
                high: low + 5.0,
                low,
                close: low + 3.0,
                volume: 100,
            })
            .collect()
    }

    #[test]
    fn fixed_stop_only_below_threshold() {
        let mut trade = long_hybrid(10.0);
        trade.extreme_price_seen = 108.0;
        let window = window_with_lows(&[104.0, 103.0, 101.0, 103.0, 105.0]);
        apply(&mut trade, &window);
        assert!(!trade.hybrid_active);
        assert_eq!(trade.current_stop, 90.0);
    }

    #[test]
    fn switches_to_structural_at_threshold() {
        let mut trade = long_hybrid(10.0);
        trade.extreme_price_seen = 112.0;
        let window = window_with_lows(&[104.0, 103.0, 101.0, 103.0, 105.0]);
        apply(&mut trade, &window);
        assert!(trade.hybrid_active);
        assert_eq!(trade.current_stop, 100.0); // swing 101 - buffer 1
        assert_eq!(trade.stop_owner, ExitReason::HybridTrail);
    }

    #[test]
    fn switch_is_permanent() {
        let mut trade = long_hybrid(10.0);
        trade.extreme_price_seen = 112.0;
        let window = window_with_lows(&[104.0, 103.0, 101.0, 103.0, 105.0]);
        apply(&mut trade, &window);
        assert!(trade.hybrid_active);
        // Still active on later bars regardless of the swing picture.
        apply(&mut trade, &[]);
        assert!(trade.hybrid_active);
        assert_eq!(trade.current_stop, 100.0);
    }
}
