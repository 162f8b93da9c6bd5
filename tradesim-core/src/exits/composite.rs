//! Composite multi-phase trailing — a monotonic ladder keyed on MFE.
//!
//! Phase transitions and actions:
//! 0 → inactive; 1 → zone breakeven; 2 → structural (swing) trailing;
//! 3 → aggressive tightening; 4 → proximity trailing near the target.
//! The phase index never decreases within a trade.

use crate::domain::{Candle, ExitReason, Trade};
use crate::exits::swing::structural_stop;

pub fn apply(trade: &mut Trade, window: &[Candle], close: f64) {
    let Some(cfg) = trade.intent.composite else {
        return;
    };
    let Some(entry) = trade.actual_entry else {
        return;
    };
    let mfe = trade.mfe();

    let mut phase = trade.composite_phase;
    if phase == 0 && mfe >= cfg.activation_threshold {
        phase = 1;
    }
    if phase >= 1 && mfe >= cfg.structural_threshold {
        phase = phase.max(2);
    }
    if phase >= 2 && mfe >= cfg.aggressive_threshold {
        phase = phase.max(3);
    }
    if phase >= 1 {
        if let Some(target) = trade.current_target {
            let total = trade.side.points(entry, target);
            let remaining = trade.side.points(close, target);
            if total > 0.0 && remaining <= cfg.proximity_pct * total {
                phase = 4;
            }
        }
    }
    trade.composite_phase = phase;

    let proposal = match phase {
        1 => zone_breakeven(trade, entry, cfg.entry_zone),
        2 => structural_stop(
            trade.side,
            window,
            cfg.swing_lookback,
            cfg.swing_buffer,
            cfg.min_swing_size,
        ),
        3 => {
            // Trail distance shrinks progressively as MFE grows past the
            // aggressive threshold.
            let offset = cfg.aggressive_offset * (cfg.aggressive_threshold / mfe).min(1.0);
            Some(trade.extreme_price_seen - offset * trade.side.sign())
        }
        4 => Some(trade.extreme_price_seen - cfg.proximity_offset * trade.side.sign()),
        _ => None,
    };

    if let Some(level) = proposal {
        trade.propose_stop(level, ExitReason::CompositeTrail);
    }
}

/// Phase 1: once price has cleared the entry zone, park the stop at entry.
fn zone_breakeven(trade: &Trade, entry: f64, entry_zone: Option<f64>) -> Option<f64> {
    let zone = entry_zone?;
    if trade.mfe() >= zone {
        Some(entry)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryType, OrderIntent, Side, TradeId};
    use crate::exits::config::CompositeConfig;
    use chrono::{Duration, TimeZone, Utc};

    fn cfg() -> CompositeConfig {
        CompositeConfig {
            activation_threshold: 5.0,
            entry_zone: Some(3.0),
            structural_threshold: 10.0,
            swing_lookback: 2,
            swing_buffer: 1.0,
            min_swing_size: 2.0,
            aggressive_threshold: 20.0,
            aggressive_offset: 6.0,
            proximity_pct: 0.1,
            proximity_offset: 2.0,
        }
    }

    fn long_composite(target: Option<f64>) -> Trade {
        let mut intent = OrderIntent::new(Side::Long, EntryType::Limit, "NQ", 100.0, 90.0, 1.0);
        intent.composite = Some(cfg());
        intent.take_profit = target;
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
    fn phase0_below_activation() {
        let mut trade = long_composite(None);
        trade.extreme_price_seen = 104.0;
        apply(&mut trade, &[], 104.0);
        assert_eq!(trade.composite_phase, 0);
        assert_eq!(trade.current_stop, 90.0);
    }

    #[test]
    fn phase1_zone_breakeven() {
        let mut trade = long_composite(None);
        trade.extreme_price_seen = 106.0; // MFE 6 >= activation 5 and zone 3
        apply(&mut trade, &[], 105.0);
        assert_eq!(trade.composite_phase, 1);
        assert_eq!(trade.current_stop, 100.0);
        assert_eq!(trade.stop_owner, ExitReason::CompositeTrail);
    }

    #[test]
    fn phase2_trails_confirmed_swing() {
        let mut trade = long_composite(None);
        trade.extreme_price_seen = 112.0; // MFE 12 >= structural 10
        let window = window_with_lows(&[104.0, 103.0, 101.0, 103.0, 105.0]);
        apply(&mut trade, &window, 110.0);
        assert_eq!(trade.composite_phase, 2);
        // Swing low 101, buffer 1 → stop 100.
        assert_eq!(trade.current_stop, 100.0);
    }

    #[test]
    fn phase2_ignores_shallow_swing() {
        let mut trade = long_composite(None);
        trade.extreme_price_seen = 112.0;
        // Pivot depth is high(lows+5) - pivot = 5.5 max; with min_swing_size
        // raised above it the pivot must be ignored.
        let mut config = cfg();
        config.min_swing_size = 50.0;
        trade.intent.composite = Some(config);
        let window = window_with_lows(&[104.0, 103.0, 101.0, 103.0, 105.0]);
        apply(&mut trade, &window, 110.0);
        assert_eq!(trade.composite_phase, 2);
        assert_eq!(trade.current_stop, 90.0); // unchanged
    }

    #[test]
    fn phase3_offset_shrinks_with_mfe() {
        let mut trade = long_composite(None);
        trade.extreme_price_seen = 130.0; // MFE 30 >= aggressive 20
        apply(&mut trade, &[], 128.0);
        assert_eq!(trade.composite_phase, 3);
        // offset = 6 * (20 / 30) = 4 → stop 126.
        assert_eq!(trade.current_stop, 126.0);

        trade.extreme_price_seen = 160.0; // MFE 60 → offset 2 → stop 158
        apply(&mut trade, &[], 158.0);
        assert_eq!(trade.current_stop, 158.0);
    }

    #[test]
    fn phase4_proximity_to_target() {
        let mut trade = long_composite(Some(140.0));
        trade.extreme_price_seen = 137.0;
        // Remaining 3 of 40 total = 7.5% <= 10% → phase 4.
        apply(&mut trade, &[], 137.0);
        assert_eq!(trade.composite_phase, 4);
        assert_eq!(trade.current_stop, 135.0); // extreme - proximity_offset
    }

    #[test]
    fn phase_never_regresses() {
        let mut trade = long_composite(None);
        trade.extreme_price_seen = 112.0;
        apply(&mut trade, &[], 110.0);
        assert_eq!(trade.composite_phase, 2);
        // Extreme is monotone; even with a collapsed close the phase holds.
        apply(&mut trade, &[], 101.0);
        assert_eq!(trade.composite_phase, 2);
    }
}
