//! Simple trailing stop: arm on MFE, then trail the extreme by a fixed offset.

use crate::domain::{ExitReason, Trade};

pub fn apply(trade: &mut Trade) {
    let Some(cfg) = trade.intent.trailing else {
        return;
    };
    if !trade.trailing_armed && trade.mfe() >= cfg.trigger {
        trade.trailing_armed = true;
    }
    if trade.trailing_armed {
        let level = trade.extreme_price_seen - cfg.offset * trade.side.sign();
        trade.propose_stop(level, ExitReason::TrailingStop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryType, OrderIntent, Side, TradeId};
    use crate::exits::config::TrailingConfig;
    use chrono::{TimeZone, Utc};

    fn long_with_trailing(trigger: f64, offset: f64) -> Trade {
        let mut intent = OrderIntent::new(Side::Long, EntryType::Limit, "NQ", 100.0, 92.0, 1.0);
        intent.trailing = Some(TrailingConfig { trigger, offset });
        let mut trade = Trade::from_intent(
            TradeId(1),
            intent,
            Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap(),
        );
        trade.fill(100.0);
        trade
    }

    #[test]
    fn stays_disarmed_below_trigger() {
        let mut trade = long_with_trailing(8.0, 3.0);
        trade.extreme_price_seen = 107.0;
        apply(&mut trade);
        assert!(!trade.trailing_armed);
        assert_eq!(trade.current_stop, 92.0);
    }

    #[test]
    fn arms_at_trigger_and_trails_extreme() {
        let mut trade = long_with_trailing(8.0, 3.0);
        trade.extreme_price_seen = 112.0;
        apply(&mut trade);
        assert!(trade.trailing_armed);
        assert_eq!(trade.current_stop, 109.0);
        assert_eq!(trade.stop_owner, ExitReason::TrailingStop);
    }

    #[test]
    fn stays_armed_and_never_loosens() {
        let mut trade = long_with_trailing(8.0, 3.0);
        trade.extreme_price_seen = 112.0;
        apply(&mut trade);
        // Extreme is monotone by construction, but even a stale call
        // cannot loosen the stop.
        apply(&mut trade);
        assert_eq!(trade.current_stop, 109.0);
        trade.extreme_price_seen = 115.0;
        apply(&mut trade);
        assert_eq!(trade.current_stop, 112.0);
    }

    #[test]
    fn short_trails_above_extreme() {
        let mut intent = OrderIntent::new(Side::Short, EntryType::Limit, "NQ", 100.0, 108.0, 1.0);
        intent.trailing = Some(TrailingConfig { trigger: 8.0, offset: 3.0 });
        let mut trade = Trade::from_intent(
            TradeId(2),
            intent,
            Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap(),
        );
        trade.fill(100.0);
        trade.extreme_price_seen = 90.0;
        apply(&mut trade);
        assert!(trade.trailing_armed);
        assert_eq!(trade.current_stop, 93.0);
    }
}
