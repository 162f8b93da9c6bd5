//! Time-based trailing ladder.
//!
//! Rules are scanned in declared order each candle; the LAST rule whose
//! `(bars_since_entry >= after_bars) && (MFE >= if_mfe)` holds wins, so a
//! later, more aggressive rule overrides earlier matches on the same bar.

use crate::domain::{ExitReason, Trade};
use crate::exits::config::LadderAction;

pub fn apply(trade: &mut Trade) {
    if trade.intent.time_ladder.is_empty() {
        return;
    }
    let Some(entry) = trade.actual_entry else {
        return;
    };
    let mfe = trade.mfe();

    let mut selected = None;
    for rule in &trade.intent.time_ladder {
        if trade.bars_since_entry >= rule.after_bars && mfe >= rule.if_mfe {
            selected = Some(*rule);
        }
    }

    if let Some(rule) = selected {
        let level = match rule.action {
            LadderAction::Breakeven => entry,
            LadderAction::TrailBy(distance) => {
                trade.extreme_price_seen - distance * trade.side.sign()
            }
        };
        trade.propose_stop(level, ExitReason::TimeLadder);
    }
}
