//! Breakeven stop — a one-shot ratchet, not continuous trailing.
//!
//! Once favorable excursion reaches the trigger, the stop ratchets to entry
//! plus the configured offset exactly once and the mechanism retires for the
//! rest of the trade.

use crate::domain::{ExitReason, Trade};

pub fn apply(trade: &mut Trade) {
    let Some(cfg) = trade.intent.breakeven else {
        return;
    };
    if trade.breakeven_done {
        return;
    }
    let Some(entry) = trade.actual_entry else {
        return;
    };
    if trade.mfe() >= cfg.trigger {
        let level = entry + cfg.offset * trade.side.sign();
        trade.propose_stop(level, ExitReason::BreakevenStop);
        // Retired even if a tighter mechanism already owned the stop.
        trade.breakeven_done = true;
    }
}
