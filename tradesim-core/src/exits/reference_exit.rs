//! External-reference early exit (the "zero-gamma" rule).
//!
//! Driven by a per-bar reference value from an external feed, not by price.
//! Consecutive adverse moves of the reference accumulate; a full non-adverse
//! bar resets the counter to zero. At the breakeven threshold the stop
//! ratchets to entry; at the exit threshold the trade leaves at market.

use crate::domain::{ExitReason, Side, Trade};

/// What the reference rule decided this bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceAction {
    Hold,
    /// Force an immediate market exit at the bar's close.
    Exit,
}

pub fn on_bar(trade: &mut Trade, reference: Option<f64>) -> ReferenceAction {
    let Some(cfg) = trade.intent.reference_exit else {
        return ReferenceAction::Hold;
    };
    // A bar without a sample neither advances nor resets the counter.
    let Some(value) = reference else {
        return ReferenceAction::Hold;
    };

    let adverse = match (trade.last_reference, trade.side) {
        (Some(prev), Side::Long) => value < prev,
        (Some(prev), Side::Short) => value > prev,
        (None, _) => false,
    };
    trade.last_reference = Some(value);

    if adverse {
        trade.adverse_reference_count += 1;
    } else {
        trade.adverse_reference_count = 0;
    }

    if cfg.exit_threshold > 0 && trade.adverse_reference_count >= cfg.exit_threshold {
        return ReferenceAction::Exit;
    }

    if !trade.reference_breakeven_done
        && cfg.breakeven_threshold > 0
        && trade.adverse_reference_count >= cfg.breakeven_threshold
    {
        if let Some(entry) = trade.actual_entry {
            trade.propose_stop(entry, ExitReason::ReferenceSignal);
        }
        trade.reference_breakeven_done = true;
    }

    ReferenceAction::Hold
}
