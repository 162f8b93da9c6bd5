//! Pending order tracking: per-bar fill tests and entry timeouts.
//!
//! Fill assumptions, per entry type:
//! - Limit orders rest at their level and do not improve on gaps: a touch at
//!   or through the level fills at the level.
//! - Stop (breakout) orders model slippage on a gapped-through trigger: the
//!   fill is the worse of the trigger and the bar's open.
//! - Market orders never reach this module; the simulator fills them at the
//!   submission bar's close.

use crate::domain::{Candle, EntryType, Side, Trade, TradeState};

/// Fill verdict for one pending trade against one candle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub price: f64,
}

pub struct PendingOrderTracker;

impl PendingOrderTracker {
    /// Test whether the entry fills in this candle.
    pub fn try_fill(trade: &Trade, candle: &Candle) -> Option<Fill> {
        debug_assert_eq!(trade.state, TradeState::PendingEntry);
        let entry = trade.requested_entry;
        match (trade.intent.entry_type, trade.side) {
            (EntryType::Limit, Side::Long) => {
                (candle.low <= entry).then_some(Fill { price: entry })
            }
            (EntryType::Limit, Side::Short) => {
                (candle.high >= entry).then_some(Fill { price: entry })
            }
            (EntryType::Stop, Side::Long) => (candle.high >= entry).then_some(Fill {
                price: entry.max(candle.open),
            }),
            (EntryType::Stop, Side::Short) => (candle.low <= entry).then_some(Fill {
                price: entry.min(candle.open),
            }),
            (EntryType::Market, _) => {
                debug_assert!(false, "market orders fill at submission");
                Some(Fill { price: candle.close })
            }
        }
    }

    /// Whether an unfilled entry has timed out. Called after the pending
    /// counter has been incremented for this candle; 0 disables the timeout.
    pub fn is_expired(trade: &Trade) -> bool {
        let timeout = trade.intent.order_timeout_bars;
        timeout > 0 && trade.bars_pending >= timeout
    }
}
