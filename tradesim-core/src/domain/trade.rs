//! Trade — the mutable aggregate tracked from submission to settlement.
//!
//! A trade is owned exclusively by the [`crate::ledger::PositionLedger`].
//! The exit engine receives a mutable reference once per bar and may
//! transition its state, but never holds it across calls.

use super::ids::TradeId;
use super::intent::{OrderIntent, Side};
use crate::domain::Candle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trade lifecycle states. Transitions are one-directional:
/// PendingEntry → Open → Closed, or PendingEntry → Cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeState {
    PendingEntry,
    Open,
    Closed,
    Cancelled,
}

/// Why a trade exited, or which mechanism currently owns the stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    BreakevenStop,
    TrailingStop,
    CompositeTrail,
    TimeLadder,
    HybridTrail,
    ReferenceSignal,
    TimeLimit,
    SessionClose,
    EndOfData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub state: TradeState,
    pub side: Side,
    pub symbol: String,
    pub quantity: f64,
    pub requested_entry: f64,
    pub actual_entry: Option<f64>,

    /// Effective protective stop. Only ever tightens once any trailing
    /// mechanism arms: up for longs, down for shorts.
    pub current_stop: f64,
    pub current_target: Option<f64>,
    /// Stop level from the original intent, kept for reporting.
    pub original_stop: f64,
    /// Which mechanism last tightened `current_stop`; a later stop exit
    /// reports this as its reason.
    pub stop_owner: ExitReason,

    // ── Trailing / phase bookkeeping ──
    /// Highest high since entry for longs, lowest low for shorts.
    pub extreme_price_seen: f64,
    pub trailing_armed: bool,
    pub breakeven_done: bool,
    /// Composite ladder phase, 0..=4, monotonic within the trade.
    pub composite_phase: u8,
    pub hybrid_active: bool,

    // ── External-reference exit bookkeeping ──
    pub adverse_reference_count: u32,
    pub last_reference: Option<f64>,
    pub reference_breakeven_done: bool,

    // ── Counters ──
    /// Candles consumed while Open. Incremented exactly once per candle.
    pub bars_since_entry: usize,
    /// Candles consumed while PendingEntry, starting the candle after
    /// submission.
    pub bars_pending: usize,

    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub actual_exit: Option<f64>,
    pub exit_reason: Option<ExitReason>,

    /// The immutable intent this trade was created from. Carries all exit
    /// mechanism parameters.
    pub intent: OrderIntent,
}

impl Trade {
    /// Create a trade from a validated intent. Trades start PendingEntry;
    /// market intents are filled by the simulator in the same call, so they
    /// never rest in that state across a bar.
    pub fn from_intent(id: TradeId, intent: OrderIntent, submitted: DateTime<Utc>) -> Self {
        Self {
            id,
            state: TradeState::PendingEntry,
            side: intent.side,
            symbol: intent.symbol.clone(),
            quantity: intent.quantity,
            requested_entry: intent.entry_price,
            actual_entry: None,
            current_stop: intent.stop_loss,
            current_target: intent.take_profit,
            original_stop: intent.stop_loss,
            stop_owner: ExitReason::StopLoss,
            extreme_price_seen: intent.entry_price,
            trailing_armed: false,
            breakeven_done: false,
            composite_phase: 0,
            hybrid_active: false,
            adverse_reference_count: 0,
            last_reference: None,
            reference_breakeven_done: false,
            bars_since_entry: 0,
            bars_pending: 0,
            entry_time: submitted,
            exit_time: None,
            actual_exit: None,
            exit_reason: None,
            intent,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, TradeState::Closed | TradeState::Cancelled)
    }

    /// PendingEntry → Open at the given fill price.
    pub fn fill(&mut self, price: f64) {
        debug_assert_eq!(self.state, TradeState::PendingEntry);
        self.state = TradeState::Open;
        self.actual_entry = Some(price);
        self.extreme_price_seen = price;
    }

    /// Open → Closed at the given exit price.
    pub fn close(&mut self, price: f64, reason: ExitReason, at: DateTime<Utc>) {
        debug_assert_eq!(self.state, TradeState::Open);
        self.state = TradeState::Closed;
        self.actual_exit = Some(price);
        self.exit_reason = Some(reason);
        self.exit_time = Some(at);
    }

    /// PendingEntry → Cancelled. No P&L, no partial state.
    pub fn cancel(&mut self) {
        debug_assert_eq!(self.state, TradeState::PendingEntry);
        self.state = TradeState::Cancelled;
    }

    /// Max favorable excursion in points since entry, from the extreme
    /// favorable price seen so far.
    pub fn mfe(&self) -> f64 {
        match self.actual_entry {
            Some(entry) => self.side.points(entry, self.extreme_price_seen),
            None => 0.0,
        }
    }

    /// Fold a candle's range into the extreme favorable price.
    pub fn update_excursion(&mut self, candle: &Candle) {
        match self.side {
            Side::Long => {
                if candle.high > self.extreme_price_seen {
                    self.extreme_price_seen = candle.high;
                }
            }
            Side::Short => {
                if candle.low < self.extreme_price_seen {
                    self.extreme_price_seen = candle.low;
                }
            }
        }
    }

    /// Ratchet `current_stop` toward the proposed level, recording the
    /// proposing mechanism if it tightened. Returns true on tighten.
    pub fn propose_stop(&mut self, proposed: f64, owner: ExitReason) -> bool {
        let next = self.side.tighter_stop(self.current_stop, proposed);
        let tightened = next != self.current_stop;
        if tightened {
            self.current_stop = next;
            self.stop_owner = owner;
        }
        tightened
    }
}

/// What changed for a trade this bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateKind {
    /// The pending entry filled; the trade is now open.
    Filled,
    /// The trade closed this bar and was settled.
    Completed,
    /// The pending entry timed out without filling.
    Cancelled,
    /// The data stream ended with the trade still open (report-only policy).
    OpenAtEnd,
}

/// Per-bar output record for a trade whose state changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeUpdate {
    pub id: TradeId,
    pub kind: UpdateKind,
    pub side: Side,
    pub symbol: String,
    pub entry_price: f64,
    pub actual_entry: Option<f64>,
    pub stop_loss: f64,
    pub take_profit: Option<f64>,
    pub actual_exit: Option<f64>,
    pub exit_reason: Option<ExitReason>,
    pub points_pnl: Option<f64>,
    pub gross_pnl: Option<f64>,
    pub net_pnl: Option<f64>,
    pub bars_since_entry: usize,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    /// Opaque strategy payload from the originating intent, untouched.
    pub metadata: Option<serde_json::Value>,
}

impl TradeUpdate {
    /// Snapshot of the non-P&L fields; settlement fields start empty.
    pub fn snapshot(trade: &Trade, kind: UpdateKind) -> Self {
        Self {
            id: trade.id,
            kind,
            side: trade.side,
            symbol: trade.symbol.clone(),
            entry_price: trade.requested_entry,
            actual_entry: trade.actual_entry,
            stop_loss: trade.current_stop,
            take_profit: trade.current_target,
            actual_exit: trade.actual_exit,
            exit_reason: trade.exit_reason,
            points_pnl: None,
            gross_pnl: None,
            net_pnl: None,
            bars_since_entry: trade.bars_since_entry,
            entry_time: trade.entry_time,
            exit_time: trade.exit_time,
            metadata: trade.intent.metadata.clone(),
        }
    }
}
