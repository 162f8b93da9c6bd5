//! Order intents — what a strategy asks the simulator to do.
//!
//! Intents are immutable once submitted: the simulator copies one into the
//! trade it creates and never hands it back to the strategy.

use crate::exits::config::{
    BreakevenConfig, CompositeConfig, HybridConfig, ReferenceExitConfig, TimeRule, TrailingConfig,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("{side:?} stop loss {stop} is on the wrong side of entry {entry}")]
    StopOnWrongSide { side: Side, entry: f64, stop: f64 },

    #[error("{side:?} take profit {target} is on the wrong side of entry {entry}")]
    TargetOnWrongSide { side: Side, entry: f64, target: f64 },

    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(f64),

    #[error("non-finite {field} price on intent")]
    NonFinitePrice { field: &'static str },

    #[error("market order for {0:?} submitted before any candle was seen")]
    NoMarketData(String),
}

/// Direction of the trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Long,
    Short,
}

impl Side {
    /// +1 for long, -1 for short.
    pub fn sign(self) -> f64 {
        match self {
            Side::Long => 1.0,
            Side::Short => -1.0,
        }
    }

    /// Signed points earned moving from `entry` to `exit`.
    pub fn points(self, entry: f64, exit: f64) -> f64 {
        (exit - entry) * self.sign()
    }

    /// The more protective of two stop levels: higher for longs, lower for
    /// shorts. This is the ratchet invariant in one expression.
    pub fn tighter_stop(self, a: f64, b: f64) -> f64 {
        match self {
            Side::Long => a.max(b),
            Side::Short => a.min(b),
        }
    }
}

/// How the entry order rests in the market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    /// Rest at `entry_price`, fill on a touch at that price or better.
    Limit,
    /// Breakout order: fill once price trades through `entry_price`.
    Stop,
    /// Fill immediately at the last seen close.
    Market,
}

/// A strategy's request for a simulated trade, with every exit mechanism it
/// wants armed. Produced by a strategy, consumed exactly once by
/// [`crate::sim::TradeSimulator::process_signal`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderIntent {
    pub side: Side,
    pub entry_type: EntryType,
    pub symbol: String,
    /// Requested entry level. For market orders this is advisory only.
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: Option<f64>,
    pub quantity: f64,
    pub trailing: Option<TrailingConfig>,
    pub breakeven: Option<BreakevenConfig>,
    pub composite: Option<CompositeConfig>,
    pub time_ladder: Vec<TimeRule>,
    pub hybrid: Option<HybridConfig>,
    pub reference_exit: Option<ReferenceExitConfig>,
    /// Force exit after this many bars held; 0 disables.
    pub max_hold_bars: usize,
    /// Cancel the entry if unfilled after this many candles; 0 disables.
    pub order_timeout_bars: usize,
    /// Opaque strategy payload, passed through to trade updates untouched.
    pub metadata: Option<serde_json::Value>,
}

impl OrderIntent {
    /// A bare intent with every optional exit mechanism disabled.
    pub fn new(
        side: Side,
        entry_type: EntryType,
        symbol: impl Into<String>,
        entry_price: f64,
        stop_loss: f64,
        quantity: f64,
    ) -> Self {
        Self {
            side,
            entry_type,
            symbol: symbol.into(),
            entry_price,
            stop_loss,
            take_profit: None,
            quantity,
            trailing: None,
            breakeven: None,
            composite: None,
            time_ladder: Vec::new(),
            hybrid: None,
            reference_exit: None,
            max_hold_bars: 0,
            order_timeout_bars: 0,
            metadata: None,
        }
    }

    /// Validate the intent before any trade state is created.
    ///
    /// A rejected intent leaves no partial state behind.
    pub fn validate(&self) -> Result<(), OrderError> {
        if !(self.quantity > 0.0) {
            return Err(OrderError::NonPositiveQuantity(self.quantity));
        }
        if !self.entry_price.is_finite() {
            return Err(OrderError::NonFinitePrice { field: "entry" });
        }
        if !self.stop_loss.is_finite() {
            return Err(OrderError::NonFinitePrice { field: "stop_loss" });
        }
        if let Some(target) = self.take_profit {
            if !target.is_finite() {
                return Err(OrderError::NonFinitePrice { field: "take_profit" });
            }
        }

        // A protective stop must sit on the losing side of entry.
        let stop_ok = match self.side {
            Side::Long => self.stop_loss < self.entry_price,
            Side::Short => self.stop_loss > self.entry_price,
        };
        if !stop_ok {
            return Err(OrderError::StopOnWrongSide {
                side: self.side,
                entry: self.entry_price,
                stop: self.stop_loss,
            });
        }

        if let Some(target) = self.take_profit {
            let target_ok = match self.side {
                Side::Long => target > self.entry_price,
                Side::Short => target < self.entry_price,
            };
            if !target_ok {
                return Err(OrderError::TargetOnWrongSide {
                    side: self.side,
                    entry: self.entry_price,
                    target,
                });
            }
        }

        Ok(())
    }
}
