//! Trade settlement: points → dollars, costs, and continuous-contract
//! translation.
//!
//! Points P&L is computed in the price space the simulator ran in. When
//! that space is a back-adjusted continuous series, fills are additionally
//! reported in raw front-month space using the calendar-spread sample
//! recorded nearest the trade's entry timestamp. One offset per trade,
//! applied to both legs, so a contract roll between entry and exit never
//! produces a P&L discontinuity.

use crate::config::PriceMode;
use crate::domain::{ContractError, ContractSpecRegistry, Trade, TradeId, TradeState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettleError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("trade {0} is not closed and cannot be settled")]
    NotClosed(TradeId),
}

/// Settled economics of one completed round trip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub points_pnl: f64,
    pub gross_pnl: f64,
    pub net_pnl: f64,
    /// Entry/exit translated to raw front-month space (identical to the
    /// recorded fills in raw mode).
    pub raw_entry: f64,
    pub raw_exit: f64,
}

/// Calendar-spread differential samples: continuous price minus raw
/// front-month price, keyed by timestamp, sorted ascending.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpreadCurve {
    samples: Vec<(DateTime<Utc>, f64)>,
}

impl SpreadCurve {
    pub fn new(mut samples: Vec<(DateTime<Utc>, f64)>) -> Self {
        samples.sort_by_key(|(ts, _)| *ts);
        Self { samples }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Spread recorded nearest the given instant, 0 when no samples exist.
    pub fn nearest(&self, ts: DateTime<Utc>) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let idx = self.samples.partition_point(|(t, _)| *t <= ts);
        let after = self.samples.get(idx);
        let before = idx.checked_sub(1).and_then(|i| self.samples.get(i));
        match (before, after) {
            (Some(&(tb, vb)), Some(&(ta, va))) => {
                if ts - tb <= ta - ts {
                    vb
                } else {
                    va
                }
            }
            (Some(&(_, vb)), None) => vb,
            (None, Some(&(_, va))) => va,
            (None, None) => 0.0,
        }
    }
}

/// Converts completed trades into settled P&L.
pub struct PnlCalculator {
    specs: ContractSpecRegistry,
    commission_per_round_trip: f64,
    slippage_ticks: f64,
    price_mode: PriceMode,
    spread: SpreadCurve,
}

impl PnlCalculator {
    pub fn new(
        specs: ContractSpecRegistry,
        commission_per_round_trip: f64,
        slippage_ticks: f64,
        price_mode: PriceMode,
        spread: SpreadCurve,
    ) -> Self {
        Self {
            specs,
            commission_per_round_trip,
            slippage_ticks,
            price_mode,
            spread,
        }
    }

    pub fn specs(&self) -> &ContractSpecRegistry {
        &self.specs
    }

    /// Settle a closed trade. Commission is charged exactly once per round
    /// trip; slippage is `slippage_ticks × tick_value × quantity`.
    pub fn settle(&self, trade: &Trade) -> Result<Settlement, SettleError> {
        if trade.state != TradeState::Closed {
            return Err(SettleError::NotClosed(trade.id));
        }
        // Closed implies both fills are present.
        let entry = trade.actual_entry.unwrap_or(trade.requested_entry);
        let exit = trade.actual_exit.unwrap_or(entry);
        let spec = self.specs.get(&trade.symbol)?;

        let points_pnl = trade.side.points(entry, exit);
        let gross_pnl = points_pnl * spec.point_value * trade.quantity;
        let slippage_cost = self.slippage_ticks * spec.tick_value * trade.quantity;
        let net_pnl = gross_pnl - self.commission_per_round_trip - slippage_cost;

        // Both legs share the spread recorded nearest entry, so the
        // translation is points-invariant.
        let offset = match self.price_mode {
            PriceMode::Raw => 0.0,
            PriceMode::ContinuousAdjusted => self.spread.nearest(trade.entry_time),
        };

        Ok(Settlement {
            points_pnl,
            gross_pnl,
            net_pnl,
            raw_entry: entry - offset,
            raw_exit: exit - offset,
        })
    }
}
