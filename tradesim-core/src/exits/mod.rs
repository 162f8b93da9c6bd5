//! Exit policy engine — the prioritized, composable exit rule set.
//!
//! Each open trade is evaluated once per candle in two phases:
//!
//! 1. **Decision phase**, against the stop/bookkeeping state as of the start
//!    of the bar, in fixed priority (first firing rule wins):
//!    effective stop / target levels (with gap and tie-break handling),
//!    external-reference exit, max-hold timeout, forced session close.
//! 2. **Update phase**, only when no rule fired: fold the bar into the
//!    favorable-excursion bookkeeping, then let every enabled stop mechanism
//!    propose a level. Proposals pass through the ratchet on
//!    [`Trade::propose_stop`], so the effective stop is always the tightest
//!    of whichever mechanisms are enabled, never the loosest.
//!
//! Tightening from bar N therefore arms the stop that bar N+1 is checked
//! against — stops never react to price action that hasn't completed yet.

pub mod breakeven;
pub mod composite;
pub mod config;
pub mod hybrid;
pub mod reference_exit;
pub mod swing;
pub mod time_ladder;
pub mod trailing;

use crate::config::{SimulatorConfig, TieBreak};
use crate::domain::{Candle, ExitReason, Side, Trade, TradeState};
use crate::session::{SessionCalendar, SessionError};
use reference_exit::ReferenceAction;

/// Transient per-bar exit verdict. Never stored on the trade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitDecision {
    pub price: f64,
    pub reason: ExitReason,
}

/// Everything the engine may consult for one candle.
#[derive(Debug, Clone, Copy)]
pub struct BarContext<'a> {
    pub candle: &'a Candle,
    /// External per-bar reference sample (zero-gamma feed etc), if any.
    pub reference: Option<f64>,
    /// Recent candles for this symbol, oldest first, current candle last.
    pub window: &'a [Candle],
}

pub struct ExitPolicyEngine {
    tie_break: TieBreak,
    session: Option<SessionCalendar>,
    allow_overnight_holds: bool,
}

impl ExitPolicyEngine {
    pub fn new(config: &SimulatorConfig) -> Result<Self, SessionError> {
        Ok(Self {
            tie_break: config.tie_break,
            session: config.session.calendar()?,
            allow_overnight_holds: config.session.allow_overnight_holds,
        })
    }

    /// Evaluate one open trade against one candle.
    ///
    /// Returns the exit decision if any rule fired; otherwise advances the
    /// trade's stop/excursion bookkeeping for the next bar and returns None.
    pub fn evaluate(&self, trade: &mut Trade, ctx: &BarContext) -> Option<ExitDecision> {
        debug_assert_eq!(trade.state, TradeState::Open);

        if let Some(decision) = self.check_levels(trade, ctx.candle) {
            return Some(decision);
        }
        if reference_exit::on_bar(trade, ctx.reference) == ReferenceAction::Exit {
            return Some(ExitDecision {
                price: ctx.candle.close,
                reason: ExitReason::ReferenceSignal,
            });
        }
        if let Some(decision) = check_max_hold(trade, ctx.candle) {
            return Some(decision);
        }
        if let Some(decision) = self.check_session_close(ctx.candle) {
            return Some(decision);
        }

        trade.update_excursion(ctx.candle);
        breakeven::apply(trade);
        trailing::apply(trade);
        composite::apply(trade, ctx.window, ctx.candle.close);
        time_ladder::apply(trade);
        hybrid::apply(trade, ctx.window);
        None
    }

    /// Effective stop / target check with gap handling.
    ///
    /// The exit price equals the level exactly unless the bar opened beyond
    /// it, in which case the fill happens at the open. When both levels fall
    /// inside one bar's range the configured tie-break decides; the stop
    /// exit reports the mechanism that owns the current stop.
    fn check_levels(&self, trade: &Trade, candle: &Candle) -> Option<ExitDecision> {
        let stop = trade.current_stop;
        let (stop_hit, target_hit) = match trade.side {
            Side::Long => (
                candle.low <= stop,
                trade.current_target.is_some_and(|t| candle.high >= t),
            ),
            Side::Short => (
                candle.high >= stop,
                trade.current_target.is_some_and(|t| candle.low <= t),
            ),
        };

        let stop_decision = || ExitDecision {
            price: stop_exit_price(trade.side, stop, candle),
            reason: trade.stop_owner,
        };
        let target_decision = || {
            let target = trade.current_target.unwrap_or(stop);
            ExitDecision {
                price: target_exit_price(trade.side, target, candle),
                reason: ExitReason::TakeProfit,
            }
        };

        match (stop_hit, target_hit) {
            (true, true) => Some(match self.tie_break {
                TieBreak::StopFirst => stop_decision(),
                TieBreak::TargetFirst => target_decision(),
            }),
            (true, false) => Some(stop_decision()),
            (false, true) => Some(target_decision()),
            (false, false) => None,
        }
    }

    fn check_session_close(&self, candle: &Candle) -> Option<ExitDecision> {
        let calendar = self.session?;
        if self.allow_overnight_holds {
            return None;
        }
        if calendar.at_or_after_close(candle.timestamp) {
            return Some(ExitDecision {
                price: candle.close,
                reason: ExitReason::SessionClose,
            });
        }
        None
    }
}

fn check_max_hold(trade: &Trade, candle: &Candle) -> Option<ExitDecision> {
    let max = trade.intent.max_hold_bars;
    if max > 0 && trade.bars_since_entry >= max {
        return Some(ExitDecision {
            price: candle.close,
            reason: ExitReason::TimeLimit,
        });
    }
    None
}

/// Fill price for a stop exit: the level, or the open if the bar gapped
/// through it (worse of level/open for the trade).
fn stop_exit_price(side: Side, stop: f64, candle: &Candle) -> f64 {
    match side {
        Side::Long => {
            if candle.open <= stop {
                candle.open
            } else {
                stop
            }
        }
        Side::Short => {
            if candle.open >= stop {
                candle.open
            } else {
                stop
            }
        }
    }
}

/// Fill price for a target exit: the level, or the open if the bar opened
/// already through it.
fn target_exit_price(side: Side, target: f64, candle: &Candle) -> f64 {
    match side {
        Side::Long => {
            if candle.open >= target {
                candle.open
            } else {
                target
            }
        }
        Side::Short => {
            if candle.open <= target {
                candle.open
            } else {
                target
            }
        }
    }
}
