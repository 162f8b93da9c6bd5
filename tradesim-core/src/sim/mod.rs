//! The simulator facade: candles and intents in, settled updates out.
//!
//! [`TradeSimulator`] wires the ledger, the exit engine, and the P&L
//! calculator together and owns the per-symbol rolling candle windows that
//! swing detection reads. Given the same candle stream, the same reference
//! samples, and the same configuration, the update stream is byte-identical
//! across runs.

use crate::config::SimulatorConfig;
use crate::domain::{
    Candle, ContractSpecRegistry, OrderError, OrderIntent, TradeId, TradeUpdate, UpdateKind,
};
use crate::exits::{BarContext, ExitPolicyEngine};
use crate::fingerprint::Fingerprint;
use crate::ledger::PositionLedger;
use crate::pnl::{PnlCalculator, SettleError, SpreadCurve};
use crate::session::SessionError;
use crate::signals::Strategy;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Settle(#[from] SettleError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Result of driving one strategy over one candle stream.
#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub updates: Vec<TradeUpdate>,
    /// Digest of the update stream; equal digests mean equal runs.
    pub fingerprint: String,
}

pub struct TradeSimulator {
    config: SimulatorConfig,
    ledger: PositionLedger,
    engine: ExitPolicyEngine,
    pnl: PnlCalculator,
    windows: HashMap<String, Vec<Candle>>,
    last_candle: HashMap<String, Candle>,
}

impl TradeSimulator {
    pub fn new(
        config: SimulatorConfig,
        specs: ContractSpecRegistry,
        spread: SpreadCurve,
    ) -> Result<Self, SimError> {
        let engine = ExitPolicyEngine::new(&config)?;
        let pnl = PnlCalculator::new(
            specs,
            config.commission_per_round_trip,
            config.slippage_ticks,
            config.price_mode,
            spread,
        );
        Ok(Self {
            config,
            ledger: PositionLedger::new(),
            engine,
            pnl,
            windows: HashMap::new(),
            last_candle: HashMap::new(),
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    /// Submit one intent. Market intents fill immediately at the last seen
    /// close for their symbol.
    pub fn process_signal(&mut self, intent: OrderIntent) -> Result<TradeId, SimError> {
        let last = self.last_candle.get(&intent.symbol);
        let last_close = last.map(|c| c.close);
        let now = last.map(|c| c.timestamp).unwrap_or(self.clock_floor());
        Ok(self.ledger.submit(intent, now, last_close)?)
    }

    /// Advance every trade on this candle's symbol by one bar.
    ///
    /// `reference` is the bar's external reference sample, if the feed has
    /// one. Void or malformed candles are dropped without touching any
    /// trade or window state.
    pub fn update_active_trades(
        &mut self,
        candle: &Candle,
        reference: Option<f64>,
    ) -> Result<Vec<TradeUpdate>, SimError> {
        if candle.is_void() || !candle.is_sane() {
            return Ok(Vec::new());
        }

        let window = self.windows.entry(candle.symbol.clone()).or_default();
        window.push(candle.clone());
        if window.len() > self.config.swing_window_bars {
            window.remove(0);
        }
        self.last_candle
            .insert(candle.symbol.clone(), candle.clone());

        let ctx = BarContext {
            candle,
            reference,
            window: self.windows.get(&candle.symbol).map(Vec::as_slice).unwrap_or(&[]),
        };
        Ok(self.ledger.apply_candle(&ctx, &self.engine, &self.pnl)?)
    }

    /// End the candle stream: cancel resting entries and resolve open
    /// trades per the configured end-of-data policy.
    pub fn finish(&mut self) -> Result<Vec<TradeUpdate>, SimError> {
        Ok(self
            .ledger
            .resolve_end_of_data(&self.last_candle, self.config.end_of_data, &self.pnl)?)
    }

    /// Drop all trade and window state, keeping the configuration. The next
    /// run starts from a clean book with fresh trade ids.
    pub fn reset(&mut self) {
        self.ledger = PositionLedger::new();
        self.windows.clear();
        self.last_candle.clear();
    }

    /// Drive one strategy over one candle stream, start to finish.
    ///
    /// Per candle: open trades advance first, then the strategy sees the
    /// candle and may emit an intent, so a signal can never act on the bar
    /// that produced it. Intents during warmup are discarded.
    pub fn run(
        &mut self,
        strategy: &mut dyn Strategy,
        candles: &[Candle],
    ) -> Result<BacktestReport, SimError> {
        let warmup = strategy.warmup_bars();
        let mut fingerprint = Fingerprint::new();
        let mut all_updates = Vec::new();

        for (i, candle) in candles.iter().enumerate() {
            let updates = self.update_active_trades(candle, None)?;
            for update in &updates {
                fingerprint.record(update);
                if update.kind == UpdateKind::Completed {
                    strategy.on_trade_closed(update);
                }
            }
            all_updates.extend(updates);

            if let Some(intent) = strategy.on_candle(candle) {
                if i >= warmup {
                    self.process_signal(intent)?;
                }
            }
        }

        let tail = self.finish()?;
        for update in &tail {
            fingerprint.record(update);
            if update.kind == UpdateKind::Completed {
                strategy.on_trade_closed(update);
            }
        }
        all_updates.extend(tail);

        Ok(BacktestReport {
            updates: all_updates,
            fingerprint: fingerprint.digest(),
        })
    }

    /// Deterministic submission timestamp for intents that arrive before
    /// any candle; overwritten by the fill candle's timestamp on fill.
    fn clock_floor(&self) -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH
    }
}
