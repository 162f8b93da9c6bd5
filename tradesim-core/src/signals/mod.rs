//! Strategy seam: candles in, order intents out.
//!
//! The simulator drives a [`Strategy`] one candle at a time and feeds any
//! intent it returns straight into the ledger. Strategies never see or
//! mutate trade state; completed trades come back through
//! [`Strategy::on_trade_closed`] as settled updates only.

use crate::domain::{Candle, OrderIntent, TradeUpdate};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("no strategy registered under '{0}'")]
    Unknown(String),

    #[error("strategy '{0}' is already registered")]
    Duplicate(String),
}

pub trait Strategy: Send {
    /// Stable identifier, used as the registry key.
    fn name(&self) -> &str;

    /// Candles to consume before the first intent may be emitted. The
    /// simulator suppresses intents during warmup.
    fn warmup_bars(&self) -> usize {
        0
    }

    /// One candle in, at most one intent out.
    fn on_candle(&mut self, candle: &Candle) -> Option<OrderIntent>;

    /// Settled result of a trade this strategy opened.
    fn on_trade_closed(&mut self, _update: &TradeUpdate) {}
}

type StrategyFactory = Box<dyn Fn() -> Box<dyn Strategy> + Send>;

/// Name-keyed factory table for strategies, so runners can instantiate
/// fresh strategy state per backtest from a config string.
#[derive(Default)]
pub struct StrategyRegistry {
    factories: HashMap<String, StrategyFactory>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F, S>(&mut self, name: &str, factory: F) -> Result<(), StrategyError>
    where
        F: Fn() -> S + Send + 'static,
        S: Strategy + 'static,
    {
        if self.factories.contains_key(name) {
            return Err(StrategyError::Duplicate(name.to_string()));
        }
        self.factories
            .insert(name.to_string(), Box::new(move || Box::new(factory())));
        Ok(())
    }

    pub fn build(&self, name: &str) -> Result<Box<dyn Strategy>, StrategyError> {
        self.factories
            .get(name)
            .map(|f| f())
            .ok_or_else(|| StrategyError::Unknown(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}
