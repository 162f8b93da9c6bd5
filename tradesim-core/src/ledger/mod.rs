//! Position ledger — owns every trade from submission to archive.
//!
//! Trades are evaluated in submission order, one symbol at a time. A fill
//! and an exit never happen on the same candle: a freshly-filled trade sees
//! its first exit evaluation on the next bar, so a bar's range can never be
//! used both to fill an entry and to stop it out.

use crate::config::EndOfDataPolicy;
use crate::domain::{
    Candle, OrderError, OrderIntent, Trade, TradeId, TradeState, TradeUpdate, UpdateKind,
    EntryType, ExitReason,
};
use crate::exits::{BarContext, ExitPolicyEngine};
use crate::pending::PendingOrderTracker;
use crate::pnl::{PnlCalculator, SettleError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct PositionLedger {
    active: Vec<Trade>,
    completed: Vec<Trade>,
    next_id: u64,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &[Trade] {
        &self.active
    }

    pub fn completed(&self) -> &[Trade] {
        &self.completed
    }

    pub fn open_count(&self) -> usize {
        self.active
            .iter()
            .filter(|t| t.state == TradeState::Open)
            .count()
    }

    /// Validate and admit an intent. Market intents fill immediately at the
    /// last seen close for their symbol; limit and stop intents rest.
    ///
    /// Rejection leaves the ledger untouched.
    pub fn submit(
        &mut self,
        intent: OrderIntent,
        now: DateTime<Utc>,
        last_close: Option<f64>,
    ) -> Result<TradeId, OrderError> {
        intent.validate()?;

        let fill_at = match intent.entry_type {
            EntryType::Market => {
                Some(last_close.ok_or_else(|| OrderError::NoMarketData(intent.symbol.clone()))?)
            }
            EntryType::Limit | EntryType::Stop => None,
        };

        self.next_id += 1;
        let id = TradeId(self.next_id);
        let mut trade = Trade::from_intent(id, intent, now);
        if let Some(price) = fill_at {
            trade.fill(price);
        }
        self.active.push(trade);
        Ok(id)
    }

    /// Advance every trade on this candle's symbol by one bar.
    ///
    /// Returns one update per trade whose state changed. Pending entries are
    /// fill-tested first, then aged toward their timeout; open trades run
    /// the exit engine and are settled on close.
    pub fn apply_candle(
        &mut self,
        ctx: &BarContext,
        engine: &ExitPolicyEngine,
        pnl: &PnlCalculator,
    ) -> Result<Vec<TradeUpdate>, SettleError> {
        let mut updates = Vec::new();
        let candle = ctx.candle;

        for trade in &mut self.active {
            if trade.symbol != candle.symbol {
                continue;
            }
            match trade.state {
                TradeState::PendingEntry => {
                    if let Some(fill) = PendingOrderTracker::try_fill(trade, candle) {
                        trade.fill(fill.price);
                        trade.entry_time = candle.timestamp;
                        updates.push(TradeUpdate::snapshot(trade, UpdateKind::Filled));
                        // First exit evaluation happens on the next candle.
                        continue;
                    }
                    trade.bars_pending += 1;
                    if PendingOrderTracker::is_expired(trade) {
                        trade.cancel();
                        updates.push(TradeUpdate::snapshot(trade, UpdateKind::Cancelled));
                    }
                }
                TradeState::Open => {
                    trade.bars_since_entry += 1;
                    if let Some(decision) = engine.evaluate(trade, ctx) {
                        trade.close(decision.price, decision.reason, candle.timestamp);
                        updates.push(settled_update(trade, pnl)?);
                    }
                }
                TradeState::Closed | TradeState::Cancelled => {}
            }
        }

        self.sweep_terminal();
        Ok(updates)
    }

    /// Resolve everything still on the books once the candle stream ends.
    ///
    /// Pending entries are always cancelled. Open trades either force-close
    /// at their symbol's last seen close (reason EndOfData, fully settled)
    /// or are reported open with no P&L, per policy.
    pub fn resolve_end_of_data(
        &mut self,
        last_candles: &HashMap<String, Candle>,
        policy: EndOfDataPolicy,
        pnl: &PnlCalculator,
    ) -> Result<Vec<TradeUpdate>, SettleError> {
        let mut updates = Vec::new();

        for trade in &mut self.active {
            match trade.state {
                TradeState::PendingEntry => {
                    trade.cancel();
                    updates.push(TradeUpdate::snapshot(trade, UpdateKind::Cancelled));
                }
                TradeState::Open => match policy {
                    EndOfDataPolicy::ForceClose => {
                        let last = last_candles.get(&trade.symbol);
                        // An open trade implies at least one candle was seen.
                        let price = last
                            .map(|c| c.close)
                            .or(trade.actual_entry)
                            .unwrap_or(trade.requested_entry);
                        let at = last.map(|c| c.timestamp).unwrap_or(trade.entry_time);
                        trade.close(price, ExitReason::EndOfData, at);
                        updates.push(settled_update(trade, pnl)?);
                    }
                    EndOfDataPolicy::ReportOpen => {
                        updates.push(TradeUpdate::snapshot(trade, UpdateKind::OpenAtEnd));
                    }
                },
                TradeState::Closed | TradeState::Cancelled => {}
            }
        }

        self.sweep_terminal();
        Ok(updates)
    }

    fn sweep_terminal(&mut self) {
        let mut still_active = Vec::with_capacity(self.active.len());
        for trade in self.active.drain(..) {
            if trade.is_terminal() {
                self.completed.push(trade);
            } else {
                still_active.push(trade);
            }
        }
        self.active = still_active;
    }
}

/// Completed-trade update with settlement figures attached. Fill prices are
/// reported in raw contract space.
fn settled_update(trade: &Trade, pnl: &PnlCalculator) -> Result<TradeUpdate, SettleError> {
    let settlement = pnl.settle(trade)?;
    let mut update = TradeUpdate::snapshot(trade, UpdateKind::Completed);
    update.actual_entry = Some(settlement.raw_entry);
    update.actual_exit = Some(settlement.raw_exit);
    update.points_pnl = Some(settlement.points_pnl);
    update.gross_pnl = Some(settlement.gross_pnl);
    update.net_pnl = Some(settlement.net_pnl);
    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PriceMode, SimulatorConfig};
    use crate::domain::{ContractSpecRegistry, Side};
    use crate::pnl::SpreadCurve;
    use chrono::{Duration, TimeZone};

    fn engine() -> ExitPolicyEngine {
        ExitPolicyEngine::new(&SimulatorConfig::default()).unwrap()
    }

    fn calculator() -> PnlCalculator {
        PnlCalculator::new(
            ContractSpecRegistry::cme_index_defaults(),
            5.0,
            0.0,
            PriceMode::Raw,
            SpreadCurve::default(),
        )
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 14, 30, 0).unwrap()
    }

    fn make_candle(i: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            symbol: "NQ".into(),
            timestamp: t0() + Duration::minutes(i),
            open,
            high,
            low,
            close,
            volume: 1000,
        }
    }

    fn ctx(candle: &Candle) -> BarContext<'_> {
        BarContext {
            candle,
            reference: None,
            window: std::slice::from_ref(candle),
        }
    }

    fn long_limit() -> OrderIntent {
        OrderIntent::new(Side::Long, EntryType::Limit, "NQ", 20000.0, 19970.0, 1.0)
    }

    #[test]
    fn invalid_intent_leaves_ledger_untouched() {
        let mut ledger = PositionLedger::new();
        let mut intent = long_limit();
        intent.stop_loss = 20010.0;
        assert!(ledger.submit(intent, t0(), None).is_err());
        assert!(ledger.active().is_empty());
        assert!(ledger.completed().is_empty());
    }

    #[test]
    fn market_intent_fills_at_last_close() {
        let mut ledger = PositionLedger::new();
        let intent = OrderIntent::new(Side::Long, EntryType::Market, "NQ", 20000.0, 19970.0, 1.0);
        let id = ledger.submit(intent, t0(), Some(20003.0)).unwrap();
        let trade = &ledger.active()[0];
        assert_eq!(trade.id, id);
        assert_eq!(trade.state, TradeState::Open);
        assert_eq!(trade.actual_entry, Some(20003.0));
    }

    #[test]
    fn market_intent_without_data_rejected() {
        let mut ledger = PositionLedger::new();
        let intent = OrderIntent::new(Side::Long, EntryType::Market, "NQ", 20000.0, 19970.0, 1.0);
        assert!(matches!(
            ledger.submit(intent, t0(), None),
            Err(OrderError::NoMarketData(_))
        ));
    }

    #[test]
    fn fill_and_exit_never_share_a_candle() {
        let mut ledger = PositionLedger::new();
        ledger.submit(long_limit(), t0(), None).unwrap();
        // Range covers the entry and the stop, but this candle only fills.
        let candle = make_candle(1, 20010.0, 20015.0, 19960.0, 19980.0);
        let updates = ledger
            .apply_candle(&ctx(&candle), &engine(), &calculator())
            .unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].kind, UpdateKind::Filled);
        assert_eq!(ledger.open_count(), 1);
    }

    #[test]
    fn pending_entry_times_out_after_configured_bars() {
        let mut ledger = PositionLedger::new();
        let mut intent = long_limit();
        intent.order_timeout_bars = 3;
        ledger.submit(intent, t0(), None).unwrap();

        let engine = engine();
        let calc = calculator();
        // Three candles that never trade down to the limit.
        for i in 1..=3 {
            let candle = make_candle(i, 20010.0, 20020.0, 20005.0, 20015.0);
            let updates = ledger.apply_candle(&ctx(&candle), &engine, &calc).unwrap();
            if i < 3 {
                assert!(updates.is_empty());
            } else {
                assert_eq!(updates[0].kind, UpdateKind::Cancelled);
            }
        }
        assert!(ledger.active().is_empty());
        assert_eq!(ledger.completed()[0].state, TradeState::Cancelled);
    }

    #[test]
    fn target_exit_settles_and_archives() {
        let mut ledger = PositionLedger::new();
        let mut intent = long_limit();
        intent.take_profit = Some(20025.0);
        ledger.submit(intent, t0(), None).unwrap();

        let engine = engine();
        let calc = calculator();
        let fill_bar = make_candle(1, 20005.0, 20010.0, 20000.0, 20002.0);
        ledger.apply_candle(&ctx(&fill_bar), &engine, &calc).unwrap();
        let exit_bar = make_candle(2, 20010.0, 20030.0, 20008.0, 20025.0);
        let updates = ledger.apply_candle(&ctx(&exit_bar), &engine, &calc).unwrap();

        assert_eq!(updates.len(), 1);
        let update = &updates[0];
        assert_eq!(update.kind, UpdateKind::Completed);
        assert_eq!(update.exit_reason, Some(ExitReason::TakeProfit));
        assert_eq!(update.points_pnl, Some(25.0));
        assert_eq!(update.net_pnl, Some(495.0)); // 25 × $20 − $5
        assert!(ledger.active().is_empty());
        assert_eq!(ledger.completed().len(), 1);
    }

    #[test]
    fn other_symbols_are_untouched() {
        let mut ledger = PositionLedger::new();
        let intent = OrderIntent::new(Side::Long, EntryType::Limit, "ES", 5000.0, 4990.0, 1.0);
        ledger.submit(intent, t0(), None).unwrap();
        let candle = make_candle(1, 20010.0, 20015.0, 19960.0, 19980.0); // NQ
        let updates = ledger
            .apply_candle(&ctx(&candle), &engine(), &calculator())
            .unwrap();
        assert!(updates.is_empty());
        assert_eq!(ledger.active()[0].state, TradeState::PendingEntry);
        assert_eq!(ledger.active()[0].bars_pending, 0);
    }

    #[test]
    fn end_of_data_force_close_settles_open_trades() {
        let mut ledger = PositionLedger::new();
        ledger.submit(long_limit(), t0(), None).unwrap();
        let engine = engine();
        let calc = calculator();
        let fill_bar = make_candle(1, 20005.0, 20010.0, 20000.0, 20002.0);
        ledger.apply_candle(&ctx(&fill_bar), &engine, &calc).unwrap();

        let mut last = HashMap::new();
        last.insert("NQ".to_string(), make_candle(2, 20010.0, 20015.0, 20008.0, 20012.0));
        let updates = ledger
            .resolve_end_of_data(&last, EndOfDataPolicy::ForceClose, &calc)
            .unwrap();

        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].kind, UpdateKind::Completed);
        assert_eq!(updates[0].exit_reason, Some(ExitReason::EndOfData));
        assert_eq!(updates[0].points_pnl, Some(12.0));
        assert!(ledger.active().is_empty());
    }

    #[test]
    fn end_of_data_report_open_leaves_trade_unsettled() {
        let mut ledger = PositionLedger::new();
        ledger.submit(long_limit(), t0(), None).unwrap();
        let engine = engine();
        let calc = calculator();
        let fill_bar = make_candle(1, 20005.0, 20010.0, 20000.0, 20002.0);
        ledger.apply_candle(&ctx(&fill_bar), &engine, &calc).unwrap();

        let updates = ledger
            .resolve_end_of_data(&HashMap::new(), EndOfDataPolicy::ReportOpen, &calc)
            .unwrap();

        assert_eq!(updates[0].kind, UpdateKind::OpenAtEnd);
        assert!(updates[0].net_pnl.is_none());
        assert_eq!(ledger.open_count(), 1);
    }

    #[test]
    fn end_of_data_cancels_resting_entries() {
        let mut ledger = PositionLedger::new();
        ledger.submit(long_limit(), t0(), None).unwrap();
        let updates = ledger
            .resolve_end_of_data(&HashMap::new(), EndOfDataPolicy::ForceClose, &calculator())
            .unwrap();
        assert_eq!(updates[0].kind, UpdateKind::Cancelled);
        assert!(ledger.active().is_empty());
    }
}
