//! Per-trade exit mechanism parameters, carried on the order intent.
//!
//! All thresholds and offsets are in points of the traded contract, in the
//! same price space as the intent's entry/stop/target levels.

use serde::{Deserialize, Serialize};

/// Simple trailing stop: arm once MFE reaches `trigger`, then trail the
/// extreme favorable price by `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailingConfig {
    pub trigger: f64,
    pub offset: f64,
}

/// One-shot breakeven ratchet: once MFE reaches `trigger`, move the stop to
/// entry plus `offset` (in the trade's favor) exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakevenConfig {
    pub trigger: f64,
    pub offset: f64,
}

/// Composite multi-phase trailing ladder, keyed on MFE thresholds.
///
/// Phases are monotonic: the phase index never decreases within a trade.
///
/// - Phase 1 (optional): once price clears `entry_zone` points beyond entry,
///   ratchet to breakeven.
/// - Phase 2: once MFE >= `structural_threshold`, trail behind the most
///   recent confirmed swing low/high (from `swing_lookback` bars each side,
///   plus `swing_buffer`), only when swing depth >= `min_swing_size`.
/// - Phase 3: once MFE >= `aggressive_threshold`, trail the extreme by an
///   offset that shrinks as MFE grows beyond the threshold.
/// - Phase 4: once the remaining distance to the original target is within
///   `proximity_pct` of the original target distance, trail very tight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeConfig {
    pub activation_threshold: f64,
    /// Width of the entry zone in points; `None` skips Phase 1.
    pub entry_zone: Option<f64>,
    pub structural_threshold: f64,
    pub swing_lookback: usize,
    pub swing_buffer: f64,
    pub min_swing_size: f64,
    pub aggressive_threshold: f64,
    /// Base trail distance for Phase 3 (shrinks with MFE past the threshold).
    pub aggressive_offset: f64,
    /// Fraction of the original target distance, e.g. 0.25.
    pub proximity_pct: f64,
    /// Trail distance while in Phase 4.
    pub proximity_offset: f64,
}

/// Action taken by a time-ladder rule once its conditions hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LadderAction {
    /// Ratchet the stop to the entry price.
    Breakeven,
    /// Ratchet the stop to the extreme favorable price minus this distance.
    TrailBy(f64),
}

/// One rung of the time-based trailing ladder.
///
/// Rules are scanned in declared order each candle and the LAST rule whose
/// `(bars_since_entry >= after_bars) && (MFE >= if_mfe)` holds wins, so later
/// (more aggressive) rules override earlier matches on the same bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRule {
    pub after_bars: usize,
    pub if_mfe: f64,
    pub action: LadderAction,
}

/// Hybrid structural trailing: below `structure_threshold` MFE the trade
/// runs under its original fixed stop only; at/above it, the trade switches
/// permanently to swing-based trailing with these parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HybridConfig {
    pub structure_threshold: f64,
    pub swing_lookback: usize,
    pub swing_buffer: f64,
    pub min_swing_size: f64,
}

/// External-reference early exit (e.g. a zero-gamma or volatility feed).
///
/// Counts consecutive adverse moves of the per-bar reference value. At
/// `breakeven_threshold` consecutive adverse moves the stop ratchets to
/// entry; at `exit_threshold` the trade exits at market. The counter resets
/// to zero only on a full non-adverse bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceExitConfig {
    pub breakeven_threshold: u32,
    pub exit_threshold: u32,
}
