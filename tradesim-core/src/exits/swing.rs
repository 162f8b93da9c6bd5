//! Confirmed swing point detection over a rolling candle window.
//!
//! A swing low at index `i` is a low strictly below the lows of `lookback`
//! bars on each side; it is only *confirmed* once those right-hand bars have
//! printed, so structural trailing never reacts to an unconfirmed pivot.

use crate::domain::Candle;

/// A confirmed swing pivot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swing {
    /// Pivot price: the low for a swing low, the high for a swing high.
    pub price: f64,
    /// Pivot depth: distance from the pivot to the opposite extreme of the
    /// surrounding `lookback` bars. Shallow pivots are noise and are
    /// filtered by `min_swing_size` at the call site.
    pub depth: f64,
}

/// Most recent confirmed swing low in `window` (oldest candle first).
pub fn latest_swing_low(window: &[Candle], lookback: usize) -> Option<Swing> {
    if lookback == 0 || window.len() < 2 * lookback + 1 {
        return None;
    }
    // Newest confirmable pivot first.
    for i in (lookback..window.len() - lookback).rev() {
        let pivot = window[i].low;
        let left = &window[i - lookback..i];
        let right = &window[i + 1..=i + lookback];
        let is_pivot = left.iter().all(|c| c.low > pivot) && right.iter().all(|c| c.low > pivot);
        if is_pivot {
            let surrounding_high = window[i - lookback..=i + lookback]
                .iter()
                .map(|c| c.high)
                .fold(f64::MIN, f64::max);
            return Some(Swing {
                price: pivot,
                depth: surrounding_high - pivot,
            });
        }
    }
    None
}

/// Most recent confirmed swing high in `window` (oldest candle first).
pub fn latest_swing_high(window: &[Candle], lookback: usize) -> Option<Swing> {
    if lookback == 0 || window.len() < 2 * lookback + 1 {
        return None;
    }
    for i in (lookback..window.len() - lookback).rev() {
        let pivot = window[i].high;
        let left = &window[i - lookback..i];
        let right = &window[i + 1..=i + lookback];
        let is_pivot = left.iter().all(|c| c.high < pivot) && right.iter().all(|c| c.high < pivot);
        if is_pivot {
            let surrounding_low = window[i - lookback..=i + lookback]
                .iter()
                .map(|c| c.low)
                .fold(f64::MAX, f64::min);
            return Some(Swing {
                price: pivot,
                depth: pivot - surrounding_low,
            });
        }
    }
    None
}

/// Stop level trailed behind the latest confirmed structural pivot: below
/// the swing low minus `buffer` for longs, above the swing high plus
/// `buffer` for shorts. Pivots shallower than `min_swing_size` are ignored.
pub fn structural_stop(
    side: crate::domain::Side,
    window: &[Candle],
    lookback: usize,
    buffer: f64,
    min_swing_size: f64,
) -> Option<f64> {
    match side {
        crate::domain::Side::Long => latest_swing_low(window, lookback)
            .filter(|s| s.depth >= min_swing_size)
            .map(|s| s.price - buffer),
        crate::domain::Side::Short => latest_swing_high(window, lookback)
            .filter(|s| s.depth >= min_swing_size)
            .map(|s| s.price + buffer),
    }
}
