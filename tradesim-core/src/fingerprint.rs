//! Determinism fingerprint over a backtest's update stream.
//!
//! Two runs over the same candles with the same configuration must produce
//! byte-identical update streams. Hashing the canonical JSON of every update
//! in emission order turns that requirement into a single comparable value,
//! cheap to store next to a result set and to diff across code changes.

use crate::domain::TradeUpdate;
use serde::Serialize;

/// Incremental hasher over trade updates.
#[derive(Default)]
pub struct Fingerprint {
    hasher: blake3::Hasher,
    count: u64,
}

impl Fingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one update into the digest. Serialization of a domain type is
    /// infallible; field order is fixed by the struct definition.
    pub fn record(&mut self, update: &TradeUpdate) {
        self.record_value(update);
    }

    fn record_value<T: Serialize>(&mut self, value: &T) {
        // to_vec on a non-map struct cannot fail.
        if let Ok(bytes) = serde_json::to_vec(value) {
            self.hasher.update(&bytes);
            self.count += 1;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Hex digest of everything recorded so far.
    pub fn digest(&self) -> String {
        self.hasher.finalize().to_hex().to_string()
    }
}

/// One-shot fingerprint of a full update stream.
pub fn of_updates(updates: &[TradeUpdate]) -> String {
    let mut fp = Fingerprint::new();
    for update in updates {
        fp.record(update);
    }
    fp.digest()
}
