use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade ID, assigned sequentially by the ledger in submission order.
///
/// Sequential assignment (rather than random UUIDs) keeps replays of the
/// same intent/candle sequence byte-identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TradeId(pub u64);

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TradeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
