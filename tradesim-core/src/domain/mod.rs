//! Domain types: candles, contract specs, order intents, trades, updates.

pub mod candle;
pub mod contract;
pub mod ids;
pub mod intent;
pub mod trade;

pub use candle::Candle;
pub use contract::{ContractError, ContractSpec, ContractSpecRegistry};
pub use ids::TradeId;
pub use intent::{EntryType, OrderError, OrderIntent, Side};
pub use trade::{ExitReason, Trade, TradeState, TradeUpdate, UpdateKind};
