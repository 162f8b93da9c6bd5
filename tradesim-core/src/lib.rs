//! TradeSim Core — deterministic trade simulation for bar-based backtests.
//!
//! This crate contains the whole simulation engine:
//! - Domain types (candles, intents, trades, contract specs)
//! - Pending-order fill logic with gap handling and entry timeouts
//! - Prioritized, composable exit mechanisms behind one ratcheting stop
//! - P&L settlement with commission, slippage, and continuous-contract
//!   translation
//! - A strategy seam and a single-pass simulator facade
//!
//! Determinism is the contract: same candles, same config, same update
//! stream. [`fingerprint`] turns that into a checkable digest.

pub mod config;
pub mod domain;
pub mod exits;
pub mod fingerprint;
pub mod ledger;
pub mod pending;
pub mod pnl;
pub mod session;
pub mod signals;
pub mod sim;
