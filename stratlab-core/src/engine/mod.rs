//! Simulation engine: the ledger and the bar loop that drives it.
//!
//! Per bar, in order:
//! 1. feed the bar to the strategy's indicators
//! 2. resolve the pending order (fill or reject) at the configured price
//! 3. evaluate the strategy against the post-fill cash/position snapshot
//! 4. mark the ledger to market at the bar's close
//!
//! Open positions are left open at the end of the data; a still-pending
//! order is canceled.

pub mod ledger;
pub mod loop_runner;
pub mod state;

pub use ledger::{Ledger, LedgerError};
pub use loop_runner::{validate_bars, Engine, EngineError};
pub use state::{EngineConfig, EquityPoint, FillPrice, RunOutput};
