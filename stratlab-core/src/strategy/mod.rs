//! Strategies and the FLAT/LONG state machine that drives them.
//!
//! A `Strategy` only owns indicator state and answers two questions about
//! the most recently completed bar: "enter?" and "exit?". The shared
//! `StrategyMachine` applies the contract common to every variant: one order
//! in flight at most, trailing-stop precedence, sizing, and the FLAT/LONG
//! transitions driven by fills.

pub mod factory;
pub mod ma_crossover;
pub mod machine;
pub mod macd_crossover;
pub mod presets;
pub mod rsi_threshold;
pub mod sizing;
pub mod trailing;

pub use factory::{
    build_machine, build_strategy, FactoryError, MaCrossoverParams, MacdParams,
    RsiThresholdParams, StrategyParams, StrategySpec,
};
pub use ma_crossover::MaCrossover;
pub use machine::{AccountSnapshot, OrderIntent, PositionState, SignalReason, StrategyMachine};
pub use macd_crossover::MacdCrossover;
pub use presets::{preset, preset_names, preset_suite};
pub use rsi_threshold::RsiThreshold;
pub use sizing::Sizing;
pub use trailing::TrailingStop;

use crate::domain::Bar;

/// Indicator wiring plus entry/exit rules for one strategy variant.
///
/// Rules are evaluated against values already appended for the current
/// completed bar. An undefined indicator answers `false`.
pub trait Strategy: Send {
    fn name(&self) -> &str;

    /// Bars needed before every indicator this strategy reads is defined.
    fn warmup(&self) -> usize;

    /// Append this bar's indicator values.
    fn update_indicators(&mut self, bar: &Bar);

    fn entry_signal(&self) -> bool;

    fn exit_signal(&self) -> bool;

    /// Trailing-stop fraction, if this strategy manages one.
    fn trailing_fraction(&self) -> Option<f64> {
        None
    }

    /// Latest indicator values, for logging.
    fn indicator_values(&self) -> Vec<(&str, Option<f64>)>;
}
