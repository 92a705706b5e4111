//! Streaming indicators.
//!
//! Every indicator keeps O(1) running state and is fed one close per bar.
//! Values are undefined (`None`) until the indicator has seen enough history,
//! and an undefined value never produces a signal.
//!
//! The batch helpers (`sma`, `ema`, `rsi`, `macd`) replay a slice of closes
//! through the same streaming state, so batch and streaming results agree.

pub mod crossover;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod series;
pub mod sma;

pub use crossover::{crossover, Cross};
pub use ema::{ema, Ema};
pub use macd::{macd, Macd, MacdPoint};
pub use rsi::{rsi, Rsi};
pub use series::IndicatorSeries;
pub use sma::{sma, Sma};

/// A single-output indicator updated one close at a time.
pub trait Indicator: Send + Sync {
    /// Stable name such as `sma_10`, used as the series key.
    fn name(&self) -> &str;

    /// Number of bars before the first defined value.
    fn lookback(&self) -> usize;

    /// Feed the next close and return the value for that bar.
    fn update(&mut self, close: f64) -> Option<f64>;

    /// Forget all history.
    fn reset(&mut self);
}

/// Replay `closes` through a fresh copy of `indicator`.
pub(crate) fn replay<I: Indicator>(mut indicator: I, closes: &[f64]) -> Vec<Option<f64>> {
    closes.iter().map(|&c| indicator.update(c)).collect()
}

/// Create bars from close prices for testing.
///
/// open = prev close (or close for the first bar), high/low = max/min ± 1,
/// one bar per day from 2024-01-02.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: (open.min(close) - 1.0).max(0.01),
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
