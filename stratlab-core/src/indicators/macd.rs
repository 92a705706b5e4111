//! Moving Average Convergence Divergence (MACD).
//!
//! macd_line = EMA(fast) - EMA(slow); signal_line = EMA(macd_line, signal).
//! Both lines are reported only once the signal EMA is seeded.
//! Lookback: (slow - 1) + (signal - 1).

use serde::{Deserialize, Serialize};

use super::ema::Ema;
use super::Indicator;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdPoint {
    pub macd: f64,
    pub signal: f64,
}

impl MacdPoint {
    pub fn histogram(&self) -> f64 {
        self.macd - self.signal
    }
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
    slow_period: usize,
    signal_period: usize,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(
            fast >= 1 && slow > fast && signal >= 1,
            "MACD requires 1 <= fast < slow and signal >= 1"
        );
        Self {
            fast: Ema::new(fast),
            slow: Ema::new(slow),
            signal: Ema::new(signal),
            slow_period: slow,
            signal_period: signal,
        }
    }

    pub fn lookback(&self) -> usize {
        (self.slow_period - 1) + (self.signal_period - 1)
    }

    pub fn update(&mut self, close: f64) -> Option<MacdPoint> {
        let fast = self.fast.update(close);
        let slow = self.slow.update(close);
        let (fast, slow) = (fast?, slow?);
        let macd = fast - slow;
        let signal = self.signal.update(macd)?;
        Some(MacdPoint { macd, signal })
    }

    pub fn reset(&mut self) {
        self.fast.reset();
        self.slow.reset();
        self.signal.reset();
    }
}

/// MACD over a slice of closes, split into (macd_line, signal_line).
pub fn macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    if fast == 0 || slow <= fast || signal == 0 {
        return (vec![None; closes.len()], vec![None; closes.len()]);
    }
    let mut m = Macd::new(fast, slow, signal);
    closes
        .iter()
        .map(|&c| {
            let point = m.update(c);
            (point.map(|p| p.macd), point.map(|p| p.signal))
        })
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, ema};

    #[test]
    fn macd_first_defined_at_lookback() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let (line, signal) = macd(&closes, 3, 6, 4);
        let lookback = Macd::new(3, 6, 4).lookback();
        assert_eq!(lookback, 8);
        assert!(line[..lookback].iter().all(|v| v.is_none()));
        assert!(signal[..lookback].iter().all(|v| v.is_none()));
        assert!(line[lookback].is_some());
        assert!(signal[lookback].is_some());
    }

    #[test]
    fn macd_line_matches_ema_difference() {
        let closes: Vec<f64> = (0..30).map(|i| 50.0 + i as f64 * 0.5 + (i % 3) as f64).collect();
        let fast = ema(&closes, 4);
        let slow = ema(&closes, 9);
        let (line, _) = macd(&closes, 4, 9, 3);
        for i in 0..closes.len() {
            if let Some(v) = line[i] {
                assert_approx(v, fast[i].unwrap() - slow[i].unwrap(), 1e-9);
            }
        }
    }

    #[test]
    fn constant_series_has_zero_lines() {
        let (line, signal) = macd(&[20.0; 20], 2, 5, 3);
        assert_eq!(line[19], Some(0.0));
        assert_eq!(signal[19], Some(0.0));
    }

    #[test]
    fn invalid_periods_are_undefined() {
        let (line, signal) = macd(&[1.0, 2.0, 3.0], 5, 5, 1);
        assert!(line.iter().chain(signal.iter()).all(|v| v.is_none()));
    }

    #[test]
    fn histogram_is_difference() {
        let p = MacdPoint { macd: 1.5, signal: 0.5 };
        assert_eq!(p.histogram(), 1.0);
    }

    #[test]
    #[should_panic(expected = "MACD requires")]
    fn slow_not_above_fast_panics() {
        let _ = Macd::new(26, 12, 9);
    }
}
