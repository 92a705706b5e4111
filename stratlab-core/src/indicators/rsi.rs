//! Relative Strength Index (RSI).
//!
//! Wilder smoothing: avg = (avg * (period - 1) + current) / period, seeded
//! with the simple average of the first `period` gains and losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period (one close is consumed to form the first change).
//! Edge case: avg_loss == 0 → RSI = 100, including a perfectly flat series.

use super::{replay, Indicator};

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
    prev_close: Option<f64>,
    changes_seen: usize,
    gain_sum: f64,
    loss_sum: f64,
    averages: Option<(f64, f64)>,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
            prev_close: None,
            changes_seen: 0,
            gain_sum: 0.0,
            loss_sum: 0.0,
            averages: None,
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn update(&mut self, close: f64) -> Option<f64> {
        let Some(prev) = self.prev_close.replace(close) else {
            return None;
        };
        let change = close - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        let p = self.period as f64;

        match self.averages {
            Some((avg_gain, avg_loss)) => {
                let avg_gain = (avg_gain * (p - 1.0) + gain) / p;
                let avg_loss = (avg_loss * (p - 1.0) + loss) / p;
                self.averages = Some((avg_gain, avg_loss));
            }
            None => {
                self.changes_seen += 1;
                self.gain_sum += gain;
                self.loss_sum += loss;
                if self.changes_seen == self.period {
                    self.averages = Some((self.gain_sum / p, self.loss_sum / p));
                }
            }
        }

        self.averages
            .map(|(avg_gain, avg_loss)| rsi_from_averages(avg_gain, avg_loss))
    }

    fn reset(&mut self) {
        self.prev_close = None;
        self.changes_seen = 0;
        self.gain_sum = 0.0;
        self.loss_sum = 0.0;
        self.averages = None;
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// Wilder RSI over a slice of closes.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }
    replay(Rsi::new(period), closes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn rsi_all_gains() {
        let result = rsi(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0], 3);
        assert_approx(result[3].unwrap(), 100.0, 1e-9);
    }

    #[test]
    fn rsi_all_losses() {
        let result = rsi(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0], 3);
        assert_approx(result[3].unwrap(), 0.0, 1e-9);
    }

    #[test]
    fn rsi_flat_series_is_100() {
        let result = rsi(&[10.0; 6], 3);
        assert_eq!(result[3], Some(100.0));
        assert_eq!(result[5], Some(100.0));
    }

    #[test]
    fn rsi_seed_and_wilder_step() {
        // Changes: +0.34, -0.25, -0.48, +0.72
        // Seed (period 3): avg_gain = 0.34/3, avg_loss = 0.73/3
        // Next: avg_gain = (0.34/3*2 + 0.72)/3, avg_loss = (0.73/3*2)/3
        let result = rsi(&[44.0, 44.34, 44.09, 43.61, 44.33], 3);
        assert!(result[..3].iter().all(|v| v.is_none()));

        let seed = 100.0 - 100.0 / (1.0 + 0.34 / 0.73);
        assert_approx(result[3].unwrap(), seed, 1e-9);

        let g = (0.34 / 3.0 * 2.0 + 0.72) / 3.0;
        let l = (0.73 / 3.0 * 2.0) / 3.0;
        assert_approx(result[4].unwrap(), 100.0 - 100.0 / (1.0 + g / l), 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let result = rsi(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0], 3);
        for (i, v) in result.iter().enumerate() {
            if let Some(v) = v {
                assert!((0.0..=100.0).contains(v), "RSI out of bounds at bar {i}: {v}");
            }
        }
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 14);
    }
}
