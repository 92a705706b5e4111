//! Moving average crossover: enter on a golden cross of fast over slow SMA,
//! exit on the death cross.

use crate::domain::Bar;
use crate::indicators::{crossover, Cross, Indicator, IndicatorSeries, Sma};

use super::Strategy;

#[derive(Debug, Clone)]
pub struct MaCrossover {
    name: String,
    fast: Sma,
    slow: Sma,
    fast_series: IndicatorSeries,
    slow_series: IndicatorSeries,
}

impl MaCrossover {
    /// Callers validate `fast_period < slow_period` (see `MaCrossoverParams`).
    pub fn new(name: impl Into<String>, fast_period: usize, slow_period: usize) -> Self {
        let fast = Sma::new(fast_period);
        let slow = Sma::new(slow_period);
        Self {
            name: name.into(),
            fast_series: IndicatorSeries::new(fast.name()),
            slow_series: IndicatorSeries::new(slow.name()),
            fast,
            slow,
        }
    }

    fn cross(&self) -> Cross {
        match self.fast_series.last_index() {
            Some(i) => crossover(self.fast_series.as_slice(), self.slow_series.as_slice(), i),
            None => Cross::None,
        }
    }

    pub fn fast_series(&self) -> &IndicatorSeries {
        &self.fast_series
    }

    pub fn slow_series(&self) -> &IndicatorSeries {
        &self.slow_series
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup(&self) -> usize {
        // one extra bar so the slow average has a previous value to cross from
        self.slow.lookback() + 1
    }

    fn update_indicators(&mut self, bar: &Bar) {
        self.fast_series.push(self.fast.update(bar.close));
        self.slow_series.push(self.slow.update(bar.close));
    }

    fn entry_signal(&self) -> bool {
        self.cross() == Cross::Above
    }

    fn exit_signal(&self) -> bool {
        self.cross() == Cross::Below
    }

    fn indicator_values(&self) -> Vec<(&str, Option<f64>)> {
        vec![
            (self.fast_series.name(), self.fast_series.last()),
            (self.slow_series.name(), self.slow_series.last()),
        ]
    }
}
