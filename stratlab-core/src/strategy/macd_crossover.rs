//! MACD crossover with optional trailing stop.
//!
//! Enter when the MACD line crosses above its signal line while still below
//! zero; exit when it crosses back below. The trailing stop itself lives in
//! the `StrategyMachine`; this type only reports the configured fraction.

use crate::domain::Bar;
use crate::indicators::{crossover, Cross, IndicatorSeries, Macd};

use super::Strategy;

#[derive(Debug, Clone)]
pub struct MacdCrossover {
    name: String,
    macd: Macd,
    macd_series: IndicatorSeries,
    signal_series: IndicatorSeries,
    trailing_fraction: Option<f64>,
}

impl MacdCrossover {
    pub fn new(
        name: impl Into<String>,
        fast: usize,
        slow: usize,
        signal: usize,
        trailing_fraction: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            macd: Macd::new(fast, slow, signal),
            macd_series: IndicatorSeries::new("macd"),
            signal_series: IndicatorSeries::new("macd_signal"),
            trailing_fraction,
        }
    }

    fn cross(&self) -> Cross {
        match self.macd_series.last_index() {
            Some(i) => crossover(self.macd_series.as_slice(), self.signal_series.as_slice(), i),
            None => Cross::None,
        }
    }
}

impl Strategy for MacdCrossover {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup(&self) -> usize {
        self.macd.lookback() + 1
    }

    fn update_indicators(&mut self, bar: &Bar) {
        let point = self.macd.update(bar.close);
        self.macd_series.push(point.map(|p| p.macd));
        self.signal_series.push(point.map(|p| p.signal));
    }

    fn entry_signal(&self) -> bool {
        self.cross() == Cross::Above && self.macd_series.last().is_some_and(|m| m < 0.0)
    }

    fn exit_signal(&self) -> bool {
        self.cross() == Cross::Below
    }

    fn trailing_fraction(&self) -> Option<f64> {
        self.trailing_fraction
    }

    fn indicator_values(&self) -> Vec<(&str, Option<f64>)> {
        vec![
            (self.macd_series.name(), self.macd_series.last()),
            (self.signal_series.name(), self.signal_series.last()),
        ]
    }
}
