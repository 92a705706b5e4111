//! RSI threshold: enter when RSI drops below the oversold level, exit when
//! it rises above the overbought level.

use crate::domain::Bar;
use crate::indicators::{Indicator, IndicatorSeries, Rsi};

use super::Strategy;

#[derive(Debug, Clone)]
pub struct RsiThreshold {
    name: String,
    rsi: Rsi,
    series: IndicatorSeries,
    oversold: f64,
    overbought: f64,
}

impl RsiThreshold {
    pub fn new(name: impl Into<String>, period: usize, oversold: f64, overbought: f64) -> Self {
        let rsi = Rsi::new(period);
        Self {
            name: name.into(),
            series: IndicatorSeries::new(rsi.name()),
            rsi,
            oversold,
            overbought,
        }
    }

    pub fn series(&self) -> &IndicatorSeries {
        &self.series
    }
}

impl Strategy for RsiThreshold {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup(&self) -> usize {
        self.rsi.lookback()
    }

    fn update_indicators(&mut self, bar: &Bar) {
        self.series.push(self.rsi.update(bar.close));
    }

    fn entry_signal(&self) -> bool {
        self.series.last().is_some_and(|v| v < self.oversold)
    }

    fn exit_signal(&self) -> bool {
        self.series.last().is_some_and(|v| v > self.overbought)
    }

    fn indicator_values(&self) -> Vec<(&str, Option<f64>)> {
        vec![(self.series.name(), self.series.last())]
    }
}
