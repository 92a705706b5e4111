//! Built-in strategy suite used by the comparison driver.

use super::factory::{MaCrossoverParams, MacdParams, RsiThresholdParams, StrategyParams, StrategySpec};

/// The six named configurations compared by default, in report order.
pub fn preset_suite() -> Vec<StrategySpec> {
    vec![
        ma("sma_10_30", 10, 30),
        ma("sma_5_20", 5, 20),
        rsi("rsi_14", 14, 30.0, 70.0),
        rsi("rsi_10_improved", 10, 25.0, 75.0),
        macd("macd_trail", Some(0.02)),
        macd("macd_no_trail", None),
    ]
}

pub fn preset_names() -> Vec<String> {
    preset_suite().into_iter().map(|s| s.name).collect()
}

pub fn preset(name: &str) -> Option<StrategySpec> {
    preset_suite().into_iter().find(|s| s.name == name)
}

fn ma(name: &str, fast_period: usize, slow_period: usize) -> StrategySpec {
    StrategySpec::new(
        name,
        StrategyParams::MaCrossover(MaCrossoverParams {
            fast_period,
            slow_period,
        }),
    )
}

fn rsi(name: &str, period: usize, oversold: f64, overbought: f64) -> StrategySpec {
    StrategySpec::new(
        name,
        StrategyParams::RsiThreshold(RsiThresholdParams {
            period,
            oversold,
            overbought,
        }),
    )
}

fn macd(name: &str, trailing: Option<f64>) -> StrategySpec {
    StrategySpec::new(
        name,
        StrategyParams::MacdCrossover(MacdParams {
            fast: 12,
            slow: 26,
            signal: 9,
            trailing_enabled: trailing.is_some(),
            trailing_fraction: trailing.unwrap_or(0.02),
        }),
    )
}
