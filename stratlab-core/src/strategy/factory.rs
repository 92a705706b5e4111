//! Strategy parameters and construction.
//!
//! Parameters are plain serde structs, tagged by `kind` so a list of named
//! strategies reads naturally from TOML or JSON. Every constructor validates
//! first; a bad parameter is fatal for that strategy only.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::ma_crossover::MaCrossover;
use super::machine::StrategyMachine;
use super::macd_crossover::MacdCrossover;
use super::rsi_threshold::RsiThreshold;
use super::sizing::Sizing;
use super::Strategy;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FactoryError {
    #[error("invalid parameter for strategy '{strategy}': {reason}")]
    InvalidParameter { strategy: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaCrossoverParams {
    pub fast_period: usize,
    pub slow_period: usize,
}

impl MaCrossoverParams {
    fn validate(&self) -> Result<(), String> {
        if self.fast_period == 0 {
            return Err("fast_period must be > 0".into());
        }
        if self.slow_period <= self.fast_period {
            return Err(format!(
                "slow_period ({}) must be greater than fast_period ({})",
                self.slow_period, self.fast_period
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiThresholdParams {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl RsiThresholdParams {
    fn validate(&self) -> Result<(), String> {
        if self.period == 0 {
            return Err("period must be > 0".into());
        }
        if !(self.oversold > 0.0 && self.oversold < self.overbought && self.overbought < 100.0) {
            return Err(format!(
                "thresholds must satisfy 0 < oversold < overbought < 100, got oversold={} overbought={}",
                self.oversold, self.overbought
            ));
        }
        Ok(())
    }
}

fn default_trailing_fraction() -> f64 {
    0.02
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
    #[serde(default)]
    pub trailing_enabled: bool,
    #[serde(default = "default_trailing_fraction")]
    pub trailing_fraction: f64,
}

impl MacdParams {
    fn validate(&self) -> Result<(), String> {
        if self.fast == 0 || self.signal == 0 {
            return Err("fast and signal periods must be > 0".into());
        }
        if self.slow <= self.fast {
            return Err(format!(
                "slow ({}) must be greater than fast ({})",
                self.slow, self.fast
            ));
        }
        if !(self.trailing_fraction > 0.0 && self.trailing_fraction < 1.0) {
            return Err(format!(
                "trailing_fraction must be in (0, 1), got {}",
                self.trailing_fraction
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyParams {
    MaCrossover(MaCrossoverParams),
    RsiThreshold(RsiThresholdParams),
    MacdCrossover(MacdParams),
}

impl StrategyParams {
    pub fn kind(&self) -> &'static str {
        match self {
            StrategyParams::MaCrossover(_) => "ma_crossover",
            StrategyParams::RsiThreshold(_) => "rsi_threshold",
            StrategyParams::MacdCrossover(_) => "macd_crossover",
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            StrategyParams::MaCrossover(p) => p.validate(),
            StrategyParams::RsiThreshold(p) => p.validate(),
            StrategyParams::MacdCrossover(p) => p.validate(),
        }
    }
}

/// A named, fully parameterized strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySpec {
    pub name: String,
    #[serde(flatten)]
    pub params: StrategyParams,
    #[serde(default)]
    pub sizing: Sizing,
}

impl StrategySpec {
    pub fn new(name: impl Into<String>, params: StrategyParams) -> Self {
        Self {
            name: name.into(),
            params,
            sizing: Sizing::default(),
        }
    }

    pub fn with_sizing(mut self, sizing: Sizing) -> Self {
        self.sizing = sizing;
        self
    }

    pub fn validate(&self) -> Result<(), FactoryError> {
        self.params
            .validate()
            .and_then(|()| self.sizing.validate())
            .map_err(|reason| FactoryError::InvalidParameter {
                strategy: self.name.clone(),
                reason,
            })
    }
}

/// Build the strategy variant described by `spec`.
pub fn build_strategy(spec: &StrategySpec) -> Result<Box<dyn Strategy>, FactoryError> {
    spec.validate()?;
    let name = spec.name.clone();
    let strategy: Box<dyn Strategy> = match &spec.params {
        StrategyParams::MaCrossover(p) => {
            Box::new(MaCrossover::new(name, p.fast_period, p.slow_period))
        }
        StrategyParams::RsiThreshold(p) => {
            Box::new(RsiThreshold::new(name, p.period, p.oversold, p.overbought))
        }
        StrategyParams::MacdCrossover(p) => Box::new(MacdCrossover::new(
            name,
            p.fast,
            p.slow,
            p.signal,
            p.trailing_enabled.then_some(p.trailing_fraction),
        )),
    };
    Ok(strategy)
}

/// Build a fresh state machine around the strategy described by `spec`.
pub fn build_machine(spec: &StrategySpec) -> Result<StrategyMachine, FactoryError> {
    Ok(StrategyMachine::new(build_strategy(spec)?, spec.sizing))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ma(fast: usize, slow: usize) -> StrategySpec {
        StrategySpec::new(
            "ma",
            StrategyParams::MaCrossover(MaCrossoverParams {
                fast_period: fast,
                slow_period: slow,
            }),
        )
    }

    #[test]
    fn slow_must_exceed_fast() {
        assert!(build_strategy(&ma(10, 30)).is_ok());
        let err = build_strategy(&ma(30, 30)).err().unwrap();
        assert!(matches!(err, FactoryError::InvalidParameter { ref strategy, .. } if strategy == "ma"));
        assert!(build_strategy(&ma(0, 5)).is_err());
    }

    #[test]
    fn rsi_threshold_ordering() {
        let spec = |period, oversold, overbought| {
            StrategySpec::new(
                "rsi",
                StrategyParams::RsiThreshold(RsiThresholdParams {
                    period,
                    oversold,
                    overbought,
                }),
            )
        };
        assert!(build_strategy(&spec(14, 30.0, 70.0)).is_ok());
        assert!(build_strategy(&spec(14, 70.0, 30.0)).is_err());
        assert!(build_strategy(&spec(14, 0.0, 70.0)).is_err());
        assert!(build_strategy(&spec(14, 30.0, 100.0)).is_err());
        assert!(build_strategy(&spec(0, 30.0, 70.0)).is_err());
    }

    #[test]
    fn macd_trailing_fraction_range() {
        let spec = |trailing_fraction| {
            StrategySpec::new(
                "macd",
                StrategyParams::MacdCrossover(MacdParams {
                    fast: 12,
                    slow: 26,
                    signal: 9,
                    trailing_enabled: true,
                    trailing_fraction,
                }),
            )
        };
        assert!(build_machine(&spec(0.02)).unwrap().trailing_stop().is_some());
        assert!(build_strategy(&spec(0.0)).is_err());
        assert!(build_strategy(&spec(1.0)).is_err());
    }

    #[test]
    fn macd_without_trailing_has_no_stop() {
        let spec = StrategySpec::new(
            "macd",
            StrategyParams::MacdCrossover(MacdParams {
                fast: 12,
                slow: 26,
                signal: 9,
                trailing_enabled: false,
                trailing_fraction: 0.02,
            }),
        );
        assert!(build_machine(&spec).unwrap().trailing_stop().is_none());
    }

    #[test]
    fn bad_sizing_is_invalid_parameter() {
        let spec = ma(5, 20).with_sizing(Sizing::CashFraction { fraction: 2.0 });
        assert!(matches!(
            build_machine(&spec),
            Err(FactoryError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn spec_json_is_flat_and_tagged() {
        let json = r#"{"name":"fast_ma","kind":"ma_crossover","fast_period":5,"slow_period":20}"#;
        let spec: StrategySpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec, ma(5, 20).renamed("fast_ma"));
        assert_eq!(spec.params.kind(), "ma_crossover");
        assert_eq!(spec.sizing, Sizing::default());
    }

    impl StrategySpec {
        fn renamed(mut self, name: &str) -> Self {
            self.name = name.into();
            self
        }
    }
}
