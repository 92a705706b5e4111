//! TOML backtest configuration.
//!
//! ```toml
//! [backtest]
//! symbol = "600519"
//! data = "data/600519.csv"
//! initial_cash = 100000.0
//! commission_rate = 0.001
//! fill_price = "close"
//!
//! [[strategies]]
//! name = "sma_10_30"
//! kind = "ma_crossover"
//! fast_period = 10
//! slow_period = 30
//! ```
//!
//! Omitting `[[strategies]]` selects the built-in preset suite.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stratlab_core::engine::{EngineConfig, FillPrice};
use stratlab_core::strategy::{preset_suite, StrategySpec};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

fn default_symbol() -> String {
    "DATA".into()
}

fn default_initial_cash() -> f64 {
    EngineConfig::default().initial_cash
}

fn default_commission_rate() -> f64 {
    EngineConfig::default().commission_rate
}

/// `[backtest]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestSection {
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// CSV file with the bars; the CLI can override it.
    #[serde(default)]
    pub data: Option<PathBuf>,
    #[serde(default = "default_initial_cash")]
    pub initial_cash: f64,
    #[serde(default = "default_commission_rate")]
    pub commission_rate: f64,
    #[serde(default)]
    pub fill_price: FillPrice,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            symbol: default_symbol(),
            data: None,
            initial_cash: default_initial_cash(),
            commission_rate: default_commission_rate(),
            fill_price: FillPrice::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default)]
    pub backtest: BacktestSection,
    #[serde(default = "preset_suite")]
    pub strategies: Vec<StrategySpec>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            backtest: BacktestSection::default(),
            strategies: preset_suite(),
        }
    }
}

impl BacktestConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: BacktestConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            initial_cash: self.backtest.initial_cash,
            commission_rate: self.backtest.commission_rate,
            fill_price: self.backtest.fill_price,
        }
    }

    /// Look up a configured strategy by name.
    pub fn strategy(&self, name: &str) -> Option<&StrategySpec> {
        self.strategies.iter().find(|s| s.name == name)
    }

    /// Reject empty or duplicate strategy lists and bad engine settings.
    ///
    /// Strategy parameters are checked when each strategy is built, so one
    /// out-of-range entry only fails that strategy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strategies.is_empty() {
            return Err(ConfigError::Invalid("no strategies configured".into()));
        }
        let mut seen = HashSet::new();
        for spec in &self.strategies {
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate strategy name '{}'",
                    spec.name
                )));
            }
        }
        if !(self.backtest.initial_cash > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "initial_cash must be positive, got {}",
                self.backtest.initial_cash
            )));
        }
        if !(self.backtest.commission_rate >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "commission_rate must be non-negative, got {}",
                self.backtest.commission_rate
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratlab_core::strategy::{Sizing, StrategyParams};

    #[test]
    fn empty_config_uses_defaults_and_presets() {
        let cfg = BacktestConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.backtest.initial_cash, 100_000.0);
        assert_eq!(cfg.backtest.commission_rate, 0.001);
        assert_eq!(cfg.strategies.len(), 6);
        assert_eq!(cfg.engine_config(), EngineConfig::default());
    }

    #[test]
    fn parses_all_strategy_kinds() {
        let text = r#"
            [backtest]
            symbol = "600519"
            initial_cash = 50000.0
            fill_price = "open"

            [[strategies]]
            name = "ma"
            kind = "ma_crossover"
            fast_period = 5
            slow_period = 20
            sizing = { type = "fixed_units", units = 1.0 }

            [[strategies]]
            name = "rsi"
            kind = "rsi_threshold"
            period = 14
            oversold = 30.0
            overbought = 70.0

            [[strategies]]
            name = "macd"
            kind = "macd_crossover"
            fast = 12
            slow = 26
            signal = 9
            trailing_enabled = true
        "#;
        let cfg = BacktestConfig::from_toml_str(text).unwrap();
        assert_eq!(cfg.backtest.symbol, "600519");
        assert_eq!(cfg.engine_config().fill_price, FillPrice::Open);
        assert_eq!(cfg.strategies.len(), 3);
        assert_eq!(cfg.strategy("ma").unwrap().sizing, Sizing::FixedUnits { units: 1.0 });
        assert_eq!(cfg.strategy("rsi").unwrap().sizing, Sizing::default());
        match &cfg.strategy("macd").unwrap().params {
            StrategyParams::MacdCrossover(p) => {
                assert!(p.trailing_enabled);
                assert_eq!(p.trailing_fraction, 0.02);
            }
            other => panic!("unexpected params {other:?}"),
        }
    }

    #[test]
    fn bad_strategy_only_fails_itself() {
        let text = r#"
            [[strategies]]
            name = "good"
            kind = "ma_crossover"
            fast_period = 5
            slow_period = 20

            [[strategies]]
            name = "bad"
            kind = "ma_crossover"
            fast_period = 30
            slow_period = 10
        "#;
        let cfg = BacktestConfig::from_toml_str(text).unwrap();
        assert_eq!(cfg.strategies.len(), 2);

        let data = crate::data_loader::load_synthetic(
            "CFG",
            chrono::NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(),
            120,
        );
        let report =
            crate::comparison::run_comparison(&data, &cfg.strategies, &cfg.engine_config(), false);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].strategy.name, "good");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].strategy, "bad");
        assert!(report.failures[0].error.contains("slow_period"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let text = r#"
            [[strategies]]
            name = "x"
            kind = "rsi_threshold"
            period = 14
            oversold = 30.0
            overbought = 70.0

            [[strategies]]
            name = "x"
            kind = "rsi_threshold"
            period = 10
            oversold = 25.0
            overbought = 75.0
        "#;
        assert!(matches!(
            BacktestConfig::from_toml_str(text),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        let text = r#"
            [[strategies]]
            name = "x"
            kind = "bollinger"
        "#;
        assert!(matches!(
            BacktestConfig::from_toml_str(text),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn toml_round_trip_of_defaults() {
        let cfg = BacktestConfig::default();
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(BacktestConfig::from_toml_str(&text).unwrap(), cfg);
    }
}
