//! Strategy comparison: the same bars through several named strategies.
//!
//! A failed strategy (bad parameters, malformed bars) is logged and recorded
//! as a `StrategyFailure`; the rest of the batch still runs. Result order
//! always follows the input order, parallel or not.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use stratlab_core::engine::EngineConfig;
use stratlab_core::strategy::StrategySpec;

use crate::data_loader::LoadedData;
use crate::runner::{run_backtest, BacktestResult};

/// A strategy that could not be run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyFailure {
    pub strategy: String,
    pub error: String,
}

/// Outcome of one comparison batch over one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub symbol: String,
    pub dataset_hash: String,
    pub is_synthetic: bool,
    pub results: Vec<BacktestResult>,
    pub failures: Vec<StrategyFailure>,
}

impl ComparisonReport {
    pub fn get(&self, strategy: &str) -> Option<&BacktestResult> {
        self.results.iter().find(|r| r.strategy.name == strategy)
    }

    /// Highest total return, if any strategy ran.
    pub fn best_by_total_return(&self) -> Option<&BacktestResult> {
        self.results
            .iter()
            .max_by(|a, b| a.metrics.total_return.total_cmp(&b.metrics.total_return))
    }
}

/// Run every spec over `data` with fresh engine state per strategy.
pub fn run_comparison(
    data: &LoadedData,
    specs: &[StrategySpec],
    engine_config: &EngineConfig,
    parallel: bool,
) -> ComparisonReport {
    let run_one = |spec: &StrategySpec| run_backtest(data, spec, engine_config);

    let outcomes: Vec<_> = if parallel {
        specs.par_iter().map(run_one).collect()
    } else {
        specs.iter().map(run_one).collect()
    };

    let mut results = Vec::with_capacity(specs.len());
    let mut failures = Vec::new();
    for (spec, outcome) in specs.iter().zip(outcomes) {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!(strategy = %spec.name, error = %e, "strategy failed, skipping");
                failures.push(StrategyFailure {
                    strategy: spec.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        symbol = %data.symbol,
        ran = results.len(),
        failed = failures.len(),
        "comparison finished"
    );

    ComparisonReport {
        symbol: data.symbol.clone(),
        dataset_hash: data.dataset_hash.clone(),
        is_synthetic: data.is_synthetic(),
        results,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loader::load_synthetic;
    use chrono::NaiveDate;
    use stratlab_core::strategy::{preset_names, preset_suite, MaCrossoverParams, StrategyParams};

    fn data() -> LoadedData {
        load_synthetic("CMP", NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(), 250)
    }

    #[test]
    fn preserves_configuration_order() {
        let report = run_comparison(&data(), &preset_suite(), &EngineConfig::default(), true);
        let names: Vec<String> = report.results.iter().map(|r| r.strategy.name.clone()).collect();
        assert_eq!(names, preset_names());
        assert!(report.failures.is_empty());
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let data = data();
        let par = run_comparison(&data, &preset_suite(), &EngineConfig::default(), true);
        let seq = run_comparison(&data, &preset_suite(), &EngineConfig::default(), false);
        assert_eq!(par.results, seq.results);
    }

    #[test]
    fn bad_strategy_is_skipped() {
        let mut specs = preset_suite();
        specs.insert(
            1,
            StrategySpec::new(
                "broken",
                StrategyParams::MaCrossover(MaCrossoverParams {
                    fast_period: 20,
                    slow_period: 5,
                }),
            ),
        );
        let report = run_comparison(&data(), &specs, &EngineConfig::default(), false);
        assert_eq!(report.results.len(), 6);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].strategy, "broken");
        assert!(report.get("broken").is_none());
        assert!(report.get("sma_10_30").is_some());
    }

    #[test]
    fn best_strategy_has_max_return() {
        let report = run_comparison(&data(), &preset_suite(), &EngineConfig::default(), false);
        let best = report.best_by_total_return().unwrap();
        assert!(report
            .results
            .iter()
            .all(|r| r.metrics.total_return <= best.metrics.total_return));
    }
}
