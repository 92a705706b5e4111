//! Backtest runner: wires strategy construction, the engine and the analyzer.
//!
//! Every call builds a fresh `Engine`, `Ledger` and `StrategyMachine`, so
//! runs share nothing but the (read-only) bars.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use stratlab_core::domain::{Position, Trade};
use stratlab_core::engine::{Engine, EngineConfig, EngineError, EquityPoint};
use stratlab_core::strategy::{build_machine, FactoryError, StrategySpec};

use crate::data_loader::{LoadError, LoadedData};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("strategy error: {0}")]
    Strategy(#[from] FactoryError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub strategy: StrategySpec,
    pub symbol: String,
    pub dataset_hash: String,
    pub is_synthetic: bool,
    pub bar_count: usize,
    #[serde(default)]
    pub warmup_bars: usize,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub engine: EngineConfig,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    /// Position still open when the data ran out. Never auto-liquidated.
    pub final_position: Position,
    pub commission_paid: f64,
    /// BLAKE3 over the serialized result with this field empty.
    #[serde(default)]
    pub fingerprint: String,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn strategy_name(&self) -> &str {
        &self.strategy.name
    }

    /// Equity values without timestamps.
    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.equity).collect()
    }

    /// Recompute the content fingerprint. Identical inputs always give the
    /// same value, so it doubles as a replay check.
    pub fn compute_fingerprint(&self) -> String {
        let mut unsigned = self.clone();
        unsigned.fingerprint.clear();
        match serde_json::to_vec(&unsigned) {
            Ok(bytes) => blake3::hash(&bytes).to_hex().to_string(),
            Err(_) => String::new(),
        }
    }

    pub fn verify_fingerprint(&self) -> bool {
        !self.fingerprint.is_empty() && self.fingerprint == self.compute_fingerprint()
    }
}

/// Run one named strategy over pre-loaded data. No I/O.
pub fn run_backtest(
    data: &LoadedData,
    spec: &StrategySpec,
    engine_config: &EngineConfig,
) -> Result<BacktestResult, RunError> {
    let machine = build_machine(spec)?;
    let engine = Engine::new(engine_config.clone())?;
    let output = engine.run(&data.bars, machine)?;

    let metrics = PerformanceMetrics::compute(
        &output.equity_values(),
        &output.trades,
        output.initial_cash,
    );
    info!(
        strategy = %spec.name,
        symbol = %data.symbol,
        final_cash = metrics.final_cash,
        total_return = metrics.total_return,
        trades = metrics.total_trades,
        "backtest finished"
    );

    // Engine::run rejects empty input, so first/last exist here.
    let (start, end) = match (data.bars.first(), data.bars.last()) {
        (Some(first), Some(last)) => (first.timestamp, last.timestamp),
        _ => return Err(RunError::Engine(EngineError::EmptyDataset)),
    };

    let mut result = BacktestResult {
        schema_version: SCHEMA_VERSION,
        strategy: spec.clone(),
        symbol: data.symbol.clone(),
        dataset_hash: data.dataset_hash.clone(),
        is_synthetic: data.is_synthetic(),
        bar_count: output.bars_processed,
        warmup_bars: output.warmup_bars,
        start,
        end,
        engine: engine_config.clone(),
        metrics,
        trades: output.trades,
        equity_curve: output.equity_curve,
        final_position: output.final_position,
        commission_paid: output.commission_paid,
        fingerprint: String::new(),
    };
    result.fingerprint = result.compute_fingerprint();
    Ok(result)
}
