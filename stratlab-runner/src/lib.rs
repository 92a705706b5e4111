//! StratLab Runner — data loading, backtest orchestration, analysis, export.
//!
//! This crate builds on `stratlab-core` to provide:
//! - CSV and synthetic bar loading with dataset hashing
//! - TOML backtest configuration
//! - Single-backtest runner producing a fingerprinted `BacktestResult`
//! - Performance metrics (the analyzer)
//! - Multi-strategy comparison over one dataset
//! - JSON / CSV / Markdown export

pub mod comparison;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use comparison::{run_comparison, ComparisonReport, StrategyFailure};
pub use config::{BacktestConfig, BacktestSection, ConfigError};
pub use data_loader::{
    dataset_hash, load_csv, load_synthetic, parse_csv, synthetic_bars, DataSource, LoadError,
    LoadedData,
};
pub use metrics::PerformanceMetrics;
pub use runner::{run_backtest, BacktestResult, RunError, SCHEMA_VERSION};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn performance_metrics_is_send_sync() {
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
    }

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn loaded_data_is_shareable_across_workers() {
        assert_send::<LoadedData>();
        assert_sync::<LoadedData>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<ComparisonReport>();
        assert_sync::<ComparisonReport>();
    }
}
