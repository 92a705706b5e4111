//! Integration tests for the runner: CSV on disk through config, engine and
//! analyzer.

use std::io::Write;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use stratlab_core::engine::EngineConfig;
use stratlab_core::strategy::preset;
use stratlab_runner::{
    load_csv, run_backtest, run_comparison, BacktestConfig, LoadError, RunError,
};

/// Flat chop, a 10-bar slide to 80, then a rally to 125.
fn dip_and_rally() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..15).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
    closes.extend((1..=10).map(|k| 100.0 - 2.0 * k as f64));
    closes.extend((1..=15).map(|k| 80.0 + 3.0 * k as f64));
    closes
}

fn write_csv(dir: &Path, closes: &[f64]) -> std::path::PathBuf {
    let path = dir.join("bars.csv");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "date,open,high,low,close,volume,amount").unwrap();
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    for (i, &close) in closes.iter().enumerate() {
        let open = if i == 0 { close } else { closes[i - 1] };
        let date = start + Duration::days(i as i64);
        writeln!(
            f,
            "{},{},{},{},{},{},{}",
            date.format("%Y-%m-%d"),
            open,
            open.max(close) * 1.01,
            open.min(close) * 0.99,
            close,
            1_000_000,
            close * 1_000_000.0
        )
        .unwrap();
    }
    path
}

#[test]
fn rsi_preset_on_csv_produces_one_winning_trade() {
    let dir = tempfile::tempdir().unwrap();
    let data = load_csv(&write_csv(dir.path(), &dip_and_rally()), "DIP").unwrap();
    assert_eq!(data.bars.len(), 40);
    assert!(!data.is_synthetic());

    let result = run_backtest(&data, &preset("rsi_14").unwrap(), &EngineConfig::default()).unwrap();
    let m = &result.metrics;
    assert_eq!(m.total_trades, 1);
    assert_eq!(m.won_trades, 1);
    assert_eq!(m.lost_trades, 0);
    assert_eq!(m.win_rate, 1.0);

    let trade = &result.trades[0];
    assert_eq!(trade.entry_price, 90.0);
    assert_eq!(trade.exit_price, 110.0);
    assert!((m.final_cash - (100_000.0 + trade.pnl)).abs() < 1e-6);
    assert!((m.total_return - trade.pnl / 100_000.0).abs() < 1e-12);
    assert!(m.max_drawdown >= 0.0 && m.max_drawdown < 1.0);
    assert!(result.final_position.is_flat());
    assert_eq!(result.start.date(), NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
}

#[test]
fn config_file_drives_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), &dip_and_rally());
    let toml_path = dir.path().join("backtest.toml");
    std::fs::write(
        &toml_path,
        format!(
            r#"
[backtest]
symbol = "DIP"
data = "{}"
initial_cash = 50000.0
commission_rate = 0.0

[[strategies]]
name = "rsi_fast"
kind = "rsi_threshold"
period = 14
oversold = 30.0
overbought = 70.0
sizing = {{ type = "fixed_units", units = 100.0 }}
"#,
            csv.display()
        ),
    )
    .unwrap();

    let config = BacktestConfig::from_file(&toml_path).unwrap();
    let data_path = config.backtest.data.clone().unwrap();
    let data = load_csv(&data_path, &config.backtest.symbol).unwrap();
    let spec = config.strategy("rsi_fast").unwrap();
    let result = run_backtest(&data, spec, &config.engine_config()).unwrap();

    assert_eq!(result.metrics.initial_cash, 50_000.0);
    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].size, 100.0);
    // No commission: pnl is exactly 20 per unit.
    assert!((result.trades[0].pnl - 2_000.0).abs() < 1e-9);
    assert!((result.metrics.final_cash - 52_000.0).abs() < 1e-9);
}

#[test]
fn same_data_same_fingerprint_across_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path(), &dip_and_rally());
    let a = load_csv(&path, "DIP").unwrap();
    let b = load_csv(&path, "DIP").unwrap();
    assert_eq!(a.dataset_hash, b.dataset_hash);

    let spec = preset("macd_trail").unwrap();
    let ra = run_backtest(&a, &spec, &EngineConfig::default()).unwrap();
    let rb = run_backtest(&b, &spec, &EngineConfig::default()).unwrap();
    assert_eq!(ra.fingerprint, rb.fingerprint);
}

#[test]
fn comparison_on_short_data_still_reports_every_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let data = load_csv(&write_csv(dir.path(), &dip_and_rally()), "DIP").unwrap();
    let report = run_comparison(
        &data,
        &stratlab_core::strategy::preset_suite(),
        &EngineConfig::default(),
        true,
    );
    // 40 bars is shorter than the MACD warm-up; those runs simply never trade.
    assert_eq!(report.results.len(), 6);
    let macd = report.get("macd_no_trail").unwrap();
    assert_eq!(macd.metrics.total_trades, 0);
    assert_eq!(macd.metrics.final_cash, 100_000.0);
}

#[test]
fn missing_data_file_is_reported_not_panicked() {
    let err = load_csv(Path::new("/no/such/dir/bars.csv"), "X").unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
    let run_err: RunError = err.into();
    assert!(run_err.to_string().starts_with("data error"));
}
