//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: the one-row results record, the comparison table, the trade
//!   tape and the equity curve
//! - **Markdown**: single-run reports and the comparison table
//!
//! Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use stratlab_core::domain::Trade;
use stratlab_core::engine::EquityPoint;

use crate::comparison::ComparisonReport;
use crate::metrics::PerformanceMetrics;
use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

const METRIC_COLUMNS: [&str; 10] = [
    "initial_cash",
    "final_cash",
    "total_return",
    "annual_return",
    "sharpe_ratio",
    "max_drawdown",
    "total_trades",
    "won_trades",
    "lost_trades",
    "win_rate",
];

fn metric_fields(m: &PerformanceMetrics) -> [String; 10] {
    [
        format!("{:.2}", m.initial_cash),
        format!("{:.2}", m.final_cash),
        format!("{:.6}", m.total_return),
        format!("{:.6}", m.annual_return),
        format!("{:.6}", m.sharpe_ratio),
        format!("{:.6}", m.max_drawdown),
        m.total_trades.to_string(),
        m.won_trades.to_string(),
        m.lost_trades.to_string(),
        format!("{:.6}", m.win_rate),
    ]
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// The results record as a one-row CSV.
pub fn export_results_csv(metrics: &PerformanceMetrics) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(METRIC_COLUMNS)?;
    wtr.write_record(metric_fields(metrics))?;
    finish(wtr)
}

/// One row per named strategy, in the given order.
pub fn export_comparison_csv(results: &[BacktestResult]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let header: Vec<&str> = std::iter::once("strategy")
        .chain(METRIC_COLUMNS)
        .collect();
    wtr.write_record(&header)?;
    for r in results {
        let mut row = vec![r.strategy.name.clone()];
        row.extend(metric_fields(&r.metrics));
        wtr.write_record(&row)?;
    }
    finish(wtr)
}

/// Completed trades, one row each.
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "entry_bar",
        "entry_time",
        "entry_price",
        "exit_bar",
        "exit_time",
        "exit_price",
        "size",
        "gross_pnl",
        "commission",
        "pnl",
        "return_pct",
        "bars_held",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.entry_bar.to_string(),
            &t.entry_timestamp.to_string(),
            &format!("{:.6}", t.entry_price),
            &t.exit_bar.to_string(),
            &t.exit_timestamp.to_string(),
            &format!("{:.6}", t.exit_price),
            &format!("{:.6}", t.size),
            &format!("{:.2}", t.gross_pnl()),
            &format!("{:.2}", t.entry_commission + t.exit_commission),
            &format!("{:.2}", t.pnl),
            &format!("{:.6}", t.return_pct()),
            &t.bars_held().to_string(),
        ])?;
    }

    finish(wtr)
}

/// Equity curve with bar index and timestamp.
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["bar_index", "timestamp", "equity"])?;
    for (i, p) in equity_curve.iter().enumerate() {
        wtr.write_record([
            &i.to_string(),
            &p.timestamp.to_string(),
            &format!("{:.2}", p.equity),
        ])?;
    }
    finish(wtr)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates `{strategy}_{timestamp}/` under `output_dir` containing
/// `result.json`, `results.csv`, `trades.csv`, `equity.csv` and `report.md`.
/// Returns the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        path_safe(&result.strategy.name),
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write(&run_dir.join("result.json"), &export_json(result)?)?;
    write(&run_dir.join("results.csv"), &export_results_csv(&result.metrics)?)?;
    write(&run_dir.join("trades.csv"), &export_trades_csv(&result.trades)?)?;
    write(&run_dir.join("equity.csv"), &export_equity_csv(&result.equity_curve)?)?;
    write(&run_dir.join("report.md"), &generate_report(result))?;

    Ok(run_dir)
}

/// Replace anything but ASCII alphanumerics, `-` and `_` with `_`.
fn path_safe(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "run".into()
    } else {
        cleaned
    }
}

/// Load a `BacktestResult` from an artifact directory.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

/// Write `comparison.csv`, `comparison.md` and `comparison.json` for a batch
/// into `output_dir`.
pub fn save_comparison(report: &ComparisonReport, output_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;
    write(
        &output_dir.join("comparison.csv"),
        &export_comparison_csv(&report.results)?,
    )?;
    write(&output_dir.join("comparison.md"), &comparison_markdown(report))?;
    let json = serde_json::to_string_pretty(report)
        .context("failed to serialize comparison report")?;
    write(&output_dir.join("comparison.json"), &json)
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

// ─── Markdown reports ───────────────────────────────────────────────

fn pct(v: f64) -> String {
    format!("{:.2}%", v * 100.0)
}

/// Markdown report for a single backtest run.
pub fn generate_report(result: &BacktestResult) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Strategy | {} |\n", result.strategy.name));
    md.push_str(&format!("| Kind | {} |\n", result.strategy.params.kind()));
    md.push_str(&format!("| Symbol | {} |\n", result.symbol));
    md.push_str(&format!("| Period | {} to {} |\n", result.start, result.end));
    md.push_str(&format!(
        "| Bars | {} ({} warmup) |\n",
        result.bar_count, result.warmup_bars
    ));
    md.push_str(&format!(
        "| Commission Rate | {} |\n",
        result.engine.commission_rate
    ));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    md.push_str(&format!("| Fingerprint | {} |\n", result.fingerprint));
    if result.is_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    md.push('\n');

    let m = &result.metrics;
    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Initial Cash | {:.2} |\n", m.initial_cash));
    md.push_str(&format!("| Final Cash | {:.2} |\n", m.final_cash));
    md.push_str(&format!("| Total Return | {} |\n", pct(m.total_return)));
    md.push_str(&format!("| Annual Return | {} |\n", pct(m.annual_return)));
    md.push_str(&format!("| Sharpe | {:.3} |\n", m.sharpe_ratio));
    md.push_str(&format!("| Max Drawdown | {} |\n", pct(m.max_drawdown)));
    md.push_str(&format!(
        "| Trades | {} ({} won / {} lost) |\n",
        m.total_trades, m.won_trades, m.lost_trades
    ));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", m.win_rate * 100.0));
    md.push_str(&format!("| Commission Paid | {:.2} |\n", result.commission_paid));
    md.push('\n');

    if !result.final_position.is_flat() {
        md.push_str(&format!(
            "Open position at end of data: {} units @ {:.2}\n\n",
            result.final_position.size, result.final_position.avg_entry_price
        ));
    }

    md
}

/// Markdown table comparing every strategy in a batch.
pub fn comparison_markdown(report: &ComparisonReport) -> String {
    let mut md = String::with_capacity(1024);

    md.push_str("# Strategy Comparison\n\n");
    md.push_str(&format!("Symbol: {}  \n", report.symbol));
    md.push_str(&format!("Dataset: {}\n\n", report.dataset_hash));
    if report.is_synthetic {
        md.push_str("**SYNTHETIC DATA**\n\n");
    }

    md.push_str(
        "| Strategy | Final Cash | Total Return | Annual Return | Sharpe | Max Drawdown | Trades | Win Rate |\n",
    );
    md.push_str("| --- | ---: | ---: | ---: | ---: | ---: | ---: | ---: |\n");
    for r in &report.results {
        let m = &r.metrics;
        md.push_str(&format!(
            "| {} | {:.2} | {} | {} | {:.3} | {} | {} | {:.1}% |\n",
            r.strategy.name,
            m.final_cash,
            pct(m.total_return),
            pct(m.annual_return),
            m.sharpe_ratio,
            pct(m.max_drawdown),
            m.total_trades,
            m.win_rate * 100.0
        ));
    }

    if !report.failures.is_empty() {
        md.push_str("\n## Skipped\n\n");
        for f in &report.failures {
            md.push_str(&format!("- {}: {}\n", f.strategy, f.error));
        }
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparison::run_comparison;
    use crate::data_loader::load_synthetic;
    use crate::runner::run_backtest;
    use chrono::NaiveDate;
    use stratlab_core::engine::EngineConfig;
    use stratlab_core::strategy::{preset, preset_suite};

    fn sample() -> BacktestResult {
        let data = load_synthetic("EXP", NaiveDate::from_ymd_opt(2021, 1, 4).unwrap(), 260);
        run_backtest(&data, &preset("sma_5_20").unwrap(), &EngineConfig::default()).unwrap()
    }

    #[test]
    fn json_round_trip_keeps_identity_fields() {
        let result = sample();
        let back = import_json(&export_json(&result).unwrap()).unwrap();
        assert_eq!(back.strategy, result.strategy);
        assert_eq!(back.fingerprint, result.fingerprint);
        assert_eq!(back.trades.len(), result.trades.len());
        assert_eq!(back.equity_curve.len(), result.equity_curve.len());
    }

    #[test]
    fn newer_schema_is_rejected() {
        let mut result = sample();
        result.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&result).unwrap();
        assert!(import_json(&json).is_err());
    }

    #[test]
    fn results_csv_has_one_row() {
        let csv = export_results_csv(&sample().metrics).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("initial_cash,final_cash,total_return"));
        assert!(lines[1].starts_with("100000.00,"));
    }

    #[test]
    fn equity_csv_has_row_per_bar() {
        let result = sample();
        let csv = export_equity_csv(&result.equity_curve).unwrap();
        assert_eq!(csv.lines().count(), result.equity_curve.len() + 1);
    }

    #[test]
    fn trades_csv_has_row_per_trade() {
        let result = sample();
        let csv = export_trades_csv(&result.trades).unwrap();
        assert_eq!(csv.lines().count(), result.trades.len() + 1);
        assert!(csv.starts_with("entry_bar,entry_time,entry_price"));
    }

    #[test]
    fn comparison_outputs_follow_suite_order() {
        let data = load_synthetic("CMP", NaiveDate::from_ymd_opt(2021, 1, 4).unwrap(), 200);
        let report = run_comparison(&data, &preset_suite(), &EngineConfig::default(), false);

        let csv = export_comparison_csv(&report.results).unwrap();
        let first_col: Vec<&str> = csv
            .lines()
            .skip(1)
            .filter_map(|l| l.split(',').next())
            .collect();
        assert_eq!(
            first_col,
            ["sma_10_30", "sma_5_20", "rsi_14", "rsi_10_improved", "macd_trail", "macd_no_trail"]
        );

        let md = comparison_markdown(&report);
        assert!(md.contains("| macd_trail |"));
        assert!(md.contains("**SYNTHETIC DATA**"));
    }

    #[test]
    fn artifact_dir_names_are_path_safe() {
        assert_eq!(path_safe("sma_5_20"), "sma_5_20");
        assert_eq!(path_safe("my fast/slow"), "my_fast_slow");
        assert_eq!(path_safe("../up"), "___up");
        assert_eq!(path_safe(""), "run");
    }

    #[test]
    fn report_mentions_strategy_and_synthetic_flag() {
        let md = generate_report(&sample());
        assert!(md.contains("| Strategy | sma_5_20 |"));
        assert!(md.contains("| Kind | ma_crossover |"));
        assert!(md.contains("**SYNTHETIC**"));
    }
}
