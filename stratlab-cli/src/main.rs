//! StratLab CLI — run and compare strategy backtests.
//!
//! Commands:
//! - `run`: one strategy (a built-in preset or a named `[[strategies]]`
//!   entry of a TOML config) over one dataset
//! - `compare`: every configured strategy over one or more datasets
//! - `presets`: list the built-in strategies

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use stratlab_core::engine::EngineConfig;
use stratlab_core::strategy::{preset, preset_suite, StrategySpec};
use stratlab_runner::export::{save_artifacts, save_comparison};
use stratlab_runner::{
    load_csv, load_synthetic, run_backtest, run_comparison, BacktestConfig, BacktestResult,
    ComparisonReport, LoadedData,
};

#[derive(Parser)]
#[command(
    name = "stratlab",
    about = "StratLab CLI — bar-driven single-instrument backtester"
)]
struct Cli {
    /// Log filter (e.g. "info", "stratlab_core=debug"). Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by `run` and `compare`.
#[derive(Args)]
struct CommonArgs {
    /// TOML config file ([backtest] table and [[strategies]] entries).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Generate a deterministic synthetic series for this symbol instead of
    /// reading a CSV file.
    #[arg(long)]
    synthetic: Option<String>,

    /// Number of synthetic bars.
    #[arg(long, default_value_t = 750)]
    bars: usize,

    /// Override the starting cash.
    #[arg(long)]
    initial_cash: Option<f64>,

    /// Override the commission rate (fraction of traded value).
    #[arg(long)]
    commission: Option<f64>,

    /// Output directory for artifacts.
    #[arg(long, default_value = "results")]
    output_dir: PathBuf,

    /// Print results without writing artifacts.
    #[arg(long, default_value_t = false)]
    no_save: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest one strategy over one dataset.
    Run {
        /// CSV file with date,open,high,low,close,volume columns.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Symbol label for the data. Defaults to the file stem.
        #[arg(long)]
        symbol: Option<String>,

        /// Built-in preset name (see `stratlab presets`).
        #[arg(long, conflicts_with = "strategy")]
        preset: Option<String>,

        /// Name of a `[[strategies]]` entry in the config file.
        #[arg(long, requires = "config")]
        strategy: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Run every configured strategy (default: the preset suite) and compare.
    Compare {
        /// One or more CSV files. A file that fails to load is skipped.
        #[arg(long, num_args = 1..)]
        data: Vec<PathBuf>,

        /// Run strategies one after another instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// List the built-in strategy presets.
    Presets,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match cli.command {
        Commands::Run {
            data,
            symbol,
            preset,
            strategy,
            common,
        } => run_cmd(data, symbol, preset, strategy, common),
        Commands::Compare {
            data,
            sequential,
            common,
        } => compare_cmd(data, sequential, common),
        Commands::Presets => presets_cmd(),
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(common: &CommonArgs) -> Result<BacktestConfig> {
    match &common.config {
        Some(path) => BacktestConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(BacktestConfig::default()),
    }
}

fn engine_config(config: &BacktestConfig, common: &CommonArgs) -> EngineConfig {
    let mut engine = config.engine_config();
    if let Some(cash) = common.initial_cash {
        engine.initial_cash = cash;
    }
    if let Some(rate) = common.commission {
        engine.commission_rate = rate;
    }
    engine
}

fn synthetic_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

fn symbol_for(path: &Path, explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| path.file_stem().map(|s| s.to_string_lossy().to_string()))
        .unwrap_or_else(|| "DATA".into())
}

fn run_cmd(
    data: Option<PathBuf>,
    symbol: Option<String>,
    preset_name: Option<String>,
    strategy_name: Option<String>,
    common: CommonArgs,
) -> Result<()> {
    let config = load_config(&common)?;

    let spec: StrategySpec = match (preset_name, strategy_name) {
        (Some(name), None) => preset(&name).with_context(|| {
            format!(
                "unknown preset '{name}'. Valid: {}",
                stratlab_core::strategy::preset_names().join(", ")
            )
        })?,
        (None, Some(name)) => config
            .strategy(&name)
            .cloned()
            .with_context(|| format!("no strategy named '{name}' in config"))?,
        (None, None) if config.strategies.len() == 1 && common.config.is_some() => {
            config.strategies[0].clone()
        }
        _ => bail!("one of --preset or --strategy is required"),
    };

    let loaded = if let Some(sym) = &common.synthetic {
        load_synthetic(sym, synthetic_start(), common.bars)
    } else {
        let path = data
            .or_else(|| config.backtest.data.clone())
            .context("no data: pass --data FILE, set [backtest].data, or use --synthetic SYMBOL")?;
        let sym = symbol.or_else(|| common.config.as_ref().map(|_| config.backtest.symbol.clone()));
        load_csv(&path, &symbol_for(&path, sym.as_deref()))?
    };

    let engine = engine_config(&config, &common);
    let result = run_backtest(&loaded, &spec, &engine)?;
    print_summary(&result);

    if !common.no_save {
        let run_dir = save_artifacts(&result, &common.output_dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn compare_cmd(data: Vec<PathBuf>, sequential: bool, common: CommonArgs) -> Result<()> {
    let config = load_config(&common)?;
    let engine = engine_config(&config, &common);

    let mut datasets: Vec<LoadedData> = Vec::new();
    let mut paths = data;
    if paths.is_empty() {
        paths.extend(config.backtest.data.clone());
    }
    for path in &paths {
        let explicit = (paths.len() == 1 && common.config.is_some())
            .then(|| config.backtest.symbol.as_str());
        match load_csv(path, &symbol_for(path, explicit)) {
            Ok(loaded) => datasets.push(loaded),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping dataset"),
        }
    }
    if let Some(sym) = &common.synthetic {
        datasets.push(load_synthetic(sym, synthetic_start(), common.bars));
    }
    if datasets.is_empty() {
        bail!("no usable datasets: pass --data FILE..., set [backtest].data, or use --synthetic SYMBOL");
    }

    let specs = if common.config.is_some() {
        config.strategies.clone()
    } else {
        preset_suite()
    };

    for loaded in &datasets {
        let report = run_comparison(loaded, &specs, &engine, !sequential);
        print_comparison(&report);
        if !common.no_save {
            let dir = common.output_dir.join(format!("compare_{}", report.symbol));
            save_comparison(&report, &dir)?;
            println!("Comparison saved to: {}", dir.display());
        }
        println!();
    }
    Ok(())
}

fn presets_cmd() -> Result<()> {
    println!("{:<18} {:<16} Parameters", "Name", "Kind");
    println!("{}", "-".repeat(60));
    for spec in preset_suite() {
        let params = describe_params(&spec);
        println!("{:<18} {:<16} {}", spec.name, spec.params.kind(), params);
    }
    Ok(())
}

fn describe_params(spec: &StrategySpec) -> String {
    use stratlab_core::strategy::StrategyParams;
    match &spec.params {
        StrategyParams::MaCrossover(p) => {
            format!("fast={} slow={}", p.fast_period, p.slow_period)
        }
        StrategyParams::RsiThreshold(p) => format!(
            "period={} oversold={} overbought={}",
            p.period, p.oversold, p.overbought
        ),
        StrategyParams::MacdCrossover(p) => {
            let trail = if p.trailing_enabled {
                format!("trail={}", p.trailing_fraction)
            } else {
                "trail=off".into()
            };
            format!("fast={} slow={} signal={} {}", p.fast, p.slow, p.signal, trail)
        }
    }
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    println!();
    println!("=== {} on {} ===", result.strategy.name, result.symbol);
    if result.is_synthetic {
        println!("WARNING: synthetic data");
    }
    println!("Period:        {} to {} ({} bars)", result.start, result.end, result.bar_count);
    println!("Initial cash:  {:.2}", m.initial_cash);
    println!("Final cash:    {:.2}", m.final_cash);
    println!("Total return:  {:.2}%", m.total_return * 100.0);
    println!("Annual return: {:.2}%", m.annual_return * 100.0);
    println!("Sharpe:        {:.3}", m.sharpe_ratio);
    println!("Max drawdown:  {:.2}%", m.max_drawdown * 100.0);
    println!(
        "Trades:        {} ({} won, {} lost, {:.1}% win rate)",
        m.total_trades,
        m.won_trades,
        m.lost_trades,
        m.win_rate * 100.0
    );
    if !result.final_position.is_flat() {
        println!(
            "Open position: {} @ {:.2}",
            result.final_position.size, result.final_position.avg_entry_price
        );
    }
    println!("Fingerprint:   {}", result.fingerprint);
}

fn print_comparison(report: &ComparisonReport) {
    println!("=== Comparison on {} ===", report.symbol);
    if report.is_synthetic {
        println!("WARNING: synthetic data");
    }
    println!(
        "{:<18} {:>14} {:>10} {:>10} {:>8} {:>10} {:>7} {:>8}",
        "Strategy", "Final Cash", "Return", "Annual", "Sharpe", "Max DD", "Trades", "Win %"
    );
    println!("{}", "-".repeat(93));
    for r in &report.results {
        let m = &r.metrics;
        println!(
            "{:<18} {:>14.2} {:>9.2}% {:>9.2}% {:>8.3} {:>9.2}% {:>7} {:>7.1}%",
            r.strategy.name,
            m.final_cash,
            m.total_return * 100.0,
            m.annual_return * 100.0,
            m.sharpe_ratio,
            m.max_drawdown * 100.0,
            m.total_trades,
            m.win_rate * 100.0
        );
    }
    for f in &report.failures {
        println!("{:<18} FAILED: {}", f.strategy, f.error);
    }
}
