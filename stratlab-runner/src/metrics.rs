//! Performance metrics: pure functions that compute strategy statistics.
//!
//! Every metric is a pure function: equity curve and/or trade list in, scalar
//! out. Per-bar returns are annualized with the 252 trading-day convention.

use serde::{Deserialize, Serialize};
use stratlab_core::domain::Trade;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// The results record for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub initial_cash: f64,
    /// Final account value: cash plus the marked value of any open position.
    pub final_cash: f64,
    pub total_return: f64,
    pub annual_return: f64,
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough decline as a positive fraction of the peak.
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub won_trades: usize,
    pub lost_trades: usize,
    pub win_rate: f64,
}

impl PerformanceMetrics {
    /// Compute all metrics from a per-bar equity curve and completed trades.
    pub fn compute(equity_curve: &[f64], trades: &[Trade], initial_cash: f64) -> Self {
        let final_cash = equity_curve.last().copied().unwrap_or(initial_cash);
        let total = total_return(final_cash, initial_cash);
        let won = trades.iter().filter(|t| t.is_winner()).count();
        Self {
            initial_cash,
            final_cash,
            total_return: total,
            annual_return: annual_return(total, equity_curve.len()),
            sharpe_ratio: sharpe_ratio(equity_curve),
            max_drawdown: max_drawdown(equity_curve),
            total_trades: trades.len(),
            won_trades: won,
            lost_trades: trades.len() - won,
            win_rate: win_rate(trades),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: final / initial - 1.
pub fn total_return(final_equity: f64, initial_cash: f64) -> f64 {
    if initial_cash <= 0.0 {
        return 0.0;
    }
    final_equity / initial_cash - 1.0
}

/// Geometric annualization of `total_return` over `num_bars` bars.
///
/// Returns 0.0 for an empty run and -1.0 once equity is wiped out.
pub fn annual_return(total_return: f64, num_bars: usize) -> f64 {
    if num_bars == 0 {
        return 0.0;
    }
    let growth = 1.0 + total_return;
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(TRADING_DAYS_PER_YEAR / num_bars as f64) - 1.0
}

/// Bar-over-bar simple returns of an equity curve.
pub fn daily_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| if w[0] != 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}

/// Annualized Sharpe ratio (zero risk-free rate).
///
/// Sharpe = mean(daily returns) / std(daily returns) * sqrt(252).
/// Returns 0.0 if the deviation is zero or there are fewer than 2 returns.
pub fn sharpe_ratio(equity_curve: &[f64]) -> f64 {
    let returns = daily_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(&returns) / std * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Maximum drawdown as a positive fraction (0.25 = 25% below the peak).
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &eq in equity_curve {
        peak = peak.max(eq);
        if peak > 0.0 {
            worst = worst.max((peak - eq) / peak);
        }
    }
    worst
}

/// Fraction of trades with positive PnL after commissions; 0.0 without trades.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

pub fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}
