//! Engine configuration and run output.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Fill, Order, Position, Trade};

/// Default starting cash.
pub const DEFAULT_INITIAL_CASH: f64 = 100_000.0;

/// Default commission: 0.1% of traded value, charged on both sides.
pub const DEFAULT_COMMISSION_RATE: f64 = 0.001;

/// Which price of the resolving bar a pending market order fills at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPrice {
    #[default]
    Close,
    Open,
}

impl FillPrice {
    pub fn price(&self, bar: &Bar) -> f64 {
        match self {
            FillPrice::Close => bar.close,
            FillPrice::Open => bar.open,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub initial_cash: f64,
    /// Fraction of traded value charged per fill.
    pub commission_rate: f64,
    pub fill_price: FillPrice,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_cash: DEFAULT_INITIAL_CASH,
            commission_rate: DEFAULT_COMMISSION_RATE,
            fill_price: FillPrice::default(),
        }
    }
}

/// Equity observation recorded once per bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

/// Everything a finished run leaves behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutput {
    pub strategy: String,
    pub initial_cash: f64,
    /// Cash left in the ledger, excluding the value of any open position.
    pub cash: f64,
    pub final_position: Position,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
    pub orders: Vec<Order>,
    pub fills: Vec<Fill>,
    pub realized_pnl: f64,
    pub commission_paid: f64,
    pub bars_processed: usize,
    /// Bars the strategy needed before its indicators could signal.
    pub warmup_bars: usize,
}

impl RunOutput {
    /// Last marked equity, or the starting cash if nothing was marked.
    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.initial_cash)
    }

    /// Equity values without timestamps.
    pub fn equity_values(&self) -> Vec<f64> {
        self.equity_curve.iter().map(|p| p.equity).collect()
    }
}
