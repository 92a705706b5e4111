//! Trade: a completed long round trip.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Round trip created when a SELL fill fully closes the position opened by
/// an earlier BUY fill.
///
/// `pnl = (exit_price - entry_price) * size - entry_commission - exit_commission`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_bar: usize,
    pub entry_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub exit_bar: usize,
    pub exit_timestamp: NaiveDateTime,
    pub exit_price: f64,
    pub size: f64,
    pub entry_commission: f64,
    pub exit_commission: f64,
    pub pnl: f64,
}

impl Trade {
    pub fn gross_pnl(&self) -> f64 {
        self.pnl + self.entry_commission + self.exit_commission
    }

    /// Return on the trade as a fraction of entry cost.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 || self.size == 0.0 {
            return 0.0;
        }
        self.pnl / (self.entry_price * self.size)
    }

    pub fn bars_held(&self) -> usize {
        self.exit_bar.saturating_sub(self.entry_bar)
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }
}
