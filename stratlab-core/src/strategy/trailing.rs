//! Percent trailing stop.
//!
//! Armed on an entry fill with `highest = fill price`. While long, the high
//! water mark ratchets up with each close and never down; the stop sits at
//! `highest * (1 - fraction)`. A close strictly below the stop is a breach.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingStop {
    fraction: f64,
    active: bool,
    highest_price: f64,
    stop_price: f64,
}

impl TrailingStop {
    pub fn new(fraction: f64) -> Self {
        Self {
            fraction,
            active: false,
            highest_price: 0.0,
            stop_price: 0.0,
        }
    }

    pub fn arm(&mut self, fill_price: f64) {
        self.active = true;
        self.highest_price = fill_price;
        self.stop_price = fill_price * (1.0 - self.fraction);
    }

    pub fn reset(&mut self) {
        self.active = false;
        self.highest_price = 0.0;
        self.stop_price = 0.0;
    }

    /// Ratchet with `close` and report whether the stop is breached.
    /// Inactive stops never breach.
    pub fn update(&mut self, close: f64) -> bool {
        if !self.active {
            return false;
        }
        if close > self.highest_price {
            self.highest_price = close;
            self.stop_price = close * (1.0 - self.fraction);
        }
        close < self.stop_price
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn highest_price(&self) -> f64 {
        self.highest_price
    }

    pub fn stop_price(&self) -> f64 {
        self.stop_price
    }
}
