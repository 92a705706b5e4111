//! Position: the single open holding in the simulated instrument.

use serde::{Deserialize, Serialize};

/// Signed position size (positive = long, zero = flat) and its weighted
/// average entry price. Only fills mutate it; strategies here are long-only,
/// so `size >= 0` always holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub size: f64,
    pub avg_entry_price: f64,
}

impl Position {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn is_flat(&self) -> bool {
        self.size == 0.0
    }

    pub fn is_long(&self) -> bool {
        self.size > 0.0
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.size * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.size * (price - self.avg_entry_price)
    }

    /// Add units at `price`, re-weighting the average entry.
    pub(crate) fn add(&mut self, size: f64, price: f64) {
        let new_size = self.size + size;
        self.avg_entry_price = (self.size * self.avg_entry_price + size * price) / new_size;
        self.size = new_size;
    }

    /// Remove units; average entry is unchanged on trims and cleared when flat.
    pub(crate) fn reduce(&mut self, size: f64) {
        self.size -= size;
        if self.size <= 0.0 {
            self.size = 0.0;
            self.avg_entry_price = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_average_on_add() {
        let mut pos = Position::flat();
        pos.add(10.0, 100.0);
        pos.add(30.0, 120.0);
        assert_eq!(pos.size, 40.0);
        assert!((pos.avg_entry_price - 115.0).abs() < 1e-12);
    }

    #[test]
    fn trim_keeps_average_and_full_close_resets() {
        let mut pos = Position::flat();
        pos.add(10.0, 50.0);
        pos.reduce(4.0);
        assert_eq!(pos.size, 6.0);
        assert_eq!(pos.avg_entry_price, 50.0);
        pos.reduce(6.0);
        assert!(pos.is_flat());
        assert_eq!(pos.avg_entry_price, 0.0);
    }

    #[test]
    fn unrealized_pnl_of_long() {
        let pos = Position {
            size: 5.0,
            avg_entry_price: 20.0,
        };
        assert_eq!(pos.unrealized_pnl(22.0), 10.0);
        assert_eq!(pos.market_value(22.0), 110.0);
    }
}
