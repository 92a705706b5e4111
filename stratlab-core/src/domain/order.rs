//! Market orders and their lifecycle.

use super::ids::OrderId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// +1 for buys, -1 for sells. Cash moves by `-sign * size * price`.
    pub fn sign(&self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Order lifecycle states. Everything except `Pending` is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Filled,
    /// Withdrawn without execution (e.g. still pending when the data ran out).
    Canceled { reason: String },
    /// Refused at execution time (e.g. not enough cash for the fill).
    Rejected { reason: String },
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Pending)
    }
}

/// A market order for the simulated instrument.
///
/// Created from a strategy intent, owned by the ledger while pending and
/// archived into the order history once it reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: OrderSide,
    pub size: f64,
    pub status: OrderStatus,
    pub requested_at_bar: usize,
    /// Bar index at which the order reached its terminal status.
    pub resolved_at_bar: Option<usize>,
    pub fill_price: Option<f64>,
    pub commission: f64,
}

impl Order {
    pub fn market(id: OrderId, side: OrderSide, size: f64, requested_at_bar: usize) -> Self {
        Self {
            id,
            side,
            size,
            status: OrderStatus::Pending,
            requested_at_bar,
            resolved_at_bar: None,
            fill_price: None,
            commission: 0.0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }

    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_market_order_is_pending() {
        let order = Order::market(OrderId(1), OrderSide::Buy, 10.0, 3);
        assert!(order.is_pending());
        assert!(!order.status.is_terminal());
        assert_eq!(order.resolved_at_bar, None);
    }

    #[test]
    fn side_sign() {
        assert_eq!(OrderSide::Buy.sign(), 1.0);
        assert_eq!(OrderSide::Sell.sign(), -1.0);
    }

    #[test]
    fn rejected_and_canceled_are_terminal() {
        assert!(OrderStatus::Rejected { reason: "cash".into() }.is_terminal());
        assert!(OrderStatus::Canceled { reason: "eod".into() }.is_terminal());
        assert!(OrderStatus::Filled.is_terminal());
    }
}
