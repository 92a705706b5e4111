use crate::domain::ids::OrderId;
use crate::domain::order::OrderSide;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Execution record for a filled order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub side: OrderSide,
    pub price: f64,
    pub size: f64,
    pub commission: f64,
}

impl Fill {
    /// Gross traded value, before commission.
    pub fn value(&self) -> f64 {
        self.size * self.price
    }
}
