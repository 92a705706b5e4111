//! Order & position ledger.
//!
//! Single-writer record of cash, the open position, the (at most one)
//! pending order, the equity curve and completed trades. The ledger does not
//! enforce margin; sizing and cash checks belong to the caller.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::domain::{Fill, Order, OrderId, OrderSide, OrderStatus, Position, Trade};

use super::state::{EquityPoint, RunOutput};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("no pending order to resolve")]
    NoPendingOrder,

    #[error("sell of {requested} units exceeds held position of {held}")]
    Oversell { requested: f64, held: f64 },
}

/// Entry-side bookkeeping for the round trip currently open.
#[derive(Debug, Clone)]
struct OpenLot {
    entry_bar: usize,
    entry_timestamp: NaiveDateTime,
    units_bought: f64,
    entry_commission: f64,
    exit_commission: f64,
    realized_gross: f64,
}

#[derive(Debug, Clone)]
pub struct Ledger {
    initial_cash: f64,
    cash: f64,
    position: Position,
    pending: Option<Order>,
    equity_curve: Vec<EquityPoint>,
    trades: Vec<Trade>,
    order_history: Vec<Order>,
    fills: Vec<Fill>,
    open_lot: Option<OpenLot>,
    realized_pnl: f64,
    commission_paid: f64,
    next_order_id: u64,
}

impl Ledger {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            position: Position::flat(),
            pending: None,
            equity_curve: Vec::new(),
            trades: Vec::new(),
            order_history: Vec::new(),
            fills: Vec::new(),
            open_lot: None,
            realized_pnl: 0.0,
            commission_paid: 0.0,
            next_order_id: 1,
        }
    }

    /// Allocate the next order id.
    pub fn next_order_id(&mut self) -> OrderId {
        let id = OrderId(self.next_order_id);
        self.next_order_id += 1;
        id
    }

    /// Accept `order` as the pending order.
    ///
    /// Fails with `InvalidOrder` if an order is already pending or the size
    /// is not a positive finite number, and with `Oversell` if a sell asks
    /// for more than the long position holds.
    pub fn submit(&mut self, mut order: Order) -> Result<OrderId, LedgerError> {
        if let Some(pending) = &self.pending {
            return Err(LedgerError::InvalidOrder(format!(
                "order {} is still pending",
                pending.id
            )));
        }
        if !(order.size.is_finite() && order.size > 0.0) {
            return Err(LedgerError::InvalidOrder(format!(
                "size must be positive, got {}",
                order.size
            )));
        }
        if order.side == OrderSide::Sell && order.size > self.position.size {
            return Err(LedgerError::Oversell {
                requested: order.size,
                held: self.position.size,
            });
        }
        order.status = OrderStatus::Pending;
        let id = order.id;
        self.pending = Some(order);
        Ok(id)
    }

    /// Fill the pending order in full at `price`.
    ///
    /// Cash moves by `-side * size * price - commission`. Buys re-weight the
    /// average entry; sells realize `(price - avg_entry) * size`. A sell that
    /// flattens the position emits a `Trade`.
    pub fn execute_fill(
        &mut self,
        price: f64,
        commission_rate: f64,
        bar_index: usize,
        timestamp: NaiveDateTime,
    ) -> Result<Fill, LedgerError> {
        let mut order = self.pending.take().ok_or(LedgerError::NoPendingOrder)?;
        let size = order.size;
        let value = size * price;
        let commission = value * commission_rate;

        self.cash -= order.side.sign() * value + commission;
        self.commission_paid += commission;

        match order.side {
            OrderSide::Buy => {
                let lot = self.open_lot.get_or_insert_with(|| OpenLot {
                    entry_bar: bar_index,
                    entry_timestamp: timestamp,
                    units_bought: 0.0,
                    entry_commission: 0.0,
                    exit_commission: 0.0,
                    realized_gross: 0.0,
                });
                lot.units_bought += size;
                lot.entry_commission += commission;
                self.position.add(size, price);
            }
            OrderSide::Sell => {
                let entry_price = self.position.avg_entry_price;
                let gross = (price - entry_price) * size;
                self.realized_pnl += gross;
                self.position.reduce(size);

                if let Some(lot) = self.open_lot.as_mut() {
                    lot.realized_gross += gross;
                    lot.exit_commission += commission;
                }
                if self.position.is_flat() {
                    if let Some(lot) = self.open_lot.take() {
                        self.trades.push(Trade {
                            entry_bar: lot.entry_bar,
                            entry_timestamp: lot.entry_timestamp,
                            entry_price,
                            exit_bar: bar_index,
                            exit_timestamp: timestamp,
                            exit_price: price,
                            size: lot.units_bought,
                            entry_commission: lot.entry_commission,
                            exit_commission: lot.exit_commission,
                            pnl: lot.realized_gross - lot.entry_commission - lot.exit_commission,
                        });
                    }
                }
            }
        }

        order.status = OrderStatus::Filled;
        order.resolved_at_bar = Some(bar_index);
        order.fill_price = Some(price);
        order.commission = commission;

        let fill = Fill {
            order_id: order.id,
            bar_index,
            timestamp,
            side: order.side,
            price,
            size,
            commission,
        };
        self.order_history.push(order);
        self.fills.push(fill.clone());
        Ok(fill)
    }

    /// Move the pending order to REJECTED and archive it.
    pub fn reject_pending(&mut self, reason: impl Into<String>, bar_index: usize) -> Option<Order> {
        self.close_pending(OrderStatus::Rejected { reason: reason.into() }, bar_index)
    }

    /// Move the pending order to CANCELED and archive it.
    pub fn cancel_pending(&mut self, reason: impl Into<String>, bar_index: usize) -> Option<Order> {
        self.close_pending(OrderStatus::Canceled { reason: reason.into() }, bar_index)
    }

    fn close_pending(&mut self, status: OrderStatus, bar_index: usize) -> Option<Order> {
        let mut order = self.pending.take()?;
        order.status = status;
        order.resolved_at_bar = Some(bar_index);
        self.order_history.push(order.clone());
        Some(order)
    }

    /// Append `(timestamp, cash + position * price)` to the equity curve.
    pub fn mark_to_market(&mut self, timestamp: NaiveDateTime, price: f64) -> f64 {
        let equity = self.equity_at(price);
        self.equity_curve.push(EquityPoint { timestamp, equity });
        equity
    }

    pub fn equity_at(&self, price: f64) -> f64 {
        self.cash + self.position.market_value(price)
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.position.unrealized_pnl(price)
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn pending(&self) -> Option<&Order> {
        self.pending.as_ref()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn order_history(&self) -> &[Order] {
        &self.order_history
    }

    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    /// Gross realized PnL, before commissions.
    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    pub fn commission_paid(&self) -> f64 {
        self.commission_paid
    }

    pub(crate) fn into_output(
        self,
        strategy: String,
        bars_processed: usize,
        warmup_bars: usize,
    ) -> RunOutput {
        RunOutput {
            strategy,
            initial_cash: self.initial_cash,
            cash: self.cash,
            final_position: self.position,
            equity_curve: self.equity_curve,
            trades: self.trades,
            orders: self.order_history,
            fills: self.fills,
            realized_pnl: self.realized_pnl,
            commission_paid: self.commission_paid,
            bars_processed,
            warmup_bars,
        }
    }
}
