//! FLAT/LONG state machine shared by every strategy variant.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{Bar, Order, OrderSide, OrderStatus, Position};

use super::sizing::Sizing;
use super::trailing::TrailingStop;
use super::Strategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionState {
    Flat,
    Long,
}

/// Why an order intent was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalReason {
    Entry,
    Exit,
    TrailingStop,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub side: OrderSide,
    pub size: f64,
    pub reason: SignalReason,
}

/// Ledger state visible to the strategy at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountSnapshot {
    pub bar_index: usize,
    pub cash: f64,
    pub position_size: f64,
    pub has_pending: bool,
}

/// One strategy instance with its position state and trailing stop.
///
/// Built fresh for every run; nothing here is shared between runs.
pub struct StrategyMachine {
    strategy: Box<dyn Strategy>,
    sizing: Sizing,
    state: PositionState,
    trailing: Option<TrailingStop>,
}

impl StrategyMachine {
    pub fn new(strategy: Box<dyn Strategy>, sizing: Sizing) -> Self {
        let trailing = strategy.trailing_fraction().map(TrailingStop::new);
        Self {
            strategy,
            sizing,
            state: PositionState::Flat,
            trailing,
        }
    }

    pub fn name(&self) -> &str {
        self.strategy.name()
    }

    pub fn state(&self) -> PositionState {
        self.state
    }

    pub fn trailing_stop(&self) -> Option<&TrailingStop> {
        self.trailing.as_ref()
    }

    pub fn strategy(&self) -> &dyn Strategy {
        self.strategy.as_ref()
    }

    pub fn on_bar(&mut self, bar: &Bar) {
        self.strategy.update_indicators(bar);
    }

    /// React to an order reaching a terminal status.
    ///
    /// A BUY fill moves to LONG and arms the trailing stop at the fill price;
    /// a SELL fill that flattens the position moves to FLAT and disarms it.
    /// Rejections and cancellations leave the state untouched.
    pub fn on_order_update(&mut self, order: &Order, position: &Position) {
        if order.status != OrderStatus::Filled {
            return;
        }
        match order.side {
            OrderSide::Buy => {
                self.state = PositionState::Long;
                if let (Some(trail), Some(price)) = (self.trailing.as_mut(), order.fill_price) {
                    trail.arm(price);
                }
            }
            OrderSide::Sell => {
                if position.is_flat() {
                    self.state = PositionState::Flat;
                    if let Some(trail) = self.trailing.as_mut() {
                        trail.reset();
                    }
                }
            }
        }
    }

    /// Decide this bar's order, if any.
    ///
    /// Nothing is submitted while an order is pending. When LONG the trailing
    /// stop is checked first and a breach exits without consulting the exit
    /// rule. Entry sizes can come out as zero; the ledger refuses those.
    pub fn evaluate(&mut self, bar: &Bar, account: &AccountSnapshot) -> Option<OrderIntent> {
        if account.has_pending {
            return None;
        }

        match self.state {
            PositionState::Long => {
                if let Some(trail) = self.trailing.as_mut() {
                    if trail.update(bar.close) {
                        debug!(
                            strategy = self.strategy.name(),
                            bar = account.bar_index,
                            close = bar.close,
                            stop = trail.stop_price(),
                            highest = trail.highest_price(),
                            "trailing stop breached"
                        );
                        return Some(OrderIntent {
                            side: OrderSide::Sell,
                            size: account.position_size,
                            reason: SignalReason::TrailingStop,
                        });
                    }
                }
                if self.strategy.exit_signal() {
                    debug!(
                        strategy = self.strategy.name(),
                        bar = account.bar_index,
                        close = bar.close,
                        indicators = ?self.strategy.indicator_values(),
                        "exit signal"
                    );
                    return Some(OrderIntent {
                        side: OrderSide::Sell,
                        size: account.position_size,
                        reason: SignalReason::Exit,
                    });
                }
                None
            }
            PositionState::Flat => {
                if !self.strategy.entry_signal() {
                    return None;
                }
                let size = self.sizing.units(account.cash, bar.close);
                debug!(
                    strategy = self.strategy.name(),
                    bar = account.bar_index,
                    close = bar.close,
                    size,
                    indicators = ?self.strategy.indicator_values(),
                    "entry signal"
                );
                Some(OrderIntent {
                    side: OrderSide::Buy,
                    size,
                    reason: SignalReason::Entry,
                })
            }
        }
    }
}

impl std::fmt::Debug for StrategyMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyMachine")
            .field("strategy", &self.strategy.name())
            .field("sizing", &self.sizing)
            .field("state", &self.state)
            .field("trailing", &self.trailing)
            .finish()
    }
}
