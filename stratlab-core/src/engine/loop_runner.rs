//! The bar loop.

use thiserror::Error;
use tracing::{debug, info, info_span, warn};

use crate::domain::{Bar, Order, OrderSide};
use crate::strategy::{AccountSnapshot, StrategyMachine};

use super::ledger::{Ledger, LedgerError};
use super::state::{EngineConfig, RunOutput};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("no bars supplied")]
    EmptyDataset,

    #[error("malformed bar at index {index}: {reason}")]
    MalformedBar { index: usize, reason: String },

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Check a bar series before any simulation: non-empty, tradable prices,
/// strictly increasing timestamps.
pub fn validate_bars(bars: &[Bar]) -> Result<(), EngineError> {
    if bars.is_empty() {
        return Err(EngineError::EmptyDataset);
    }
    for (index, bar) in bars.iter().enumerate() {
        if !bar.has_tradable_prices() {
            return Err(EngineError::MalformedBar {
                index,
                reason: "prices must be finite and positive".into(),
            });
        }
        if index > 0 && bar.timestamp <= bars[index - 1].timestamp {
            return Err(EngineError::MalformedBar {
                index,
                reason: format!(
                    "timestamp {} does not follow {}",
                    bar.timestamp,
                    bars[index - 1].timestamp
                ),
            });
        }
    }
    Ok(())
}

/// Single-instrument backtest engine. Holds only configuration; every call
/// to `run` builds its own ledger.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        if !(config.initial_cash.is_finite() && config.initial_cash > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "initial_cash must be positive, got {}",
                config.initial_cash
            )));
        }
        if !(config.commission_rate.is_finite() && config.commission_rate >= 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "commission_rate must be non-negative, got {}",
                config.commission_rate
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replay `bars` through `strategy`, consuming it.
    pub fn run(&self, bars: &[Bar], mut strategy: StrategyMachine) -> Result<RunOutput, EngineError> {
        validate_bars(bars)?;

        let name = strategy.name().to_string();
        let warmup = strategy.strategy().warmup();
        let _span =
            info_span!("backtest", strategy = %name, bars = bars.len(), warmup).entered();
        if warmup >= bars.len() {
            warn!(
                warmup,
                bars = bars.len(),
                "series shorter than strategy warm-up, no signals possible"
            );
        }
        let mut ledger = Ledger::new(self.config.initial_cash);

        for (i, bar) in bars.iter().enumerate() {
            strategy.on_bar(bar);

            if ledger.has_pending() {
                self.resolve_pending(&mut ledger, &mut strategy, bar, i)?;
            }

            let account = AccountSnapshot {
                bar_index: i,
                cash: ledger.cash(),
                position_size: ledger.position().size,
                has_pending: ledger.has_pending(),
            };
            if let Some(intent) = strategy.evaluate(bar, &account) {
                let id = ledger.next_order_id();
                let order = Order::market(id, intent.side, intent.size, i);
                match ledger.submit(order) {
                    Ok(id) => debug!(
                        bar = i,
                        order = %id,
                        side = %intent.side,
                        size = intent.size,
                        reason = ?intent.reason,
                        "order submitted"
                    ),
                    Err(err) => warn!(bar = i, %err, "order dropped"),
                }
            }

            ledger.mark_to_market(bar.timestamp, bar.close);
        }

        let last = bars.len() - 1;
        if let Some(order) = ledger.cancel_pending("end of data", last) {
            debug!(order = %order.id, side = %order.side, "pending order canceled at end of data");
            strategy.on_order_update(&order, ledger.position());
        }

        let output = ledger.into_output(name, bars.len(), warmup);
        info!(
            trades = output.trades.len(),
            final_equity = output.final_equity(),
            commission = output.commission_paid,
            "backtest complete"
        );
        Ok(output)
    }

    /// Fill or reject the pending order against `bar`.
    ///
    /// A buy whose cost plus commission exceeds available cash is rejected.
    fn resolve_pending(
        &self,
        ledger: &mut Ledger,
        strategy: &mut StrategyMachine,
        bar: &Bar,
        i: usize,
    ) -> Result<(), EngineError> {
        let price = self.config.fill_price.price(bar);
        let affordable = match ledger.pending() {
            Some(order) if order.side == OrderSide::Buy => {
                let cost = order.size * price * (1.0 + self.config.commission_rate);
                cost <= ledger.cash()
            }
            _ => true,
        };

        if !affordable {
            if let Some(order) = ledger.reject_pending("insufficient cash", i) {
                warn!(bar = i, order = %order.id, size = order.size, price, cash = ledger.cash(), "order rejected");
                strategy.on_order_update(&order, ledger.position());
            }
            return Ok(());
        }

        let fill = ledger.execute_fill(price, self.config.commission_rate, i, bar.timestamp)?;
        info!(
            bar = i,
            side = %fill.side,
            price = fill.price,
            size = fill.size,
            value = fill.value(),
            commission = fill.commission,
            "order executed"
        );
        if let Some(trade) = ledger.trades().last().filter(|t| t.exit_bar == i) {
            info!(bar = i, pnl = trade.pnl, bars_held = trade.bars_held(), "trade closed");
        }
        if let Some(order) = ledger.order_history().last() {
            strategy.on_order_update(order, ledger.position());
        }
        Ok(())
    }
}
