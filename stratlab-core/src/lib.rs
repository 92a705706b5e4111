//! StratLab Core — domain types, indicators, ledger, strategies and the bar loop.
//!
//! This crate contains the deterministic heart of the backtester:
//! - Domain types (bars, orders, fills, positions, trades)
//! - Streaming indicators (SMA, EMA, Wilder RSI, MACD) and crossover detection
//! - Order & position ledger with commission accounting
//! - Strategy state machine (FLAT/LONG) with three strategy variants
//! - Single-instrument bar loop that wires them together
//!
//! Nothing in here touches the filesystem or network.

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod strategy;
