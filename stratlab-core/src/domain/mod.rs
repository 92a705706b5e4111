//! Domain types shared by the ledger, the strategies and the engine.

pub mod bar;
pub mod fill;
pub mod ids;
pub mod order;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use fill::Fill;
pub use ids::OrderId;
pub use order::{Order, OrderSide, OrderStatus};
pub use position::Position;
pub use trade::Trade;
