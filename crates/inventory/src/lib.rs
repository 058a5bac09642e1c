//! Inventory shapes consumed by the forecasting engine.
//!
//! Products and outbound movements are owned by the inventory subsystem; this
//! crate only models their read-only snapshots (no IO, no storage).

pub mod movement;
pub mod product;

pub use movement::{OutboundMovement, sort_chronologically};
pub use product::{Product, ProductFilter};
