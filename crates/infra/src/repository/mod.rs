//! Repository adapters for the forecasting engine.

pub mod in_memory;

pub use in_memory::{InMemoryMovementRepository, InMemoryProductRepository};
