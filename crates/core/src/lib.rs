//! `pharmstock-core`: foundation building blocks.
//!
//! This crate contains **pure** primitives shared by the inventory and
//! forecasting crates (no infrastructure concerns).

pub mod clock;
pub mod error;
pub mod id;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::{MovementId, ProductId};
