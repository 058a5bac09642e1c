//! Command-line surface over an inventory snapshot.

pub mod snapshot;

pub use snapshot::{MovementRecord, Snapshot};
