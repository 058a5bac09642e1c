//! Infrastructure layer: repository adapters, settings, scheduled scans.

pub mod config;
pub mod repository;
pub mod scan;

pub use config::ForecastSettings;
pub use repository::{InMemoryMovementRepository, InMemoryProductRepository};
pub use scan::{ForecastReportSink, InMemoryForecastReportSink, ReorderScanRunner, ReorderScanRunnerHandle};
