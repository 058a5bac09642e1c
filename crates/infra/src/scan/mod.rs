//! Scheduled reorder scans.
//!
//! Runs the bulk forecast on a schedule or on demand and publishes each report.
//! Failures are isolated and must not impact core inventory workflows.

pub mod reorder_scan_runner;

pub use reorder_scan_runner::{
    ForecastReportSink, InMemoryForecastReportSink, ReorderScanRunner, ReorderScanRunnerHandle,
};
