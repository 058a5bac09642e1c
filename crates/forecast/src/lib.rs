//! `pharmstock-forecast`
//!
//! **Responsibility:** inventory forecasting and reorder advice.
//!
//! Turns a product's outbound-movement history into a multi-window
//! consumption estimate, a trend, a confidence label, a day-by-day stock
//! projection and a reorder suggestion. The engine:
//! - reads products and movements through injected repositories;
//! - never mutates stock and never persists forecasts;
//! - takes "now" from an injected clock and noise from an injected generator.

pub mod aggregate;
pub mod analysis;
pub mod bulk;
pub mod config;
pub mod engine;
pub mod error;
pub mod projection;
pub mod recommend;
pub mod reorder;
pub mod source;

#[cfg(test)]
mod testing;

pub use aggregate::{AggregatedConsumption, ConsumptionWindow, MultiWindowAggregator, WINDOWS};
pub use analysis::{Confidence, ConsumptionAnalyzer, Trend, WindowAnalysis};
pub use bulk::{
    BulkForecastOrchestrator, BulkForecastReport, BulkForecastRequest, CancellationHandle, CancellationSignal,
    FailedForecast,
};
pub use config::{ForecastConfig, NoiseMode};
pub use engine::{ForecastEngine, ProductForecast};
pub use error::{ForecastError, RepositoryError};
pub use projection::{ForecastPoint, NoNoise, NoiseSource, Projection, StockProjector, UniformNoise};
pub use recommend::{ReorderRecommendation, ReorderRecommendations};
pub use reorder::{ReorderAdvisor, ReorderSuggestion, Urgency};
pub use source::{MovementRepository, ProductRepository};
