use serde::{Deserialize, Serialize};

/// How the stock projector perturbs each simulated day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseMode {
    /// Fresh OS-seeded generator per product forecast.
    Entropy,
    /// Generator seeded from this value mixed with the product id (reproducible).
    Seeded(u64),
    /// No perturbation; predicted stock follows the deterministic drawdown.
    Disabled,
}

/// Tunables for the forecasting pipeline.
///
/// `Default` yields the production constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Days between placing a reorder and receiving stock.
    pub lead_time_days: u32,
    /// Safety stock expressed as days of adjusted consumption.
    pub safety_stock_days: u32,
    /// Suggested order covers this many days of adjusted consumption.
    pub order_cover_days: u32,
    /// Upper bound on forecast points returned per product.
    pub max_forecast_points: usize,
    /// Horizon used when a caller does not specify one.
    pub default_forecast_days: u32,
    /// Longest horizon a request may ask for.
    pub max_forecast_days: u32,
    /// Longest single consumption-analysis window a request may ask for.
    pub max_window_days: u32,
    /// Maximum per-product forecasts in flight during a bulk run.
    pub concurrency: usize,
    pub noise: NoiseMode,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            lead_time_days: 7,
            safety_stock_days: 3,
            order_cover_days: 30,
            max_forecast_points: 30,
            default_forecast_days: 30,
            max_forecast_days: 365,
            max_window_days: 365,
            concurrency: 8,
            noise: NoiseMode::Entropy,
        }
    }
}

impl ForecastConfig {
    pub fn with_noise(mut self, noise: NoiseMode) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.with_noise(NoiseMode::Seeded(seed))
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_default_forecast_days(mut self, days: u32) -> Self {
        self.default_forecast_days = days;
        self
    }

    pub fn with_max_forecast_days(mut self, days: u32) -> Self {
        self.max_forecast_days = days;
        self
    }

    pub fn with_lead_time_days(mut self, days: u32) -> Self {
        self.lead_time_days = days;
        self
    }
}
