//! Day-by-day stock simulation.

use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Daily noise amplitude as a fraction of the consumption rate.
pub const VARIANCE_RATIO: f64 = 0.1;

/// Source of the per-day perturbation applied to projected stock.
pub trait NoiseSource {
    /// Draw a value uniformly from `[-half_width, +half_width]`.
    fn jitter(&mut self, half_width: f64) -> f64;
}

impl<N> NoiseSource for &mut N
where
    N: NoiseSource + ?Sized,
{
    fn jitter(&mut self, half_width: f64) -> f64 {
        (**self).jitter(half_width)
    }
}

impl<N> NoiseSource for Box<N>
where
    N: NoiseSource + ?Sized,
{
    fn jitter(&mut self, half_width: f64) -> f64 {
        (**self).jitter(half_width)
    }
}

/// Uniform noise drawn from any `rand` generator.
#[derive(Debug, Clone)]
pub struct UniformNoise<R> {
    rng: R,
}

impl<R: Rng> UniformNoise<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl UniformNoise<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> NoiseSource for UniformNoise<R> {
    fn jitter(&mut self, half_width: f64) -> f64 {
        if !(half_width.is_finite() && half_width > 0.0) {
            return 0.0;
        }
        self.rng.gen_range(-half_width..=half_width)
    }
}

/// No perturbation at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNoise;

impl NoiseSource for NoNoise {
    fn jitter(&mut self, _half_width: f64) -> f64 {
        0.0
    }
}

/// One simulated day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    /// 1-based day offset from the forecast date.
    pub day: u32,
    pub date: NaiveDate,
    pub expected_consumption: u64,
    /// Never negative; the simulated drawdown is clamped at zero.
    pub predicted_stock: u64,
}

/// Full simulated sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    points: Vec<ForecastPoint>,
}

impl Projection {
    pub fn points(&self) -> &[ForecastPoint] {
        &self.points
    }

    /// First day whose predicted stock is zero, searched over the full sequence.
    pub fn stock_out(&self) -> Option<&ForecastPoint> {
        self.points.iter().find(|p| p.predicted_stock == 0)
    }

    /// Leading `max_points` days, for bounded responses.
    pub fn truncated(&self, max_points: usize) -> Vec<ForecastPoint> {
        self.points.iter().take(max_points).cloned().collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StockProjector {
    variance_ratio: f64,
}

impl Default for StockProjector {
    fn default() -> Self {
        Self {
            variance_ratio: VARIANCE_RATIO,
        }
    }
}

impl StockProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate `forecast_days` days of consumption starting the day after `start`.
    ///
    /// The running balance drops by `daily_consumption` each day; noise only
    /// affects the reported `predicted_stock`. The day the running balance
    /// reaches zero is the last point emitted. Days past the last
    /// representable calendar date are not simulated.
    pub fn project<N: NoiseSource>(
        &self,
        current_stock: u64,
        daily_consumption: f64,
        forecast_days: u32,
        start: NaiveDate,
        noise: &mut N,
    ) -> Projection {
        let rate = daily_consumption.max(0.0);
        let half_width = rate * self.variance_ratio / 2.0;
        let expected = rate.round() as u64;

        let mut running = current_stock as f64;
        let mut points = Vec::with_capacity(forecast_days.min(366) as usize);

        for day in 1..=forecast_days {
            let Some(date) = start.checked_add_days(Days::new(u64::from(day))) else {
                break;
            };
            running -= rate;
            let predicted = (running + noise.jitter(half_width)).round().max(0.0) as u64;

            points.push(ForecastPoint {
                day,
                date,
                expected_consumption: expected,
                predicted_stock: predicted,
            });

            if running <= 0.0 {
                break;
            }
        }

        Projection { points }
    }
}
