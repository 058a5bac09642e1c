//! Single-product forecasting pipeline.
//!
//! history read -> multi-window aggregation -> stock projection -> reorder advice.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use pharmstock_core::{Clock, ProductId};
use pharmstock_inventory::{OutboundMovement, Product, sort_chronologically};

use crate::aggregate::{MultiWindowAggregator, window_slice, window_start};
use crate::analysis::{Confidence, ConsumptionAnalyzer, Trend, WindowAnalysis};
use crate::config::{ForecastConfig, NoiseMode};
use crate::error::ForecastError;
use crate::projection::{ForecastPoint, NoNoise, NoiseSource, StockProjector, UniformNoise};
use crate::reorder::{ReorderAdvisor, ReorderSuggestion};
use crate::source::{MovementRepository, ProductRepository};

/// Forecast output for one product. Computed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductForecast {
    pub product_id: ProductId,
    pub product_name: String,
    pub current_stock: u64,
    pub reorder_level: u64,
    /// Weighted multi-window rate after the trend multiplier.
    pub daily_consumption: f64,
    pub trend: Trend,
    pub confidence: Confidence,
    pub stock_out_date: Option<NaiveDate>,
    pub days_until_stock_out: Option<u32>,
    /// Leading points of the simulation (bounded by `max_forecast_points`).
    pub forecast: Vec<ForecastPoint>,
    pub reorder_suggestion: ReorderSuggestion,
    pub windows: Vec<WindowAnalysis>,
}

pub struct ForecastEngine<P, M> {
    products: P,
    movements: M,
    clock: Arc<dyn Clock>,
    config: ForecastConfig,
    analyzer: ConsumptionAnalyzer,
    aggregator: MultiWindowAggregator,
    projector: StockProjector,
    advisor: ReorderAdvisor,
}

impl<P, M> ForecastEngine<P, M>
where
    P: ProductRepository,
    M: MovementRepository,
{
    pub fn new(products: P, movements: M, clock: Arc<dyn Clock>, config: ForecastConfig) -> Self {
        let analyzer = ConsumptionAnalyzer::new();
        Self {
            products,
            movements,
            clock,
            advisor: ReorderAdvisor::from_config(&config),
            config,
            analyzer,
            aggregator: MultiWindowAggregator::new(analyzer),
            projector: StockProjector::new(),
        }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn products(&self) -> &P {
        &self.products
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Forecast one product by id.
    pub async fn forecast_product(
        &self,
        product_id: ProductId,
        forecast_days: u32,
    ) -> Result<ProductForecast, ForecastError> {
        self.validate_horizon(forecast_days)?;

        let product = self
            .products
            .get(product_id)
            .await?
            .ok_or(ForecastError::ProductNotFound(product_id))?;

        self.forecast_loaded(&product, forecast_days, self.clock.now()).await
    }

    /// Single-window consumption statistics for one product.
    ///
    /// Uses the standalone analysis path: a window without movements reports
    /// confidence `low` rather than `none`.
    pub async fn analyze_consumption(
        &self,
        product_id: ProductId,
        window_days: u32,
    ) -> Result<WindowAnalysis, ForecastError> {
        validate_days("window_days", window_days, self.config.max_window_days)?;

        if self.products.get(product_id).await?.is_none() {
            return Err(ForecastError::ProductNotFound(product_id));
        }

        let now = self.clock.now();
        let mut history = self
            .movements
            .outbound_since(product_id, window_start(now, window_days))
            .await?;
        sort_chronologically(&mut history);

        let in_window = window_slice(&history, now, window_days);
        Ok(self.analyzer.analyze_standalone(&in_window, window_days))
    }

    /// Forecast an already-loaded product as of `now`.
    pub(crate) async fn forecast_loaded(
        &self,
        product: &Product,
        forecast_days: u32,
        now: DateTime<Utc>,
    ) -> Result<ProductForecast, ForecastError> {
        let history = self
            .movements
            .outbound_since(product.id, MultiWindowAggregator::history_start(now))
            .await?;

        let mut noise = self.noise_for(product.id);
        Ok(self.forecast_from_history(product, &history, forecast_days, now, &mut noise))
    }

    /// Pure pipeline over a supplied history (movements since `now - 60d`).
    pub fn forecast_from_history<N: NoiseSource>(
        &self,
        product: &Product,
        history: &[OutboundMovement],
        forecast_days: u32,
        now: DateTime<Utc>,
        noise: &mut N,
    ) -> ProductForecast {
        let consumption = self.aggregator.aggregate(history, now);
        let rate = consumption.adjusted_daily_consumption;

        let projection = self
            .projector
            .project(product.current_stock, rate, forecast_days, now.date_naive(), noise);
        let stock_out = projection.stock_out().cloned();

        let reorder_suggestion = self
            .advisor
            .advise(product, rate, stock_out.as_ref().map(|p| p.day));

        debug!(
            product = %product.id,
            rate,
            trend = ?consumption.trend,
            stock_out_day = ?stock_out.as_ref().map(|p| p.day),
            urgency = ?reorder_suggestion.urgency,
            "product forecast computed"
        );

        ProductForecast {
            product_id: product.id,
            product_name: product.name.clone(),
            current_stock: product.current_stock,
            reorder_level: product.reorder_level,
            daily_consumption: rate,
            trend: consumption.trend,
            confidence: consumption.confidence,
            stock_out_date: stock_out.as_ref().map(|p| p.date),
            days_until_stock_out: stock_out.map(|p| p.day),
            forecast: projection.truncated(self.config.max_forecast_points),
            reorder_suggestion,
            windows: consumption.windows,
        }
    }

    /// Horizon must be in `1..=max_forecast_days`.
    pub(crate) fn validate_horizon(&self, forecast_days: u32) -> Result<(), ForecastError> {
        validate_days("forecast_days", forecast_days, self.config.max_forecast_days)
    }

    fn noise_for(&self, product_id: ProductId) -> Box<dyn NoiseSource + Send> {
        match self.config.noise {
            NoiseMode::Entropy => Box::new(UniformNoise::from_entropy()),
            NoiseMode::Seeded(seed) => Box::new(UniformNoise::seeded(seed ^ product_id.as_u64())),
            NoiseMode::Disabled => Box::new(NoNoise),
        }
    }
}

fn validate_days(name: &str, days: u32, max: u32) -> Result<(), ForecastError> {
    if days == 0 {
        return Err(ForecastError::invalid_input(format!("{name} must be positive")));
    }
    if days > max {
        return Err(ForecastError::invalid_input(format!("{name} must be at most {max}, got {days}")));
    }
    Ok(())
}
