//! Forecasting across a product set.
//!
//! Per-product runs are independent and execute concurrently (bounded by
//! `ForecastConfig::concurrency`). A failure for one product is logged and
//! recorded in the report; it never aborts the batch. Only the final list is
//! ordered, as a post-processing step.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use pharmstock_core::ProductId;
use pharmstock_inventory::ProductFilter;

use crate::engine::{ForecastEngine, ProductForecast};
use crate::error::ForecastError;
use crate::source::{MovementRepository, ProductRepository};

/// Stock-out within this many days marks a product as critical.
pub const CRITICAL_STOCK_OUT_DAYS: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkForecastRequest {
    pub filter: ProductFilter,
    pub forecast_days: u32,
    /// Maximum number of products selected.
    pub limit: usize,
}

impl Default for BulkForecastRequest {
    fn default() -> Self {
        Self {
            filter: ProductFilter::all(),
            forecast_days: 30,
            limit: 50,
        }
    }
}

/// A product skipped during a bulk run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedForecast {
    pub product_id: ProductId,
    pub product_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkForecastReport {
    pub generated_at: DateTime<Utc>,
    pub total_forecasts: usize,
    /// Forecasts stocking out within [`CRITICAL_STOCK_OUT_DAYS`].
    pub critical_products: usize,
    /// Forecasts whose suggestion says to reorder.
    pub low_stock_products: usize,
    /// Ascending by days until stock-out; forecasts without a stock-out come last.
    pub forecasts: Vec<ProductForecast>,
    pub failed: Vec<FailedForecast>,
    /// Set when the run was cancelled before every product finished.
    pub cancelled: bool,
}

/// Requests cancellation of the bulk runs observing the paired [`CancellationSignal`].
#[derive(Debug)]
pub struct CancellationHandle {
    tx: watch::Sender<bool>,
}

impl CancellationHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Cancellation flag observed by a bulk run.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    rx: watch::Receiver<bool>,
}

impl CancellationSignal {
    pub fn channel() -> (CancellationHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (CancellationHandle { tx }, Self { rx })
    }

    /// Wrap an existing shutdown channel (`true` means stop).
    pub fn from_receiver(rx: watch::Receiver<bool>) -> Self {
        Self { rx }
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; pends forever if the handle is
    /// dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

pub struct BulkForecastOrchestrator<P, M> {
    engine: Arc<ForecastEngine<P, M>>,
}

impl<P, M> Clone for BulkForecastOrchestrator<P, M> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<P, M> BulkForecastOrchestrator<P, M>
where
    P: ProductRepository,
    M: MovementRepository,
{
    pub fn new(engine: Arc<ForecastEngine<P, M>>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ForecastEngine<P, M> {
        &self.engine
    }

    pub async fn forecast_many(&self, request: BulkForecastRequest) -> Result<BulkForecastReport, ForecastError> {
        self.forecast_many_until(request, CancellationSignal::never()).await
    }

    /// Like [`forecast_many`](Self::forecast_many), aborting unfinished product
    /// runs once `cancel` fires. Completed forecasts are kept.
    ///
    /// Fails only when product selection itself fails.
    pub async fn forecast_many_until(
        &self,
        request: BulkForecastRequest,
        cancel: CancellationSignal,
    ) -> Result<BulkForecastReport, ForecastError> {
        self.engine.validate_horizon(request.forecast_days)?;

        let mut products = self.engine.products().list(&request.filter, request.limit).await?;
        products.truncate(request.limit);

        let now = self.engine.now();
        let engine = &self.engine;
        let concurrency = engine.config().concurrency.max(1);

        let mut outcomes: Vec<_> = stream::iter(products.into_iter().enumerate())
            .map(|(idx, product)| {
                let cancel = cancel.clone();
                async move {
                    let outcome = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Err(ForecastError::Cancelled),
                        result = engine.forecast_loaded(&product, request.forecast_days, now) => result,
                    };
                    (idx, product, outcome)
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        // Restore selection order so ties keep a stable relative order.
        outcomes.sort_by_key(|(idx, _, _)| *idx);

        let mut forecasts = Vec::with_capacity(outcomes.len());
        let mut failed = Vec::new();
        let mut cancelled = false;

        for (_, product, outcome) in outcomes {
            match outcome {
                Ok(forecast) => forecasts.push(forecast),
                Err(ForecastError::Cancelled) => cancelled = true,
                Err(e) => {
                    warn!(product = %product.id, error = %e, "skipping product in bulk forecast");
                    failed.push(FailedForecast {
                        product_id: product.id,
                        product_name: product.name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        rank_forecasts(&mut forecasts);
        let report = summarize(now, forecasts, failed, cancelled);

        info!(
            total = report.total_forecasts,
            critical = report.critical_products,
            low_stock = report.low_stock_products,
            failed = report.failed.len(),
            cancelled = report.cancelled,
            "bulk forecast finished"
        );

        Ok(report)
    }
}

/// Sort ascending by days until stock-out; forecasts without one go last.
/// The sort is stable.
pub fn rank_forecasts(forecasts: &mut [ProductForecast]) {
    forecasts.sort_by_key(|f| (f.days_until_stock_out.is_none(), f.days_until_stock_out));
}

fn summarize(
    generated_at: DateTime<Utc>,
    forecasts: Vec<ProductForecast>,
    failed: Vec<FailedForecast>,
    cancelled: bool,
) -> BulkForecastReport {
    let critical_products = forecasts
        .iter()
        .filter(|f| matches!(f.days_until_stock_out, Some(d) if d <= CRITICAL_STOCK_OUT_DAYS))
        .count();
    let low_stock_products = forecasts
        .iter()
        .filter(|f| f.reorder_suggestion.should_reorder)
        .count();

    BulkForecastReport {
        generated_at,
        total_forecasts: forecasts.len(),
        critical_products,
        low_stock_products,
        forecasts,
        failed,
        cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ForecastConfig, NoiseMode};
    use crate::reorder::{ReorderSuggestion, Urgency};
    use crate::testing::{StubMovements, StubProducts, fixed_now, product, steady_history};
    use crate::analysis::{Confidence, Trend};
    use pharmstock_core::FixedClock;
    use pharmstock_inventory::{OutboundMovement, Product};

    fn forecast_with(days: Option<u32>, should_reorder: bool) -> ProductForecast {
        ProductForecast {
            product_id: ProductId::new(),
            product_name: "Test".to_string(),
            current_stock: 10,
            reorder_level: 5,
            daily_consumption: 1.0,
            trend: Trend::Stable,
            confidence: Confidence::Low,
            stock_out_date: None,
            days_until_stock_out: days,
            forecast: vec![],
            reorder_suggestion: ReorderSuggestion {
                should_reorder,
                reorder_point: 10.0,
                suggested_order_quantity: 30.0,
                urgency: Urgency::from_stock_out_day(days),
                estimated_cost: 30.0,
                lead_time_days: 7,
            },
            windows: vec![],
        }
    }

    fn orchestrator(
        products: Vec<Product>,
        movements: StubMovements,
    ) -> BulkForecastOrchestrator<StubProducts, StubMovements> {
        let engine = ForecastEngine::new(
            StubProducts::new(products),
            movements,
            Arc::new(FixedClock::new(fixed_now())),
            ForecastConfig::default()
                .with_noise(NoiseMode::Disabled)
                .with_concurrency(3),
        );
        BulkForecastOrchestrator::new(Arc::new(engine))
    }

    #[test]
    fn ranking_puts_missing_stock_out_last() {
        let mut forecasts = vec![
            forecast_with(Some(20), false),
            forecast_with(None, false),
            forecast_with(Some(5), false),
        ];
        rank_forecasts(&mut forecasts);
        let days: Vec<Option<u32>> = forecasts.iter().map(|f| f.days_until_stock_out).collect();
        assert_eq!(days, vec![Some(5), Some(20), None]);
    }

    #[test]
    fn ranking_is_stable_among_entries_without_stock_out() {
        let a = forecast_with(None, false);
        let b = forecast_with(None, false);
        let mut forecasts = vec![a.clone(), forecast_with(Some(3), false), b.clone()];
        rank_forecasts(&mut forecasts);
        assert_eq!(forecasts[1].product_id, a.product_id);
        assert_eq!(forecasts[2].product_id, b.product_id);
    }

    #[test]
    fn summary_counts_critical_and_low_stock() {
        let report = summarize(
            fixed_now(),
            vec![
                forecast_with(Some(7), true),
                forecast_with(Some(8), true),
                forecast_with(None, false),
            ],
            vec![],
            false,
        );
        assert_eq!(report.total_forecasts, 3);
        assert_eq!(report.critical_products, 1);
        assert_eq!(report.low_stock_products, 2);
    }

    #[tokio::test]
    async fn failing_product_is_skipped_not_fatal() {
        let fast = product("Ondansetron 4mg", 30, 10, 1.0);
        let broken = product("Heparin 5000IU", 50, 10, 4.0);
        let idle = product("Vitamin D3", 500, 20, 0.1);

        let mut history: Vec<OutboundMovement> = steady_history(fast.id, 30, 6);
        history.extend(steady_history(broken.id, 30, 1));

        let orchestrator = orchestrator(
            vec![idle.clone(), broken.clone(), fast.clone()],
            StubMovements::new(history).failing_for(broken.id),
        );

        let report = orchestrator.forecast_many(BulkForecastRequest::default()).await.unwrap();

        assert_eq!(report.total_forecasts, 2);
        assert_eq!(report.forecasts[0].product_id, fast.id);
        assert_eq!(report.forecasts[1].product_id, idle.id);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].product_id, broken.id);
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn low_stock_filter_and_limit_select_products() {
        let low_a = product("Warfarin 5mg", 5, 10, 0.4);
        let healthy = product("Loratadine", 400, 10, 0.2);
        let low_b = product("Prednisolone 5mg", 2, 10, 0.3);
        let low_c = product("Furosemide 40mg", 10, 10, 0.3);

        let orchestrator = orchestrator(
            vec![low_a.clone(), healthy, low_b.clone(), low_c],
            StubMovements::new(vec![]),
        );

        let report = orchestrator
            .forecast_many(BulkForecastRequest {
                filter: ProductFilter::low_stock(),
                forecast_days: 30,
                limit: 2,
            })
            .await
            .unwrap();

        let ids: Vec<ProductId> = report.forecasts.iter().map(|f| f.product_id).collect();
        assert_eq!(ids, vec![low_a.id, low_b.id]);
    }

    #[tokio::test]
    async fn critical_count_reflects_projected_stock_out() {
        // 6/day with 30 on hand -> stock-out on day 5.
        let fast = product("Ondansetron 4mg", 30, 10, 1.0);
        let orchestrator = orchestrator(vec![fast.clone()], StubMovements::new(steady_history(fast.id, 60, 6)));

        let report = orchestrator.forecast_many(BulkForecastRequest::default()).await.unwrap();
        assert_eq!(report.forecasts[0].days_until_stock_out, Some(5));
        assert_eq!(report.critical_products, 1);
        assert_eq!(report.low_stock_products, 1);
    }

    #[tokio::test]
    async fn cancelled_before_start_keeps_no_forecasts() {
        let a = product("Ramipril 5mg", 60, 10, 0.3);
        let b = product("Bisoprolol 5mg", 60, 10, 0.3);
        let orchestrator = orchestrator(vec![a, b], StubMovements::new(vec![]));

        let (handle, signal) = CancellationSignal::channel();
        handle.cancel();

        let report = orchestrator
            .forecast_many_until(BulkForecastRequest::default(), signal)
            .await
            .unwrap();
        assert!(report.cancelled);
        assert_eq!(report.total_forecasts, 0);
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn zero_horizon_is_rejected() {
        let orchestrator = orchestrator(vec![], StubMovements::new(vec![]));
        let request = BulkForecastRequest {
            forecast_days: 0,
            ..BulkForecastRequest::default()
        };
        assert!(matches!(
            orchestrator.forecast_many(request).await,
            Err(ForecastError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn cancel_mid_run_keeps_completed_forecasts() {
        let quick = product("Doxycycline 100mg", 80, 10, 0.6);
        let stuck = product("Clopidogrel 75mg", 40, 10, 0.9);
        let orchestrator = orchestrator(
            vec![quick.clone(), stuck.clone()],
            StubMovements::new(steady_history(quick.id, 30, 2)).stalled_for(stuck.id),
        );

        let (handle, signal) = CancellationSignal::channel();
        let run = tokio::spawn({
            let orchestrator = orchestrator.clone();
            async move {
                orchestrator
                    .forecast_many_until(BulkForecastRequest::default(), signal)
                    .await
            }
        });

        // Let the quick product finish while the other read is still pending.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!run.is_finished());
        handle.cancel();

        let report = tokio::time::timeout(std::time::Duration::from_secs(5), run)
            .await
            .expect("bulk run did not observe cancellation")
            .unwrap()
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.total_forecasts, 1);
        assert_eq!(report.forecasts[0].product_id, quick.id);
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn horizon_above_maximum_is_rejected() {
        let orchestrator = orchestrator(vec![], StubMovements::new(vec![]));
        let request = BulkForecastRequest {
            forecast_days: u32::MAX,
            ..BulkForecastRequest::default()
        };
        assert!(matches!(
            orchestrator.forecast_many(request).await,
            Err(ForecastError::InvalidInput(_))
        ));
    }

    #[test]
    fn never_signal_is_not_cancelled() {
        assert!(!CancellationSignal::never().is_cancelled());
    }
}
