use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use pharmstock_forecast::{
    BulkForecastOrchestrator, BulkForecastReport, BulkForecastRequest, CancellationSignal, MovementRepository,
    ProductRepository,
};

/// Destination for scan reports (notification fan-out, dashboards, audit).
pub trait ForecastReportSink: Send + Sync + 'static {
    fn emit(&self, report: BulkForecastReport);
}

/// In-memory sink for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryForecastReportSink {
    inner: Mutex<Vec<BulkForecastReport>>,
}

impl InMemoryForecastReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<BulkForecastReport> {
        self.inner.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ForecastReportSink for InMemoryForecastReportSink {
    fn emit(&self, report: BulkForecastReport) {
        if let Ok(mut reports) = self.inner.lock() {
            reports.push(report);
        }
    }
}

/// Config for the periodic reorder scan.
#[derive(Debug, Clone)]
pub struct ReorderScanRunner {
    pub interval: Duration,
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub request: BulkForecastRequest,
}

impl Default for ReorderScanRunner {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            max_retries: 5,
            base_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(30),
            request: BulkForecastRequest::default(),
        }
    }
}

/// Handle for a running scan task (shutdown + trigger hook).
#[derive(Debug)]
pub struct ReorderScanRunnerHandle {
    shutdown: watch::Sender<bool>,
    trigger: mpsc::Sender<()>,
    join: Option<JoinHandle<()>>,
}

impl ReorderScanRunnerHandle {
    /// Request a scan outside the schedule (e.g. after a large distribution).
    ///
    /// Triggers are coalesced: if one is already pending this is a no-op.
    pub fn trigger(&self) {
        let _ = self.trigger.try_send(());
    }

    /// Stop the runner, cancelling an in-flight scan, and wait for it to exit.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }
}

impl ReorderScanRunner {
    /// Spawn the scan loop on the current tokio runtime.
    ///
    /// - Schedule: runs immediately, then every `interval`
    /// - Event-trigger: `handle.trigger()`
    /// - Failures: logged + retried with bounded exponential backoff; never propagate
    pub fn spawn<P, M, S>(
        &self,
        name: &'static str,
        orchestrator: BulkForecastOrchestrator<P, M>,
        sink: Arc<S>,
    ) -> ReorderScanRunnerHandle
    where
        P: ProductRepository + 'static,
        M: MovementRepository + 'static,
        S: ForecastReportSink,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (trigger_tx, trigger_rx) = mpsc::channel::<()>(1);

        let cfg = self.clone();
        let join = tokio::spawn(runner_loop(name, cfg, shutdown_rx, trigger_rx, orchestrator, sink));

        ReorderScanRunnerHandle {
            shutdown: shutdown_tx,
            trigger: trigger_tx,
            join: Some(join),
        }
    }
}

async fn runner_loop<P, M, S>(
    name: &'static str,
    cfg: ReorderScanRunner,
    mut shutdown_rx: watch::Receiver<bool>,
    mut trigger_rx: mpsc::Receiver<()>,
    orchestrator: BulkForecastOrchestrator<P, M>,
    sink: Arc<S>,
) where
    P: ProductRepository + 'static,
    M: MovementRepository + 'static,
    S: ForecastReportSink,
{
    info!(runner = name, interval_secs = cfg.interval.as_secs(), "reorder scan runner started");

    let cancel = CancellationSignal::from_receiver(shutdown_rx.clone());
    let mut ticker = tokio::time::interval(cfg.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            // Shutdown has priority; a dropped handle also stops the runner.
            _ = stop_requested(&mut shutdown_rx) => break,
            _ = ticker.tick() => {}
            Some(()) = trigger_rx.recv() => {}
        }

        // Coalesce triggers that arrived while waiting.
        while trigger_rx.try_recv().is_ok() {}

        if scan_with_retries(name, &cfg, &orchestrator, sink.as_ref(), &cancel).await == ScanOutcome::Stopped {
            break;
        }
    }

    info!(runner = name, "reorder scan runner stopped");
}

async fn stop_requested(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

#[derive(Debug, PartialEq, Eq)]
enum ScanOutcome {
    Done,
    Stopped,
}

async fn scan_with_retries<P, M, S>(
    name: &'static str,
    cfg: &ReorderScanRunner,
    orchestrator: &BulkForecastOrchestrator<P, M>,
    sink: &S,
    cancel: &CancellationSignal,
) -> ScanOutcome
where
    P: ProductRepository,
    M: MovementRepository,
    S: ForecastReportSink,
{
    let mut failures: u32 = 0;

    loop {
        match orchestrator.forecast_many_until(cfg.request, cancel.clone()).await {
            Ok(report) => {
                let cancelled = report.cancelled;
                sink.emit(report);
                return if cancelled { ScanOutcome::Stopped } else { ScanOutcome::Done };
            }
            Err(e) => {
                failures += 1;
                if failures > cfg.max_retries {
                    warn!(runner = name, error = %e, failures, "reorder scan failed; waiting for next schedule");
                    return ScanOutcome::Done;
                }
                warn!(runner = name, error = %e, failures, "reorder scan failed; retrying");

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return ScanOutcome::Stopped,
                    _ = tokio::time::sleep(backoff(cfg.base_backoff, cfg.max_backoff, failures)) => {}
                }
            }
        }
    }
}

/// `base * 2^(attempt-1)`, capped at `max`.
fn backoff(base: Duration, max: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(max)
}
