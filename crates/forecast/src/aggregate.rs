//! Multi-window consumption estimate.
//!
//! One read of the longest window is partitioned in memory into the shorter
//! trailing windows. Each window is analyzed independently, then combined:
//!
//! - windows with confidence above `very_low` contribute `average * weight`,
//!   normalized by the sum of contributing weights;
//! - the 14-day window alone decides the trend, which scales the rate;
//! - overall confidence is the bucketed mean ordinal of all windows.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use pharmstock_inventory::{OutboundMovement, sort_chronologically};

use crate::analysis::{Confidence, ConsumptionAnalyzer, Trend, WindowAnalysis};

/// A trailing window and its share of the weighted estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsumptionWindow {
    pub days: u32,
    pub weight: f64,
}

pub const WINDOWS: [ConsumptionWindow; 4] = [
    ConsumptionWindow { days: 7, weight: 0.4 },
    ConsumptionWindow { days: 14, weight: 0.3 },
    ConsumptionWindow { days: 30, weight: 0.2 },
    ConsumptionWindow { days: 60, weight: 0.1 },
];

/// Window whose trend drives the rate adjustment.
pub const TREND_WINDOW_DAYS: u32 = 14;

/// Longest window; the single history read covers this many days.
pub const HISTORY_DAYS: u32 = 60;

/// Combined consumption estimate for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedConsumption {
    /// Weighted rate after the trend multiplier.
    pub adjusted_daily_consumption: f64,
    /// Weighted rate before the trend multiplier.
    pub weighted_daily_consumption: f64,
    pub trend: Trend,
    pub confidence: Confidence,
    pub windows: Vec<WindowAnalysis>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MultiWindowAggregator {
    analyzer: ConsumptionAnalyzer,
}

impl MultiWindowAggregator {
    pub fn new(analyzer: ConsumptionAnalyzer) -> Self {
        Self { analyzer }
    }

    /// Earliest timestamp any window needs.
    pub fn history_start(now: DateTime<Utc>) -> DateTime<Utc> {
        window_start(now, HISTORY_DAYS)
    }

    /// Analyze every window over `history` (movements since [`history_start`](Self::history_start))
    /// and combine them.
    pub fn aggregate(&self, history: &[OutboundMovement], now: DateTime<Utc>) -> AggregatedConsumption {
        let mut ordered = history.to_vec();
        sort_chronologically(&mut ordered);

        let windows = WINDOWS
            .iter()
            .map(|w| {
                let slice = window_slice(&ordered, now, w.days);
                self.analyzer.analyze_window(&slice, w.days)
            })
            .collect();

        combine(windows)
    }
}

/// Combine per-window analyses into one estimate.
///
/// Windows whose length is not listed in [`WINDOWS`] carry no weight but still
/// count towards overall confidence.
pub fn combine(windows: Vec<WindowAnalysis>) -> AggregatedConsumption {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for analysis in windows.iter().filter(|a| a.confidence > Confidence::VeryLow) {
        let weight = weight_for(analysis.window_days);
        weighted_sum += analysis.average_daily_consumption * weight;
        weight_total += weight;
    }

    let weighted = if weight_total > 0.0 {
        weighted_sum / weight_total
    } else {
        0.0
    };

    let trend = windows
        .iter()
        .find(|a| a.window_days == TREND_WINDOW_DAYS)
        .map(|a| a.trend)
        .unwrap_or_default();

    let confidence = overall_confidence(&windows);

    debug!(
        weighted,
        ?trend,
        ?confidence,
        contributing_weight = weight_total,
        "combined consumption windows"
    );

    AggregatedConsumption {
        adjusted_daily_consumption: weighted * trend.multiplier(),
        weighted_daily_consumption: weighted,
        trend,
        confidence,
        windows,
    }
}

/// Mean confidence ordinal over all windows, bucketed.
pub fn overall_confidence(windows: &[WindowAnalysis]) -> Confidence {
    if windows.is_empty() {
        return Confidence::None;
    }
    let sum: u32 = windows.iter().map(|a| u32::from(a.confidence.ordinal())).sum();
    Confidence::from_mean_ordinal(f64::from(sum) / windows.len() as f64)
}

fn weight_for(days: u32) -> f64 {
    WINDOWS
        .iter()
        .find(|w| w.days == days)
        .map(|w| w.weight)
        .unwrap_or(0.0)
}

pub(crate) fn window_start(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now - Duration::days(i64::from(days))
}

/// Movements with `now - days <= occurred_at <= now`, keeping input order.
pub fn window_slice(movements: &[OutboundMovement], now: DateTime<Utc>, days: u32) -> Vec<OutboundMovement> {
    let since = window_start(now, days);
    movements
        .iter()
        .filter(|m| m.occurred_at >= since && m.occurred_at <= now)
        .cloned()
        .collect()
}
