//! Single-window consumption statistics.

use serde::{Deserialize, Serialize};

use pharmstock_inventory::OutboundMovement;

/// Second-half mean above `first * INCREASING_RATIO` counts as rising demand.
pub const INCREASING_RATIO: f64 = 1.2;
/// Second-half mean below `first * DECREASING_RATIO` counts as falling demand.
pub const DECREASING_RATIO: f64 = 0.8;

/// Direction of consumption within a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    #[default]
    Stable,
    Increasing,
    Decreasing,
}

impl Trend {
    /// Factor applied to the weighted consumption rate.
    pub fn multiplier(self) -> f64 {
        match self {
            Trend::Stable => 1.0,
            Trend::Increasing => 1.2,
            Trend::Decreasing => 0.8,
        }
    }
}

/// Reliability label of a window estimate.
///
/// Variants are declared in ascending order, so the derived `Ord` is the
/// total order none < very_low < low < medium < high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    None,
    VeryLow,
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn ordinal(self) -> u8 {
        match self {
            Confidence::None => 0,
            Confidence::VeryLow => 1,
            Confidence::Low => 2,
            Confidence::Medium => 3,
            Confidence::High => 4,
        }
    }

    /// Bucket an averaged ordinal back into a label.
    pub fn from_mean_ordinal(mean: f64) -> Self {
        if mean >= 3.5 {
            Confidence::High
        } else if mean >= 2.5 {
            Confidence::Medium
        } else if mean >= 1.5 {
            Confidence::Low
        } else if mean >= 0.5 {
            Confidence::VeryLow
        } else {
            Confidence::None
        }
    }

    /// Confidence backed by `movement_count` data points over `window_days`.
    pub fn for_sample(movement_count: usize, window_days: u32) -> Self {
        match movement_count {
            0 => Confidence::None,
            1..=2 => Confidence::VeryLow,
            3..=6 => Confidence::Low,
            7..=13 => Confidence::Medium,
            _ if window_days >= 30 => Confidence::High,
            _ => Confidence::Medium,
        }
    }
}

/// Consumption statistics over one trailing window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowAnalysis {
    pub window_days: u32,
    /// Total consumed divided by the window length (not by movement count).
    pub average_daily_consumption: f64,
    pub total_consumption: u64,
    pub movement_count: usize,
    pub trend: Trend,
    pub confidence: Confidence,
}

impl WindowAnalysis {
    fn empty(window_days: u32, confidence: Confidence) -> Self {
        Self {
            window_days,
            average_daily_consumption: 0.0,
            total_consumption: 0,
            movement_count: 0,
            trend: Trend::Stable,
            confidence,
        }
    }
}

/// Computes single-window statistics from chronologically ordered movements.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsumptionAnalyzer;

impl ConsumptionAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Statistics for one window as seen by the multi-window aggregator.
    ///
    /// `movements` must already be restricted to the window. An empty window
    /// yields confidence `None` so the aggregator excludes it.
    pub fn analyze_window(&self, movements: &[OutboundMovement], window_days: u32) -> WindowAnalysis {
        if movements.is_empty() {
            return WindowAnalysis::empty(window_days, Confidence::None);
        }

        let total: u64 = movements.iter().map(|m| m.quantity).sum();
        let average = if window_days == 0 {
            0.0
        } else {
            total as f64 / f64::from(window_days)
        };

        WindowAnalysis {
            window_days,
            average_daily_consumption: average,
            total_consumption: total,
            movement_count: movements.len(),
            trend: classify_trend(movements),
            confidence: Confidence::for_sample(movements.len(), window_days),
        }
    }

    /// Statistics for the standalone consumption-analysis surface.
    ///
    /// Unlike [`analyze_window`](Self::analyze_window), a window without any
    /// movements short-circuits to confidence `Low` with a stable trend.
    pub fn analyze_standalone(&self, movements: &[OutboundMovement], window_days: u32) -> WindowAnalysis {
        if movements.is_empty() {
            return WindowAnalysis::empty(window_days, Confidence::Low);
        }
        self.analyze_window(movements, window_days)
    }
}

/// Compare the mean quantity of the second half of the movements against the first.
///
/// The list is split at `len / 2`; with fewer than two movements there is no
/// ratio and the trend is stable.
pub fn classify_trend(movements: &[OutboundMovement]) -> Trend {
    if movements.len() < 2 {
        return Trend::Stable;
    }

    let (first, second) = movements.split_at(movements.len() / 2);
    let first_mean = mean_quantity(first);
    let second_mean = mean_quantity(second);

    if first_mean <= 0.0 {
        return Trend::Stable;
    }

    let ratio = second_mean / first_mean;
    if ratio > INCREASING_RATIO {
        Trend::Increasing
    } else if ratio < DECREASING_RATIO {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

fn mean_quantity(movements: &[OutboundMovement]) -> f64 {
    if movements.is_empty() {
        return 0.0;
    }
    movements.iter().map(|m| m.quantity as f64).sum::<f64>() / movements.len() as f64
}
