//! Reorder point, order quantity, urgency and cost.

use serde::{Deserialize, Serialize};

use pharmstock_inventory::Product;

use crate::config::ForecastConfig;

/// Stock-out within this many days is urgent.
pub const HIGH_URGENCY_DAYS: u32 = 14;
/// Stock-out within this many days needs attention soon.
pub const MEDIUM_URGENCY_DAYS: u32 = 30;

/// How soon a reorder is needed. Ordered low < medium < high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn from_stock_out_day(day: Option<u32>) -> Self {
        match day {
            Some(d) if d <= HIGH_URGENCY_DAYS => Urgency::High,
            Some(d) if d <= MEDIUM_URGENCY_DAYS => Urgency::Medium,
            _ => Urgency::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderSuggestion {
    pub should_reorder: bool,
    pub reorder_point: f64,
    pub suggested_order_quantity: f64,
    pub urgency: Urgency,
    /// Rounded to whole currency units.
    pub estimated_cost: f64,
    pub lead_time_days: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct ReorderAdvisor {
    lead_time_days: u32,
    safety_stock_days: u32,
    order_cover_days: u32,
}

impl Default for ReorderAdvisor {
    fn default() -> Self {
        Self::from_config(&ForecastConfig::default())
    }
}

impl ReorderAdvisor {
    pub fn from_config(config: &ForecastConfig) -> Self {
        Self {
            lead_time_days: config.lead_time_days,
            safety_stock_days: config.safety_stock_days,
            order_cover_days: config.order_cover_days,
        }
    }

    pub fn safety_stock(&self, daily_consumption: f64) -> f64 {
        daily_consumption * f64::from(self.safety_stock_days)
    }

    /// `daily * lead_time + safety_stock`.
    pub fn reorder_point(&self, daily_consumption: f64) -> f64 {
        daily_consumption * f64::from(self.lead_time_days) + self.safety_stock(daily_consumption)
    }

    pub fn advise(&self, product: &Product, daily_consumption: f64, stock_out_day: Option<u32>) -> ReorderSuggestion {
        let daily = daily_consumption.max(0.0);
        let reorder_point = self.reorder_point(daily);
        let suggested_order_quantity = daily * f64::from(self.order_cover_days);

        ReorderSuggestion {
            should_reorder: product.current_stock as f64 <= reorder_point,
            reorder_point,
            suggested_order_quantity,
            urgency: Urgency::from_stock_out_day(stock_out_day),
            estimated_cost: (suggested_order_quantity * product.unit_cost).round(),
            lead_time_days: self.lead_time_days,
        }
    }
}
