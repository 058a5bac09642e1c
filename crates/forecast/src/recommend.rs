//! Reorder-recommendation view over a set of forecasts.

use serde::{Deserialize, Serialize};

use pharmstock_core::ProductId;

use crate::engine::ProductForecast;
use crate::reorder::Urgency;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderRecommendation {
    pub product_id: ProductId,
    pub product_name: String,
    pub current_stock: u64,
    pub urgency: Urgency,
    pub days_until_stock_out: Option<u32>,
    pub suggested_order_quantity: f64,
    pub estimated_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderRecommendations {
    /// Most urgent first; within a tier, soonest stock-out first.
    pub items: Vec<ReorderRecommendation>,
    pub total_estimated_cost: f64,
}

impl ReorderRecommendations {
    /// Forecasts that call for a reorder with urgency at least `min_urgency`.
    pub fn from_forecasts(forecasts: &[ProductForecast], min_urgency: Urgency) -> Self {
        let mut items: Vec<ReorderRecommendation> = forecasts
            .iter()
            .filter(|f| f.reorder_suggestion.should_reorder && f.reorder_suggestion.urgency >= min_urgency)
            .map(|f| ReorderRecommendation {
                product_id: f.product_id,
                product_name: f.product_name.clone(),
                current_stock: f.current_stock,
                urgency: f.reorder_suggestion.urgency,
                days_until_stock_out: f.days_until_stock_out,
                suggested_order_quantity: f.reorder_suggestion.suggested_order_quantity,
                estimated_cost: f.reorder_suggestion.estimated_cost,
            })
            .collect();

        items.sort_by_key(|r| {
            (
                std::cmp::Reverse(r.urgency),
                r.days_until_stock_out.is_none(),
                r.days_until_stock_out,
            )
        });

        let total_estimated_cost = items.iter().map(|r| r.estimated_cost).sum();
        Self {
            items,
            total_estimated_cost,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
