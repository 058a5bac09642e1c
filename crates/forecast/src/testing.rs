//! Repository doubles shared by the engine and orchestrator tests.

use std::collections::HashSet;

use chrono::{DateTime, Duration, TimeZone, Utc};

use pharmstock_core::ProductId;
use pharmstock_inventory::{OutboundMovement, Product, ProductFilter};

use crate::error::RepositoryError;
use crate::source::{MovementRepository, ProductRepository};

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 15, 17, 30, 0).unwrap()
}

pub fn product(name: &str, current_stock: u64, reorder_level: u64, unit_cost: f64) -> Product {
    Product::new(ProductId::new(), name, current_stock, reorder_level, unit_cost).unwrap()
}

/// One movement of `quantity` per day for the `days` days before [`fixed_now`].
pub fn steady_history(product_id: ProductId, days: i64, quantity: u64) -> Vec<OutboundMovement> {
    (1..=days)
        .rev()
        .map(|d| OutboundMovement::new(product_id, quantity, fixed_now() - Duration::days(d)).unwrap())
        .collect()
}

pub struct StubProducts {
    products: Vec<Product>,
}

impl StubProducts {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

#[async_trait::async_trait]
impl ProductRepository for StubProducts {
    async fn get(&self, product_id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.iter().find(|p| p.id == product_id).cloned())
    }

    async fn list(&self, filter: &ProductFilter, limit: usize) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .products
            .iter()
            .filter(|p| filter.matches(p))
            .take(limit)
            .cloned()
            .collect())
    }
}

pub struct StubMovements {
    movements: Vec<OutboundMovement>,
    failing: HashSet<ProductId>,
    stalled: HashSet<ProductId>,
}

impl StubMovements {
    pub fn new(movements: Vec<OutboundMovement>) -> Self {
        Self {
            movements,
            failing: HashSet::new(),
            stalled: HashSet::new(),
        }
    }

    pub fn failing_for(mut self, product_id: ProductId) -> Self {
        self.failing.insert(product_id);
        self
    }

    /// Reads for `product_id` never complete.
    pub fn stalled_for(mut self, product_id: ProductId) -> Self {
        self.stalled.insert(product_id);
        self
    }
}

#[async_trait::async_trait]
impl MovementRepository for StubMovements {
    async fn outbound_since(
        &self,
        product_id: ProductId,
        since: DateTime<Utc>,
    ) -> Result<Vec<OutboundMovement>, RepositoryError> {
        if self.stalled.contains(&product_id) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(&product_id) {
            return Err(RepositoryError::Unavailable(format!("movement log offline for {product_id}")));
        }
        Ok(self
            .movements
            .iter()
            .filter(|m| m.product_id == product_id && m.occurred_at >= since)
            .cloned()
            .collect())
    }
}
