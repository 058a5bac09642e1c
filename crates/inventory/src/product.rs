use serde::{Deserialize, Serialize};

use pharmstock_core::{DomainError, DomainResult, ProductId};

/// Read-only snapshot of a stocked product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Units currently on hand.
    pub current_stock: u64,
    /// Stock level at which the product counts as "low stock".
    pub reorder_level: u64,
    /// Purchase cost of one unit.
    pub unit_cost: f64,
}

impl Product {
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        current_stock: u64,
        reorder_level: u64,
        unit_cost: f64,
    ) -> DomainResult<Self> {
        let product = Self {
            id,
            name: name.into(),
            current_stock,
            reorder_level,
            unit_cost,
        };
        product.validate()?;
        Ok(product)
    }

    /// Re-check invariants of a snapshot that was built without `new`
    /// (e.g. deserialized from a file).
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if !(self.unit_cost.is_finite() && self.unit_cost >= 0.0) {
            return Err(DomainError::validation(format!(
                "unit cost must be a finite non-negative number (product {})",
                self.id
            )));
        }
        Ok(())
    }

    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.reorder_level
    }
}

/// Selection criteria for product listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Only products whose current stock is at or below their reorder level.
    pub low_stock_only: bool,
}

impl ProductFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn low_stock() -> Self {
        Self {
            low_stock_only: true,
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        !self.low_stock_only || product.is_low_stock()
    }
}
