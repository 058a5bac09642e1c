//! JSON inventory snapshot: `{"products": [...], "movements": [...]}`.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pharmstock_core::{MovementId, ProductId};
use pharmstock_infra::{InMemoryMovementRepository, InMemoryProductRepository};
use pharmstock_inventory::{OutboundMovement, Product};

/// Movement as stored in a snapshot; `id` is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    #[serde(default)]
    pub id: Option<MovementId>,
    pub product_id: ProductId,
    pub quantity: u64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub products: Vec<Product>,
    #[serde(default)]
    pub movements: Vec<MovementRecord>,
}

impl Snapshot {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading snapshot {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid snapshot {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(raw)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Every product valid with a unique id; every movement positive and
    /// attached to a known product.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut ids = HashSet::new();
        for product in &self.products {
            product.validate()?;
            if !ids.insert(product.id) {
                bail!("duplicate product id {}", product.id);
            }
        }
        for movement in &self.movements {
            if !ids.contains(&movement.product_id) {
                bail!("movement references unknown product {}", movement.product_id);
            }
            if movement.quantity == 0 {
                bail!("movement for product {} has zero quantity", movement.product_id);
            }
        }
        Ok(())
    }

    pub fn into_repositories(self) -> anyhow::Result<(InMemoryProductRepository, InMemoryMovementRepository)> {
        let movements = self
            .movements
            .into_iter()
            .map(|record| {
                let mut movement = OutboundMovement::new(record.product_id, record.quantity, record.occurred_at)?;
                if let Some(id) = record.id {
                    movement.id = id;
                }
                Ok(movement)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok((
            InMemoryProductRepository::with_products(self.products),
            InMemoryMovementRepository::with_movements(movements),
        ))
    }
}
