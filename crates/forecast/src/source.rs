//! Collaborator contracts the engine reads from.
//!
//! The engine stays storage-agnostic: adapters (in-memory, SQL, remote) live
//! in infra and are injected by the caller.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use pharmstock_core::ProductId;
use pharmstock_inventory::{OutboundMovement, Product, ProductFilter};

use crate::error::RepositoryError;

#[async_trait::async_trait]
pub trait ProductRepository: Send + Sync {
    /// Look up one product; `Ok(None)` when the id is unknown.
    async fn get(&self, product_id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Products matching `filter`, at most `limit` of them, in a stable order.
    async fn list(&self, filter: &ProductFilter, limit: usize) -> Result<Vec<Product>, RepositoryError>;
}

#[async_trait::async_trait]
pub trait MovementRepository: Send + Sync {
    /// Outbound movements of a product with `occurred_at >= since`, ascending by timestamp.
    async fn outbound_since(
        &self,
        product_id: ProductId,
        since: DateTime<Utc>,
    ) -> Result<Vec<OutboundMovement>, RepositoryError>;
}

#[async_trait::async_trait]
impl<R> ProductRepository for Arc<R>
where
    R: ProductRepository + ?Sized,
{
    async fn get(&self, product_id: ProductId) -> Result<Option<Product>, RepositoryError> {
        (**self).get(product_id).await
    }

    async fn list(&self, filter: &ProductFilter, limit: usize) -> Result<Vec<Product>, RepositoryError> {
        (**self).list(filter, limit).await
    }
}

#[async_trait::async_trait]
impl<R> MovementRepository for Arc<R>
where
    R: MovementRepository + ?Sized,
{
    async fn outbound_since(
        &self,
        product_id: ProductId,
        since: DateTime<Utc>,
    ) -> Result<Vec<OutboundMovement>, RepositoryError> {
        (**self).outbound_since(product_id, since).await
    }
}
