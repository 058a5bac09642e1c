use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tracing::warn;

use pharmstock_core::ProductId;
use pharmstock_forecast::{MovementRepository, ProductRepository, RepositoryError};
use pharmstock_inventory::{OutboundMovement, Product, ProductFilter};

fn poisoned() -> RepositoryError {
    RepositoryError::Internal("lock poisoned".to_string())
}

/// In-memory product catalog for tests/dev.
///
/// Listing preserves insertion order; re-inserting an id replaces the product in place.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    inner: RwLock<Vec<Product>>,
    fail_listing: AtomicBool,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let repo = Self::new();
        for product in products {
            repo.upsert(product);
        }
        repo
    }

    pub fn upsert(&self, product: Product) {
        let Ok(mut products) = self.inner.write() else {
            warn!(product = %product.id, "product catalog lock poisoned; upsert dropped");
            return;
        };
        match products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => products.push(product),
        }
    }

    /// Make `list` fail until cleared (fault injection).
    pub fn set_listing_unavailable(&self, unavailable: bool) {
        self.fail_listing.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn get(&self, product_id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.inner.read().map_err(|_| poisoned())?;
        Ok(products.iter().find(|p| p.id == product_id).cloned())
    }

    async fn list(&self, filter: &ProductFilter, limit: usize) -> Result<Vec<Product>, RepositoryError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("product catalog offline".to_string()));
        }
        let products = self.inner.read().map_err(|_| poisoned())?;
        Ok(products
            .iter()
            .filter(|p| filter.matches(p))
            .take(limit)
            .cloned()
            .collect())
    }
}

/// In-memory outbound-movement log for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryMovementRepository {
    inner: RwLock<HashMap<ProductId, Vec<OutboundMovement>>>,
    failing: RwLock<HashSet<ProductId>>,
}

impl InMemoryMovementRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_movements(movements: impl IntoIterator<Item = OutboundMovement>) -> Self {
        let repo = Self::new();
        for movement in movements {
            repo.record(movement);
        }
        repo
    }

    /// Append a movement, keeping each product's log ascending by timestamp.
    pub fn record(&self, movement: OutboundMovement) {
        let Ok(mut map) = self.inner.write() else {
            warn!(
                product = %movement.product_id,
                movement = %movement.id,
                "movement log lock poisoned; record dropped"
            );
            return;
        };
        let log = map.entry(movement.product_id).or_default();
        let at = log.partition_point(|m| m.occurred_at <= movement.occurred_at);
        log.insert(at, movement);
    }

    /// Make reads for `product_id` fail until [`recover`](Self::recover) is called.
    pub fn fail_for(&self, product_id: ProductId) {
        match self.failing.write() {
            Ok(mut failing) => {
                failing.insert(product_id);
            }
            Err(_) => warn!(product = %product_id, "fault-injection lock poisoned; fail_for dropped"),
        }
    }

    pub fn recover(&self, product_id: ProductId) {
        match self.failing.write() {
            Ok(mut failing) => {
                failing.remove(&product_id);
            }
            Err(_) => warn!(product = %product_id, "fault-injection lock poisoned; recover dropped"),
        }
    }
}

#[async_trait::async_trait]
impl MovementRepository for InMemoryMovementRepository {
    async fn outbound_since(
        &self,
        product_id: ProductId,
        since: DateTime<Utc>,
    ) -> Result<Vec<OutboundMovement>, RepositoryError> {
        if self.failing.read().map_err(|_| poisoned())?.contains(&product_id) {
            return Err(RepositoryError::Unavailable(format!(
                "movement log unavailable for product {product_id}"
            )));
        }

        let map = self.inner.read().map_err(|_| poisoned())?;
        let Some(log) = map.get(&product_id) else {
            return Ok(vec![]);
        };
        let start = log.partition_point(|m| m.occurred_at < since);
        Ok(log[start..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 10, 10, 0, 0).unwrap()
    }

    fn product(name: &str, stock: u64, level: u64) -> Product {
        Product::new(ProductId::new(), name, stock, level, 1.0).unwrap()
    }

    #[tokio::test]
    async fn list_applies_filter_limit_and_insertion_order() {
        let a = product("Aspirin 75mg", 5, 10);
        let b = product("Bisacodyl 5mg", 50, 10);
        let c = product("Codeine 30mg", 1, 10);
        let repo = InMemoryProductRepository::with_products([a.clone(), b.clone(), c.clone()]);

        let all = repo.list(&ProductFilter::all(), 10).await.unwrap();
        assert_eq!(all, vec![a.clone(), b, c.clone()]);

        let low = repo.list(&ProductFilter::low_stock(), 10).await.unwrap();
        assert_eq!(low, vec![a.clone(), c]);

        let capped = repo.list(&ProductFilter::all(), 1).await.unwrap();
        assert_eq!(capped, vec![a]);
    }

    #[tokio::test]
    async fn upsert_replaces_existing_product() {
        let mut p = product("Aspirin 75mg", 5, 10);
        let repo = InMemoryProductRepository::with_products([p.clone()]);
        p.current_stock = 80;
        repo.upsert(p.clone());

        assert_eq!(repo.get(p.id).await.unwrap(), Some(p));
        assert_eq!(repo.list(&ProductFilter::all(), 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn listing_fault_injection() {
        let repo = InMemoryProductRepository::with_products([product("Aspirin 75mg", 5, 10)]);
        repo.set_listing_unavailable(true);
        assert!(repo.list(&ProductFilter::all(), 10).await.is_err());
        repo.set_listing_unavailable(false);
        assert!(repo.list(&ProductFilter::all(), 10).await.is_ok());
    }

    #[tokio::test]
    async fn movements_are_ordered_and_bounded_by_since() {
        let product_id = ProductId::new();
        let late = OutboundMovement::new(product_id, 3, t0() + Duration::days(3)).unwrap();
        let early = OutboundMovement::new(product_id, 1, t0()).unwrap();
        let mid = OutboundMovement::new(product_id, 2, t0() + Duration::days(1)).unwrap();
        let repo = InMemoryMovementRepository::with_movements([late.clone(), early.clone(), mid.clone()]);

        let everything = repo.outbound_since(product_id, t0()).await.unwrap();
        assert_eq!(everything, vec![early, mid.clone(), late.clone()]);

        let recent = repo.outbound_since(product_id, t0() + Duration::days(1)).await.unwrap();
        assert_eq!(recent, vec![mid, late]);
    }

    fn poison<T: Send + Sync>(lock: &RwLock<T>) {
        std::thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = lock.write().unwrap();
                    panic!("poisoning lock for test");
                })
                .join();
        });
        assert!(lock.is_poisoned());
    }

    #[tokio::test]
    async fn poisoned_catalog_drops_writes_and_fails_reads() {
        let repo = InMemoryProductRepository::new();
        poison(&repo.inner);

        repo.upsert(product("Aspirin 75mg", 5, 10));
        assert!(matches!(
            repo.list(&ProductFilter::all(), 10).await,
            Err(RepositoryError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn poisoned_movement_log_drops_writes_and_fails_reads() {
        let product_id = ProductId::new();
        let repo = InMemoryMovementRepository::new();
        poison(&repo.inner);
        poison(&repo.failing);

        repo.record(OutboundMovement::new(product_id, 2, t0()).unwrap());
        repo.fail_for(product_id);
        repo.recover(product_id);
        assert!(matches!(
            repo.outbound_since(product_id, t0()).await,
            Err(RepositoryError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn unknown_product_has_empty_history() {
        let repo = InMemoryMovementRepository::new();
        assert!(repo.outbound_since(ProductId::new(), t0()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_product_reads_error_until_recovered() {
        let product_id = ProductId::new();
        let repo = InMemoryMovementRepository::new();
        repo.fail_for(product_id);
        assert!(matches!(
            repo.outbound_since(product_id, t0()).await,
            Err(RepositoryError::Unavailable(_))
        ));
        repo.recover(product_id);
        assert!(repo.outbound_since(product_id, t0()).await.is_ok());
    }
}
