use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pharmstock_core::{DomainError, DomainResult, MovementId, ProductId};

/// Historical outbound stock movement (dispense, distribution, write-off).
///
/// Immutable fact; the forecasting engine only ever reads these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMovement {
    pub id: MovementId,
    pub product_id: ProductId,
    /// Units that left stock (always > 0).
    pub quantity: u64,
    pub occurred_at: DateTime<Utc>,
}

impl OutboundMovement {
    pub fn new(product_id: ProductId, quantity: u64, occurred_at: DateTime<Utc>) -> DomainResult<Self> {
        let movement = Self {
            id: MovementId::new(),
            product_id,
            quantity,
            occurred_at,
        };
        movement.validate()?;
        Ok(movement)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity == 0 {
            return Err(DomainError::validation(format!(
                "outbound movement {} has zero quantity",
                self.id
            )));
        }
        Ok(())
    }
}

/// Order movements ascending by timestamp (stable for equal timestamps).
pub fn sort_chronologically(movements: &mut [OutboundMovement]) {
    movements.sort_by_key(|m| m.occurred_at);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn rejects_zero_quantity() {
        let err = OutboundMovement::new(ProductId::new(), 0, t0()).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for zero quantity"),
        }
    }

    #[test]
    fn sorts_ascending_and_keeps_ties_in_place() {
        let product_id = ProductId::new();
        let late = OutboundMovement::new(product_id, 3, t0() + Duration::days(2)).unwrap();
        let tie_a = OutboundMovement::new(product_id, 1, t0()).unwrap();
        let tie_b = OutboundMovement::new(product_id, 2, t0()).unwrap();

        let mut movements = vec![late.clone(), tie_a.clone(), tie_b.clone()];
        sort_chronologically(&mut movements);

        assert_eq!(movements, vec![tie_a, tie_b, late]);
    }
}
