use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clinerp_core::{DomainError, DomainResult, EntityId, TenantId};
use clinerp_products::{Product, ProductId};

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    In,
    Out,
}

/// Reference to the business object that caused a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum StockRef {
    Order(EntityId),
    PurchaseOrder(EntityId),
    /// Manual correction or opening stock.
    Adjustment,
}

/// One audit row per stock change.
///
/// There is no direct stock write anywhere: every mutation of a product's
/// on-hand count goes through [`issue`] or [`receive`], which return the
/// movement paired with the updated product. Σin − Σout over a product's
/// movements always reconciles with its current stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: EntityId,
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub direction: MovementDirection,
    pub quantity: i64,
    pub reference: StockRef,
    pub occurred_at: DateTime<Utc>,
}

/// Take `quantity` out of stock.
///
/// Fails with insufficient-stock when on-hand is short — the count is never
/// clamped. Callers persist the returned product and movement together or not
/// at all.
pub fn issue(
    product: &Product,
    quantity: i64,
    reference: StockRef,
    at: DateTime<Utc>,
) -> DomainResult<(Product, StockMovement)> {
    validate_quantity(quantity)?;
    let updated = product.adjusted(-quantity)?;
    Ok((
        updated,
        movement(product, MovementDirection::Out, quantity, reference, at),
    ))
}

/// Put `quantity` into stock.
pub fn receive(
    product: &Product,
    quantity: i64,
    reference: StockRef,
    at: DateTime<Utc>,
) -> DomainResult<(Product, StockMovement)> {
    validate_quantity(quantity)?;
    let updated = product.adjusted(quantity)?;
    Ok((
        updated,
        movement(product, MovementDirection::In, quantity, reference, at),
    ))
}

/// Reconciliation check: Σin − Σout of the product's movements against its
/// current on-hand count.
pub fn reconciles(product: &Product, movements: &[StockMovement]) -> bool {
    let net: i64 = movements
        .iter()
        .filter(|m| m.product_id == product.id_typed())
        .map(|m| match m.direction {
            MovementDirection::In => m.quantity,
            MovementDirection::Out => -m.quantity,
        })
        .sum();
    net == product.stock_quantity()
}

fn validate_quantity(quantity: i64) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::validation("quantity", "must be positive"));
    }
    Ok(())
}

fn movement(
    product: &Product,
    direction: MovementDirection,
    quantity: i64,
    reference: StockRef,
    at: DateTime<Utc>,
) -> StockMovement {
    StockMovement {
        id: EntityId::new(),
        tenant_id: product.tenant_id(),
        product_id: product.id_typed(),
        direction,
        quantity,
        reference,
        occurred_at: at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinerp_core::Money;
    use proptest::prelude::*;

    fn test_product() -> Product {
        Product::new(
            ProductId::new(EntityId::new()),
            TenantId::new(),
            "SYR-5",
            "Syringe 5ml",
            Money::from_cents(250),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn receive_then_issue_pairs_movements_with_stock() {
        let product = test_product();
        let (product, m1) = receive(&product, 10, StockRef::Adjustment, Utc::now()).unwrap();
        assert_eq!(product.stock_quantity(), 10);
        assert_eq!(m1.direction, MovementDirection::In);

        let order = EntityId::new();
        let (product, m2) = issue(&product, 4, StockRef::Order(order), Utc::now()).unwrap();
        assert_eq!(product.stock_quantity(), 6);
        assert_eq!(m2.direction, MovementDirection::Out);
        assert_eq!(m2.reference, StockRef::Order(order));

        assert!(reconciles(&product, &[m1, m2]));
    }

    #[test]
    fn issuing_more_than_on_hand_fails() {
        let product = test_product();
        let (product, _) = receive(&product, 3, StockRef::Adjustment, Utc::now()).unwrap();
        let err = issue(&product, 4, StockRef::Adjustment, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(msg) if msg.contains("insufficient stock")));
    }

    #[test]
    fn non_positive_quantities_are_invalid() {
        let product = test_product();
        for qty in [0, -1] {
            assert!(matches!(
                issue(&product, qty, StockRef::Adjustment, Utc::now()).unwrap_err(),
                DomainError::Validation { .. }
            ));
            assert!(matches!(
                receive(&product, qty, StockRef::Adjustment, Utc::now()).unwrap_err(),
                DomainError::Validation { .. }
            ));
        }
    }

    proptest! {
        /// Property: any interleaving of receives and issues either fails
        /// (leaving product untouched) or keeps stock equal to the movement
        /// sum, and stock never goes negative.
        #[test]
        fn stock_always_reconciles_with_movements(
            deltas in prop::collection::vec(-20i64..20i64, 1..40)
        ) {
            let mut product = test_product();
            let mut movements = Vec::new();
            let now = Utc::now();

            for delta in deltas {
                let result = if delta >= 0 {
                    receive(&product, delta, StockRef::Adjustment, now)
                } else {
                    issue(&product, -delta, StockRef::Adjustment, now)
                };
                if let Ok((updated, movement)) = result {
                    product = updated;
                    movements.push(movement);
                }
                prop_assert!(product.stock_quantity() >= 0);
                prop_assert!(reconciles(&product, &movements));
            }
        }
    }
}
