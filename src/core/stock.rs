//! Stock validation right before commit.
//!
//! The cart only checks against the snapshot the cashier saw. Shelf counts can change
//! between adding a line and finalizing the sale, so every line is re-checked against a
//! fresh read of its product here.
//!
//! The check and the later writes are not atomic: a concurrent sale can still take the
//! last units between [`validate`] and the commit.

use crate::{
    core::{cart::Cart, product::UnitKind, store::SaleStore},
    errors::{Error, Result},
};
use tracing::{debug, instrument, warn};

/// First cart line found to be short on stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockShortage {
    /// Product on the short line
    pub product_id: i64,
    /// Shelf code
    pub code: String,
    /// Product name
    pub name: String,
    /// Loose units or packs
    pub unit_kind: UnitKind,
    /// Quantity in the cart
    pub requested: u32,
    /// Quantity on the shelf right now
    pub available: u32,
}

impl From<StockShortage> for Error {
    fn from(shortage: StockShortage) -> Self {
        Self::InsufficientStock {
            product: shortage.name,
            unit_kind: shortage.unit_kind,
            requested: shortage.requested,
            available: shortage.available,
        }
    }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockVerdict {
    /// Every line fits current stock
    Valid,
    /// At least one line does not; carries the first one found
    Short(StockShortage),
}

impl StockVerdict {
    /// Whether every line fits.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Re-reads each cart line's product and compares the line quantity against current
/// availability for its unit kind. Lines are checked in cart order and the first
/// shortage is returned. An inactive product counts as having nothing available.
///
/// The cart is never modified.
///
/// # Errors
/// Returns the store error if a product cannot be read.
#[instrument(skip_all, fields(lines = cart.len()))]
pub async fn validate<S: SaleStore>(store: &S, cart: &Cart) -> Result<StockVerdict> {
    for line in cart.lines() {
        let product = store.read_product(line.product_id()).await?;
        let available = if product.is_active {
            product.available(line.unit_kind())
        } else {
            0
        };

        if line.quantity() > available {
            warn!(
                "Stock for {} dropped to {} {}, cart wants {}",
                product.code,
                available,
                line.unit_kind(),
                line.quantity()
            );
            return Ok(StockVerdict::Short(StockShortage {
                product_id: product.id,
                code: product.code,
                name: product.name,
                unit_kind: line.unit_kind(),
                requested: line.quantity(),
                available,
            }));
        }
    }

    debug!("All cart lines fit current stock");
    Ok(StockVerdict::Valid)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{
            product::{Product, deactivate_product, set_stock},
            store::DbStore,
        },
        test_utils::*,
    };

    #[tokio::test]
    async fn test_valid_when_stock_unchanged() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_test_product(&db, "MED-001", 10, 2, false).await?;
        let snapshot = Product::try_from(created)?;

        let mut cart = Cart::new();
        cart.add_line(&snapshot, UnitKind::Single, 10)?;
        cart.add_line(&snapshot, UnitKind::Pack, 1)?;

        let store = DbStore::new(db);
        assert!(validate(&store, &cart).await?.is_valid());
        Ok(())
    }

    #[tokio::test]
    async fn test_reports_first_short_line_without_touching_cart() -> Result<()> {
        let db = setup_test_db().await?;
        let tablets = Product::try_from(create_test_product(&db, "MED-001", 10, 2, false).await?)?;
        let syrup = Product::try_from(create_test_product(&db, "MED-002", 10, 2, false).await?)?;

        let mut cart = Cart::new();
        cart.add_line(&tablets, UnitKind::Single, 3)?;
        cart.add_line(&syrup, UnitKind::Pack, 2)?;
        let before = cart.clone();

        // Another till sold a pack in the meantime
        set_stock(&db, syrup.id, UnitKind::Pack, 1).await?;

        let store = DbStore::new(db);
        let verdict = validate(&store, &cart).await?;
        assert_eq!(
            verdict,
            StockVerdict::Short(StockShortage {
                product_id: syrup.id,
                code: "MED-002".to_string(),
                name: syrup.name.clone(),
                unit_kind: UnitKind::Pack,
                requested: 2,
                available: 1,
            })
        );
        assert_eq!(cart, before);
        Ok(())
    }

    #[tokio::test]
    async fn test_deactivated_product_is_short() -> Result<()> {
        let db = setup_test_db().await?;
        let tablets = Product::try_from(create_test_product(&db, "MED-001", 10, 2, false).await?)?;
        let mut cart = Cart::new();
        cart.add_line(&tablets, UnitKind::Single, 1)?;

        deactivate_product(&db, tablets.id).await?;

        let store = DbStore::new(db);
        let StockVerdict::Short(shortage) = validate(&store, &cart).await? else {
            panic!("deactivated product should be short");
        };
        assert_eq!(shortage.available, 0);

        let err = Error::from(shortage);
        assert!(matches!(err, Error::InsufficientStock { requested: 1, .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_product_read_failure_propagates() -> Result<()> {
        let db = setup_test_db().await?;
        let tablets = Product::try_from(create_test_product(&db, "MED-001", 10, 2, false).await?)?;
        let mut cart = Cart::new();
        cart.add_line(&tablets, UnitKind::Single, 1)?;

        let store = FailingStore::new(DbStore::new(db), FailAt::ProductRead);
        assert!(validate(&store, &cart).await.is_err());
        assert_eq!(store.writes(), 0);
        Ok(())
    }
}
