//! Shopping cart for the sale in progress.
//!
//! The cart lives purely in memory until the sale is committed. Its stock checks
//! compare against the product snapshot the cashier was looking at when the line was
//! added. They are advisory only; the authoritative check happens in
//! [`crate::core::stock::validate`] right before commit.

use crate::{
    core::{
        money::{DEFAULT_TAX_RATE, Totals},
        product::{Product, UnitKind},
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use tracing::debug;

/// One product line pending sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    product_id: i64,
    code: String,
    name: String,
    unit_kind: UnitKind,
    quantity: u32,
    unit_price: Decimal,
    known_available: u32,
    requires_prescription: bool,
}

impl CartLine {
    fn new(product: &Product, unit_kind: UnitKind, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            code: product.code.clone(),
            name: product.name.clone(),
            unit_kind,
            quantity,
            unit_price: product.price(unit_kind),
            known_available: product.available(unit_kind),
            requires_prescription: product.requires_prescription,
        }
    }

    /// Product sold on this line
    #[must_use]
    pub const fn product_id(&self) -> i64 {
        self.product_id
    }

    /// Shelf code of the product
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Product name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Loose units or packs
    #[must_use]
    pub const fn unit_kind(&self) -> UnitKind {
        self.unit_kind
    }

    /// Quantity, always at least 1
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Price per unit or pack, captured when the line was added
    #[must_use]
    pub const fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Availability seen when the line was last added to
    #[must_use]
    pub const fn known_available(&self) -> u32 {
        self.known_available
    }

    /// Whether the product needs a verified prescription
    #[must_use]
    pub const fn requires_prescription(&self) -> bool {
        self.requires_prescription
    }

    /// `unit_price * quantity`, always derived from the current inputs.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    fn shortage(&self, requested: u32) -> Error {
        Error::InsufficientStock {
            product: self.name.clone(),
            unit_kind: self.unit_kind,
            requested,
            available: self.known_available,
        }
    }
}

/// Ordered list of lines for the sale in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
    tax_rate: Decimal,
}

impl Default for Cart {
    fn default() -> Self {
        Self::with_tax_rate(DEFAULT_TAX_RATE)
    }
}

impl Cart {
    /// Creates an empty cart using the default 16% tax rate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cart with a store-specific tax rate.
    #[must_use]
    pub const fn with_tax_rate(tax_rate: Decimal) -> Self {
        Self {
            lines: Vec::new(),
            tax_rate,
        }
    }

    /// Lines in the order they were added
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of lines
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities over all lines
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Whether any line needs a verified prescription
    #[must_use]
    pub fn requires_prescription(&self) -> bool {
        self.lines.iter().any(CartLine::requires_prescription)
    }

    /// Tax rate applied by [`Cart::totals`]
    #[must_use]
    pub const fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    /// Adds `quantity` of a product, merging with an existing line for the same
    /// product and unit kind. Returns the index of the affected line.
    ///
    /// The merged quantity is checked against the product's availability; on
    /// rejection the existing line is left unchanged. A merge refreshes the line's
    /// price and availability from `product`.
    ///
    /// # Errors
    /// Returns `Error::ProductNotFound` for a deactivated product,
    /// `Error::InvalidQuantity` for a zero quantity and `Error::InsufficientStock` if
    /// the (merged) quantity exceeds availability.
    pub fn add_line(
        &mut self,
        product: &Product,
        unit_kind: UnitKind,
        quantity: u32,
    ) -> Result<usize> {
        if !product.is_active {
            return Err(Error::ProductNotFound {
                name: product.name.clone(),
            });
        }
        if quantity == 0 {
            return Err(Error::InvalidQuantity { quantity: 0 });
        }

        let available = product.available(unit_kind);
        let existing = self
            .lines
            .iter()
            .position(|line| line.product_id == product.id && line.unit_kind == unit_kind);

        let index = if let Some(index) = existing {
            let line = &mut self.lines[index];
            let merged = line.quantity.saturating_add(quantity);
            if merged > available {
                return Err(Error::InsufficientStock {
                    product: product.name.clone(),
                    unit_kind,
                    requested: merged,
                    available,
                });
            }
            *line = CartLine::new(product, unit_kind, merged);
            index
        } else {
            if quantity > available {
                return Err(Error::InsufficientStock {
                    product: product.name.clone(),
                    unit_kind,
                    requested: quantity,
                    available,
                });
            }
            self.lines.push(CartLine::new(product, unit_kind, quantity));
            self.lines.len() - 1
        };

        debug!(
            "Cart line {} now {} {} of {}",
            index, self.lines[index].quantity, unit_kind, product.code
        );
        Ok(index)
    }

    /// Removes the line at `index`, if there is one.
    pub fn remove_line(&mut self, index: usize) -> Option<CartLine> {
        (index < self.lines.len()).then(|| self.lines.remove(index))
    }

    /// Sets the quantity of the line at `index`. A quantity of zero removes the line.
    ///
    /// # Errors
    /// Returns `Error::LineNotFound` for an unknown index and
    /// `Error::InsufficientStock` if the quantity exceeds the line's known availability.
    pub fn change_quantity(&mut self, index: usize, new_quantity: u32) -> Result<()> {
        if index >= self.lines.len() {
            return Err(Error::LineNotFound { index });
        }
        if new_quantity == 0 {
            self.lines.remove(index);
            return Ok(());
        }

        let line = &mut self.lines[index];
        if new_quantity > line.known_available {
            return Err(line.shortage(new_quantity));
        }
        line.quantity = new_quantity;
        Ok(())
    }

    /// Subtotal, tax and total of the current lines.
    #[must_use]
    pub fn totals(&self) -> Totals {
        let subtotal = self.lines.iter().map(CartLine::subtotal).sum();
        Totals::from_subtotal(subtotal, self.tax_rate)
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}
