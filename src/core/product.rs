//! Product catalog - Handles all product-related operations.
//!
//! This module provides functions for creating, retrieving, searching and restocking
//! products, plus the [`Product`] snapshot the cart and stock validator work with.
//! Products carry two stock counters (loose units and packs) with separate prices,
//! selected by [`UnitKind`].

use crate::{
    config::store::ProductConfig,
    core::money::{from_cents, to_cents},
    entities::{Product as ProductEntity, product},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{Condition, QueryOrder, Set, prelude::*, sea_query::LikeExpr};
use std::{fmt, str::FromStr};
use tracing::{debug, info, instrument};

/// Whether a product is sold as loose units or as sealed packs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// A single loose unit (one tablet strip, one ampoule, ...)
    Single,
    /// A sealed pack of `units_per_pack` units
    Pack,
}

impl UnitKind {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "unit",
            Self::Pack => "pack",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => f.write_str("units"),
            Self::Pack => f.write_str("packs"),
        }
    }
}

impl FromStr for UnitKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unit" => Ok(Self::Single),
            "pack" => Ok(Self::Pack),
            other => Err(Error::InvalidRecord {
                message: format!("unknown unit kind '{other}'"),
            }),
        }
    }
}

/// Point-in-time view of a catalog product: availability and prices per unit kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Product id
    pub id: i64,
    /// Shelf code
    pub code: String,
    /// Display name
    pub name: String,
    /// Loose units on the shelf
    pub available_units: u32,
    /// Sealed packs on the shelf
    pub available_packs: u32,
    /// Price of one loose unit
    pub unit_price: Decimal,
    /// Price of one pack
    pub pack_price: Decimal,
    /// Whether a prescription must be verified at checkout
    pub requires_prescription: bool,
    /// Whether the product is still sold
    pub is_active: bool,
}

impl Product {
    /// Available quantity for the given unit kind.
    #[must_use]
    pub const fn available(&self, unit_kind: UnitKind) -> u32 {
        match unit_kind {
            UnitKind::Single => self.available_units,
            UnitKind::Pack => self.available_packs,
        }
    }

    /// Price for the given unit kind.
    #[must_use]
    pub const fn price(&self, unit_kind: UnitKind) -> Decimal {
        match unit_kind {
            UnitKind::Single => self.unit_price,
            UnitKind::Pack => self.pack_price,
        }
    }
}

impl TryFrom<product::Model> for Product {
    type Error = Error;

    fn try_from(model: product::Model) -> Result<Self> {
        let count = |value: i32, field: &str| {
            u32::try_from(value).map_err(|_| Error::InvalidRecord {
                message: format!("product {} has negative {field}: {value}", model.id),
            })
        };
        Ok(Self {
            available_units: count(model.loose_units, "loose_units")?,
            available_packs: count(model.packs, "packs")?,
            unit_price: from_cents(model.unit_price_cents),
            pack_price: from_cents(model.pack_price_cents),
            id: model.id,
            code: model.code,
            name: model.name,
            requires_prescription: model.requires_prescription,
            is_active: model.is_active,
        })
    }
}

/// Input for [`create_product`].
#[derive(Debug, Clone)]
pub struct NewProduct {
    /// Shelf code, must be unique
    pub code: String,
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Loose units per pack, at least 1
    pub units_per_pack: u32,
    /// Initial loose units
    pub loose_units: u32,
    /// Initial packs
    pub packs: u32,
    /// Price of one loose unit
    pub unit_price: Decimal,
    /// Price of one pack
    pub pack_price: Decimal,
    /// Whether a prescription must be verified at checkout
    pub requires_prescription: bool,
}

impl From<&ProductConfig> for NewProduct {
    fn from(config: &ProductConfig) -> Self {
        Self {
            code: config.code.clone(),
            name: config.name.clone(),
            description: config.description.clone(),
            units_per_pack: config.units_per_pack,
            loose_units: config.loose_units,
            packs: config.packs,
            unit_price: config.unit_price,
            pack_price: config.pack_price,
            requires_prescription: config.requires_prescription,
        }
    }
}

pub(crate) fn stock_column(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::InvalidQuantity {
        quantity: i64::from(value),
    })
}

/// Retrieves all active products from the database, ordered alphabetically by name.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_all_active_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    ProductEntity::find()
        .filter(product::Column::IsActive.eq(true))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Searches active products whose name or code contains `term`.
///
/// `SQLite`'s `LIKE` is case-insensitive for ASCII, which covers product codes and
/// most product names. `%`, `_` and `\` in the term match literally. An empty term
/// returns the whole active catalog.
///
/// # Errors
/// Returns an error if the database query fails.
#[instrument(skip(db))]
pub async fn search_active_products(
    db: &DatabaseConnection,
    term: &str,
) -> Result<Vec<product::Model>> {
    let term = term.trim();
    let pattern = format!("%{}%", escape_like(term));
    let products = ProductEntity::find()
        .filter(product::Column::IsActive.eq(true))
        .filter(
            Condition::any()
                .add(product::Column::Name.like(LikeExpr::new(&pattern).escape('\\')))
                .add(product::Column::Code.like(LikeExpr::new(&pattern).escape('\\'))),
        )
        .order_by_asc(product::Column::Name)
        .all(db)
        .await?;
    debug!("Search '{}' matched {} products", term, products.len());
    Ok(products)
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Finds an active product by its shelf code.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product_by_code(
    db: &DatabaseConnection,
    code: &str,
) -> Result<Option<product::Model>> {
    ProductEntity::find()
        .filter(product::Column::Code.eq(code))
        .filter(product::Column::IsActive.eq(true))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific product by its unique ID, active or not.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    ProductEntity::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new product, performing input validation.
///
/// # Errors
/// Returns an error if:
/// - The code or name is empty or whitespace-only
/// - A price is negative
/// - `units_per_pack` is zero or a stock count does not fit the column
/// - The database insert fails (for example on a duplicate code)
#[instrument(skip(db, new_product), fields(code = %new_product.code))]
pub async fn create_product(
    db: &DatabaseConnection,
    new_product: NewProduct,
) -> Result<product::Model> {
    if new_product.code.trim().is_empty() {
        return Err(Error::Config {
            message: "Product code cannot be empty".to_string(),
        });
    }

    if new_product.name.trim().is_empty() {
        return Err(Error::Config {
            message: "Product name cannot be empty".to_string(),
        });
    }

    for price in [new_product.unit_price, new_product.pack_price] {
        if price.is_sign_negative() {
            return Err(Error::InvalidAmount { amount: price });
        }
    }

    if new_product.units_per_pack == 0 {
        return Err(Error::InvalidQuantity { quantity: 0 });
    }

    let now = chrono::Utc::now().naive_utc();

    let model = product::ActiveModel {
        code: Set(new_product.code.trim().to_string()),
        name: Set(new_product.name.trim().to_string()),
        description: Set(new_product.description),
        units_per_pack: Set(stock_column(new_product.units_per_pack)?),
        loose_units: Set(stock_column(new_product.loose_units)?),
        packs: Set(stock_column(new_product.packs)?),
        unit_price_cents: Set(to_cents(new_product.unit_price)?),
        pack_price_cents: Set(to_cents(new_product.pack_price)?),
        requires_prescription: Set(new_product.requires_prescription),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    info!("Created product {} ({})", created.code, created.id);
    Ok(created)
}

/// Overwrites the stock counter for one unit kind.
///
/// This is a raw correction that records no stock movement. Staff-facing count
/// changes go through `core::inventory`.
///
/// # Errors
/// Returns an error if the product does not exist or is inactive, the quantity does
/// not fit the column, or the update fails.
#[instrument(skip(db))]
pub async fn set_stock(
    db: &DatabaseConnection,
    product_id: i64,
    unit_kind: UnitKind,
    quantity: u32,
) -> Result<product::Model> {
    let quantity = stock_column(quantity)?;

    let mut product: product::ActiveModel = ProductEntity::find_by_id(product_id)
        .one(db)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| Error::ProductNotFound {
            name: product_id.to_string(),
        })?
        .into();

    match unit_kind {
        UnitKind::Single => product.loose_units = Set(quantity),
        UnitKind::Pack => product.packs = Set(quantity),
    }
    product.updated_at = Set(chrono::Utc::now().naive_utc());

    let updated = product.update(db).await?;
    info!(
        "Stock for {} set to {} loose units, {} packs",
        updated.code, updated.loose_units, updated.packs
    );
    Ok(updated)
}

/// Deactivates a product so it leaves the catalog; sale history keeps referring to it.
///
/// # Errors
/// Returns an error if the product does not exist or is already inactive, or the update fails.
pub async fn deactivate_product(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<product::Model> {
    let model = ProductEntity::find_by_id(product_id)
        .one(db)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| Error::ProductNotFound {
            name: product_id.to_string(),
        })?;

    let mut product: product::ActiveModel = model.into();
    product.is_active = Set(false);
    product.updated_at = Set(chrono::Utc::now().naive_utc());

    product.update(db).await.map_err(Into::into)
}

/// Inserts configured products whose code is not in the catalog yet.
///
/// Existing products are left untouched so stock counted at the shelf is never
/// overwritten by the seed file. Returns the number of products created.
///
/// # Errors
/// Returns an error if a lookup or insert fails, or a configured product is invalid.
#[instrument(skip(db, products), fields(configured = products.len()))]
pub async fn seed_products(db: &DatabaseConnection, products: &[ProductConfig]) -> Result<usize> {
    let mut created = 0;
    for config in products {
        let exists = ProductEntity::find()
            .filter(product::Column::Code.eq(config.code.trim()))
            .one(db)
            .await?
            .is_some();
        if exists {
            debug!("Product {} already in catalog, skipping", config.code);
            continue;
        }
        create_product(db, NewProduct::from(config)).await?;
        created += 1;
    }
    info!("Seeded {} new products", created);
    Ok(created)
}
