//! Inventory - Shelf count changes and their history.
//!
//! Receiving goods, withdrawing them (breakage, expiry, returns to supplier) and
//! manual count corrections are restricted to warehouse staff and admins. Each
//! change updates the product and records a [`StockMovement`] in one transaction.
//! Sales reduce stock too: the store records a `sale` movement for every sale line
//! it writes.

use crate::{
    core::{
        product::{UnitKind, stock_column},
        session::Session,
    },
    entities::{
        Product as ProductEntity, StockMovement as StockMovementEntity, product, stock_movement,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use std::{fmt, str::FromStr};
use tracing::{info, instrument, warn};

/// Why a product's shelf counts changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovementKind {
    /// Goods received from a supplier
    Receive,
    /// Goods taken off the shelf without a sale
    Withdraw,
    /// Counts overwritten after a physical count
    Adjust,
    /// Goods sold at the till
    Sale,
}

impl MovementKind {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Receive => "receive",
            Self::Withdraw => "withdraw",
            Self::Adjust => "adjust",
            Self::Sale => "sale",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "receive" => Ok(Self::Receive),
            "withdraw" => Ok(Self::Withdraw),
            "adjust" => Ok(Self::Adjust),
            "sale" => Ok(Self::Sale),
            other => Err(Error::InvalidRecord {
                message: format!("unknown stock movement kind '{other}'"),
            }),
        }
    }
}

/// Loose units and packs, used both as amounts to move and as absolute counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StockCounts {
    /// Loose units
    pub units: u32,
    /// Sealed packs
    pub packs: u32,
}

impl StockCounts {
    /// Counts for the given numbers of loose units and packs.
    #[must_use]
    pub const fn new(units: u32, packs: u32) -> Self {
        Self { units, packs }
    }

    /// Whether both counts are zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.units == 0 && self.packs == 0
    }
}

/// A stored stock movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMovement {
    /// Movement id
    pub id: i64,
    /// Product whose counts changed
    pub product_id: i64,
    /// Employee who made the change
    pub employee_id: i64,
    /// Why the counts changed
    pub kind: MovementKind,
    /// Free-text reason
    pub reason: Option<String>,
    /// Signed change to loose units
    pub units_delta: i32,
    /// Signed change to packs
    pub packs_delta: i32,
    /// Counts before the change
    pub previous: StockCounts,
    /// Sale behind a `Sale` movement
    pub sale_id: Option<i64>,
    /// When the movement was recorded
    pub created_at: DateTime<Utc>,
}

impl TryFrom<stock_movement::Model> for StockMovement {
    type Error = Error;

    fn try_from(model: stock_movement::Model) -> Result<Self> {
        let count = |value: i32, field: &str| {
            u32::try_from(value).map_err(|_| Error::InvalidRecord {
                message: format!("stock movement {} has negative {field}: {value}", model.id),
            })
        };
        Ok(Self {
            kind: model.kind.parse()?,
            previous: StockCounts::new(
                count(model.previous_units, "previous_units")?,
                count(model.previous_packs, "previous_packs")?,
            ),
            id: model.id,
            product_id: model.product_id,
            employee_id: model.employee_id,
            reason: model.reason,
            units_delta: model.units_delta,
            packs_delta: model.packs_delta,
            sale_id: model.sale_id,
            created_at: model.created_at,
        })
    }
}

fn ensure_can_manage(session: &Session) -> Result<()> {
    if session.can_manage_inventory() {
        return Ok(());
    }
    let employee = session.employee();
    Err(Error::PermissionDenied {
        name: employee.name.clone(),
        role: employee.role.to_string(),
        action: "manage inventory".to_string(),
    })
}

async fn find_active_product<C: ConnectionTrait>(
    conn: &C,
    product_id: i64,
) -> Result<product::Model> {
    ProductEntity::find_by_id(product_id)
        .one(conn)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| Error::ProductNotFound {
            name: product_id.to_string(),
        })
}

/// Current counts of a stored product; corrupt negative rows count as zero.
fn current_counts(model: &product::Model) -> StockCounts {
    StockCounts::new(
        u32::try_from(model.loose_units).unwrap_or(0),
        u32::try_from(model.packs).unwrap_or(0),
    )
}

/// Writes the new counts to the product and records the movement. Runs on whatever
/// connection or transaction the caller holds.
async fn apply_movement<C: ConnectionTrait>(
    conn: &C,
    model: product::Model,
    counts: StockCounts,
    kind: MovementKind,
    employee_id: i64,
    reason: Option<String>,
    sale_id: Option<i64>,
) -> Result<(product::Model, stock_movement::Model)> {
    let new_units = stock_column(counts.units)?;
    let new_packs = stock_column(counts.packs)?;
    let previous_units = model.loose_units;
    let previous_packs = model.packs;

    let mut product: product::ActiveModel = model.into();
    product.loose_units = Set(new_units);
    product.packs = Set(new_packs);
    product.updated_at = Set(Utc::now().naive_utc());
    let product = product.update(conn).await?;

    let movement = stock_movement::ActiveModel {
        product_id: Set(product.id),
        employee_id: Set(employee_id),
        kind: Set(kind.as_str().to_string()),
        reason: Set(reason),
        units_delta: Set(new_units - previous_units),
        packs_delta: Set(new_packs - previous_packs),
        previous_units: Set(previous_units),
        previous_packs: Set(previous_packs),
        sale_id: Set(sale_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    Ok((product, movement))
}

fn reason_text(reason: &str) -> Option<String> {
    let reason = reason.trim();
    (!reason.is_empty()).then(|| reason.to_string())
}

/// Adds received goods to a product's shelf counts.
///
/// # Errors
/// Returns an error if:
/// - The session may not manage inventory
/// - Both amounts are zero
/// - The product does not exist or is inactive
/// - A resulting count does not fit the column, or a write fails
#[instrument(skip(db, session), fields(employee_id = session.employee().id))]
pub async fn receive_stock(
    db: &DatabaseConnection,
    session: &Session,
    product_id: i64,
    amount: StockCounts,
    reason: &str,
) -> Result<StockMovement> {
    ensure_can_manage(session)?;
    if amount.is_zero() {
        return Err(Error::InvalidQuantity { quantity: 0 });
    }

    let txn = db.begin().await?;
    let model = find_active_product(&txn, product_id).await?;
    let current = current_counts(&model);
    let overflow = |value: u32| Error::InvalidQuantity {
        quantity: i64::from(value),
    };
    let counts = StockCounts::new(
        current
            .units
            .checked_add(amount.units)
            .ok_or_else(|| overflow(amount.units))?,
        current
            .packs
            .checked_add(amount.packs)
            .ok_or_else(|| overflow(amount.packs))?,
    );
    let (product, movement) = apply_movement(
        &txn,
        model,
        counts,
        MovementKind::Receive,
        session.employee().id,
        reason_text(reason),
        None,
    )
    .await?;
    txn.commit().await?;

    info!(
        "Received {} units, {} packs of {}",
        amount.units, amount.packs, product.code
    );
    StockMovement::try_from(movement)
}

/// Takes goods off the shelf without a sale.
///
/// # Errors
/// Returns an error if:
/// - The session may not manage inventory
/// - Both amounts are zero
/// - The product does not exist or is inactive
/// - An amount exceeds what is on the shelf (`Error::InsufficientStock`)
/// - A write fails
#[instrument(skip(db, session), fields(employee_id = session.employee().id))]
pub async fn withdraw_stock(
    db: &DatabaseConnection,
    session: &Session,
    product_id: i64,
    amount: StockCounts,
    reason: &str,
) -> Result<StockMovement> {
    ensure_can_manage(session)?;
    if amount.is_zero() {
        return Err(Error::InvalidQuantity { quantity: 0 });
    }

    let txn = db.begin().await?;
    let model = find_active_product(&txn, product_id).await?;
    let current = current_counts(&model);
    for (unit_kind, requested, available) in [
        (UnitKind::Single, amount.units, current.units),
        (UnitKind::Pack, amount.packs, current.packs),
    ] {
        if requested > available {
            return Err(Error::InsufficientStock {
                product: model.name.clone(),
                unit_kind,
                requested,
                available,
            });
        }
    }

    let counts = StockCounts::new(current.units - amount.units, current.packs - amount.packs);
    let (product, movement) = apply_movement(
        &txn,
        model,
        counts,
        MovementKind::Withdraw,
        session.employee().id,
        reason_text(reason),
        None,
    )
    .await?;
    txn.commit().await?;

    info!(
        "Withdrew {} units, {} packs of {}",
        amount.units, amount.packs, product.code
    );
    StockMovement::try_from(movement)
}

/// Overwrites a product's shelf counts after a physical count, recording the difference.
///
/// # Errors
/// Returns an error if the session may not manage inventory, the product does not exist
/// or is inactive, a count does not fit the column, or a write fails.
#[instrument(skip(db, session), fields(employee_id = session.employee().id))]
pub async fn adjust_stock(
    db: &DatabaseConnection,
    session: &Session,
    product_id: i64,
    counts: StockCounts,
    reason: &str,
) -> Result<StockMovement> {
    ensure_can_manage(session)?;

    let txn = db.begin().await?;
    let model = find_active_product(&txn, product_id).await?;
    let (product, movement) = apply_movement(
        &txn,
        model,
        counts,
        MovementKind::Adjust,
        session.employee().id,
        reason_text(reason),
        None,
    )
    .await?;
    txn.commit().await?;

    info!(
        "Adjusted {} to {} loose units, {} packs",
        product.code, product.loose_units, product.packs
    );
    StockMovement::try_from(movement)
}

/// Movements of one product, newest first.
///
/// # Errors
/// Returns an error if the query fails or a stored row is malformed.
pub async fn movement_history(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Vec<StockMovement>> {
    StockMovementEntity::find()
        .filter(stock_movement::Column::ProductId.eq(product_id))
        .order_by_desc(stock_movement::Column::CreatedAt)
        .order_by_desc(stock_movement::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(StockMovement::try_from)
        .collect()
}

/// Takes sold goods off the shelf and records a `sale` movement.
///
/// Runs inside the caller's transaction. The stock check happened earlier and
/// without locks, so a concurrent sale may already have taken the goods: the count
/// then bottoms out at zero and the oversell is logged.
///
/// # Errors
/// Returns an error if the product row is gone, the quantity does not fit the
/// column, or a write fails.
pub(crate) async fn record_sale<C: ConnectionTrait>(
    conn: &C,
    sale_id: i64,
    seller_id: i64,
    product_id: i64,
    unit_kind: UnitKind,
    quantity: u32,
) -> Result<()> {
    let model = ProductEntity::find_by_id(product_id)
        .one(conn)
        .await?
        .ok_or_else(|| Error::ProductNotFound {
            name: product_id.to_string(),
        })?;
    let current = current_counts(&model);

    let available = match unit_kind {
        UnitKind::Single => current.units,
        UnitKind::Pack => current.packs,
    };
    if quantity > available {
        warn!(
            "Sale {} oversold {}: {} {} sold, {} on the shelf",
            sale_id, model.code, quantity, unit_kind, available
        );
    }
    let counts = match unit_kind {
        UnitKind::Single => StockCounts::new(current.units.saturating_sub(quantity), current.packs),
        UnitKind::Pack => StockCounts::new(current.units, current.packs.saturating_sub(quantity)),
    };

    apply_movement(
        conn,
        model,
        counts,
        MovementKind::Sale,
        seller_id,
        None,
        Some(sale_id),
    )
    .await?;
    Ok(())
}
