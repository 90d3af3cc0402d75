//! Product entity - Represents a catalog entry sold over the counter.
//!
//! Stock is tracked twice: loose units and sealed packs. Each has its own price.
//! Products are never hard-deleted because sale lines reference them; deactivated
//! products simply drop out of the catalog.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Shelf code printed on the label (e.g., "MED-001")
    #[sea_orm(unique)]
    pub code: String,
    /// Display name (e.g., "Paracetamol 500mg")
    pub name: String,
    /// Optional free-text description
    pub description: Option<String>,
    /// How many loose units make one pack
    pub units_per_pack: i32,
    /// Loose units on the shelf
    pub loose_units: i32,
    /// Sealed packs on the shelf
    pub packs: i32,
    /// Price of one loose unit, in cents
    pub unit_price_cents: i64,
    /// Price of one pack, in cents
    pub pack_price_cents: i64,
    /// Whether selling this product requires a verified prescription
    pub requires_prescription: bool,
    /// Inactive products are hidden from the catalog
    pub is_active: bool,
    /// When the product was created
    pub created_at: DateTime,
    /// When the product was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product appears on many sale lines
    #[sea_orm(has_many = "super::sale_line::Entity")]
    SaleLines,
    /// One product has many stock movements
    #[sea_orm(has_many = "super::stock_movement::Entity")]
    StockMovements,
}

impl Related<super::sale_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleLines.def()
    }
}

impl Related<super::stock_movement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockMovements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
