//! Sale line entity - Persisted snapshot of one cart line.
//!
//! Unit price and subtotal are copied from the cart at commit time so later
//! catalog price changes never rewrite history.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale line database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sale_lines")]
pub struct Model {
    /// Unique identifier for the line
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sale this line belongs to
    pub sale_id: i64,
    /// Product sold
    pub product_id: i64,
    /// `"unit"` for loose units, `"pack"` for sealed packs
    pub unit_kind: String,
    /// Quantity sold, always positive
    pub quantity: i32,
    /// Price per unit or pack at the time of sale, in cents
    pub unit_price_cents: i64,
    /// `unit_price_cents * quantity`
    pub subtotal_cents: i64,
}

/// Defines relationships between SaleLine and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one sale
    #[sea_orm(
        belongs_to = "super::sale::Entity",
        from = "Column::SaleId",
        to = "super::sale::Column::Id"
    )]
    Sale,
    /// Each line refers to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sale.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
