//! Sale entity - The header row of a committed sale.
//!
//! A sale is written once and never updated. Its lines and payment are separate
//! rows written afterwards, so a header can exist without them if a later write fails.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sale database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    /// Unique identifier for the sale
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sum of line subtotals plus tax, in cents
    pub total_cents: i64,
    /// Sale status, always `"completed"` when written by the till
    pub status: String,
    /// Employee who rang up the sale
    pub seller_id: i64,
    /// Optional customer name
    pub customer_name: Option<String>,
    /// Optional customer identity document number
    pub customer_document: Option<String>,
    /// Whether any line needed a prescription
    pub requires_prescription: bool,
    /// When the sale was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Sale and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each sale is rung up by one employee
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::SellerId",
        to = "super::employee::Column::Id"
    )]
    Seller,
    /// One sale has many lines
    #[sea_orm(has_many = "super::sale_line::Entity")]
    SaleLines,
    /// One sale has (normally exactly one) payment
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Seller.def()
    }
}

impl Related<super::sale_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SaleLines.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
