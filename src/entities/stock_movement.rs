//! Stock movement entity - One change to a product's shelf counts.
//!
//! Every receipt of goods, withdrawal, manual adjustment and sale leaves a row here
//! with the counts the product had before the change, so the shelf history of a
//! product can be replayed.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stock movement database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    /// Unique identifier for the movement
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product whose counts changed
    pub product_id: i64,
    /// Employee who made the change, or the seller for sale movements
    pub employee_id: i64,
    /// `"receive"`, `"withdraw"`, `"adjust"` or `"sale"`
    pub kind: String,
    /// Free-text reason entered by the employee
    pub reason: Option<String>,
    /// Signed change to loose units
    pub units_delta: i32,
    /// Signed change to packs
    pub packs_delta: i32,
    /// Loose units before the change
    pub previous_units: i32,
    /// Packs before the change
    pub previous_packs: i32,
    /// Sale that caused the movement, for `"sale"` movements
    pub sale_id: Option<i64>,
    /// When the movement was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between StockMovement and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each movement changes one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// Each movement is made by one employee
    #[sea_orm(
        belongs_to = "super::employee::Entity",
        from = "Column::EmployeeId",
        to = "super::employee::Column::Id"
    )]
    Employee,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::employee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Employee.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
