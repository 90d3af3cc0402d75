//! Unified error type for the point-of-sale core.
//!
//! Every fallible operation returns [`Result`]. The `Display` text of each variant is
//! the single notification shown to the operator, so messages are written for people
//! at the counter rather than for logs.

use crate::core::{product::UnitKind, sale::WriteStage};
use rust_decimal::Decimal;
use thiserror::Error;

/// All errors produced by the catalog, cart and sale workflow.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment problem
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Error reported by the relational store
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A stored row could not be turned into a domain record
    #[error("Invalid stored record: {message}")]
    InvalidRecord {
        /// Which field failed and why
        message: String,
    },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Negative, non-representable or otherwise unusable money amount
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Quantity below one or too large to store
    #[error("Invalid quantity: {quantity}")]
    InvalidQuantity {
        /// The rejected quantity
        quantity: i64,
    },

    /// Product lookup failed or the product is no longer sold
    #[error("Product not found: {name}")]
    ProductNotFound {
        /// Code, name or id used in the lookup
        name: String,
    },

    /// Requested quantity exceeds what is on the shelf
    #[error("Insufficient stock for {product}: requested {requested} {unit_kind}, available {available}")]
    InsufficientStock {
        /// Product name
        product: String,
        /// Whether loose units or packs were requested
        unit_kind: UnitKind,
        /// Quantity the cart asked for
        requested: u32,
        /// Quantity currently available
        available: u32,
    },

    /// A cart position that does not exist
    #[error("Cart line {index} does not exist")]
    LineNotFound {
        /// The requested position
        index: usize,
    },

    /// Finalize requested with nothing in the cart
    #[error("The cart is empty")]
    EmptyCart,

    /// Cash tendered does not cover the sale total
    #[error("Insufficient payment: tendered ${tendered:.2}, total ${total:.2}")]
    InsufficientPayment {
        /// Amount handed over
        tendered: Decimal,
        /// Amount due
        total: Decimal,
    },

    /// The cart holds a prescription-only product and no prescription was checked
    #[error("A prescription must be verified before selling prescription-only products")]
    PrescriptionNotConfirmed,

    /// Employee lookup failed or the employee is inactive
    #[error("Employee not found: {id}")]
    EmployeeNotFound {
        /// Employee id used in the lookup
        id: i64,
    },

    /// The signed-in employee's role does not allow this action
    #[error("Employee {name} ({role}) is not allowed to {action}")]
    PermissionDenied {
        /// Employee name
        name: String,
        /// Employee role
        role: String,
        /// The refused action
        action: String,
    },

    /// One of the sale writes failed. When `sale_id` is set, earlier stages are
    /// already persisted and the sale needs manual reconciliation.
    #[error("Failed to record the sale ({stage}): {source}")]
    SaleWrite {
        /// Write stage that failed
        stage: WriteStage,
        /// Id of the persisted sale header, if the header was written
        sale_id: Option<i64>,
        /// Underlying store error
        #[source]
        source: Box<Self>,
    },

    /// Sale lookup failed
    #[error("Sale {sale_id} not found")]
    SaleNotFound {
        /// Sale id used in the lookup
        sale_id: i64,
    },

    /// The sale is committed but its receipt could not be loaded
    #[error("Sale {sale_id} was recorded but its receipt could not be loaded: {source}")]
    ReceiptUnavailable {
        /// The committed sale
        sale_id: i64,
        /// Underlying read error
        #[source]
        source: Box<Self>,
    },
}

impl Error {
    /// True when some, but not all, of the sale header, lines and payment were written.
    #[must_use]
    pub const fn is_partial_commit(&self) -> bool {
        matches!(self, Self::SaleWrite { sale_id: Some(_), .. })
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
