//! Typed sale records exchanged with the store.
//!
//! Stored rows use strings and integer cents; these types are what the rest of the
//! crate sees. Conversion from entity models validates every field, so a row with an
//! unknown status or unit kind surfaces as `Error::InvalidRecord` at the boundary.

use crate::{
    core::{money::from_cents, product::UnitKind},
    entities::{sale, sale_line},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::{fmt, str::FromStr};

/// Status of a sale or payment row written by the till.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    /// The sale or payment went through
    Completed,
}

impl RecordStatus {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
        }
    }
}

impl FromStr for RecordStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "completed" => Ok(Self::Completed),
            other => Err(Error::InvalidRecord {
                message: format!("unknown status '{other}'"),
            }),
        }
    }
}

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethod {
    /// Notes and coins; needs a tendered amount and gives change
    Cash,
    /// Debit card
    DebitCard,
    /// Credit card
    CreditCard,
    /// Bank transfer
    Transfer,
    /// Mobile wallet payment
    MobileWallet,
}

impl PaymentMethod {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::DebitCard => "debit_card",
            Self::CreditCard => "credit_card",
            Self::Transfer => "transfer",
            Self::MobileWallet => "mobile_wallet",
        }
    }

    /// Whether the cashier must take a tendered amount and hand back change.
    #[must_use]
    pub const fn is_cash(self) -> bool {
        matches!(self, Self::Cash)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Cash => "Cash",
            Self::DebitCard => "Debit card",
            Self::CreditCard => "Credit card",
            Self::Transfer => "Bank transfer",
            Self::MobileWallet => "Mobile wallet",
        };
        f.write_str(label)
    }
}

impl FromStr for PaymentMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cash" => Ok(Self::Cash),
            "debit_card" => Ok(Self::DebitCard),
            "credit_card" => Ok(Self::CreditCard),
            "transfer" => Ok(Self::Transfer),
            "mobile_wallet" => Ok(Self::MobileWallet),
            other => Err(Error::InvalidRecord {
                message: format!("unknown payment method '{other}'"),
            }),
        }
    }
}

/// Sale header to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    /// Subtotal plus tax
    pub total: Decimal,
    /// Employee ringing up the sale
    pub seller_id: i64,
    /// Optional customer name
    pub customer_name: Option<String>,
    /// Optional customer document number
    pub customer_document: Option<String>,
    /// Whether any line needed a prescription
    pub requires_prescription: bool,
}

/// A persisted sale header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sale {
    /// Generated id
    pub id: i64,
    /// Subtotal plus tax
    pub total: Decimal,
    /// Sale status
    pub status: RecordStatus,
    /// Employee who rang up the sale
    pub seller_id: i64,
    /// Optional customer name
    pub customer_name: Option<String>,
    /// Optional customer document number
    pub customer_document: Option<String>,
    /// Whether any line needed a prescription
    pub requires_prescription: bool,
    /// When the sale was written
    pub created_at: DateTime<Utc>,
}

impl TryFrom<sale::Model> for Sale {
    type Error = Error;

    fn try_from(model: sale::Model) -> Result<Self> {
        Ok(Self {
            status: model.status.parse()?,
            id: model.id,
            total: from_cents(model.total_cents),
            seller_id: model.seller_id,
            customer_name: model.customer_name,
            customer_document: model.customer_document,
            requires_prescription: model.requires_prescription,
            created_at: model.created_at,
        })
    }
}

/// Sale line to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSaleLine {
    /// Sale the line belongs to
    pub sale_id: i64,
    /// Product sold
    pub product_id: i64,
    /// Loose units or packs
    pub unit_kind: UnitKind,
    /// Quantity sold
    pub quantity: u32,
    /// Price per unit or pack
    pub unit_price: Decimal,
    /// `unit_price * quantity`
    pub subtotal: Decimal,
}

/// A persisted sale line joined with the product's code and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLineDetail {
    /// Product sold
    pub product_id: i64,
    /// Shelf code
    pub product_code: String,
    /// Product name
    pub product_name: String,
    /// Loose units or packs
    pub unit_kind: UnitKind,
    /// Quantity sold
    pub quantity: u32,
    /// Price per unit or pack
    pub unit_price: Decimal,
    /// Stored line subtotal
    pub subtotal: Decimal,
}

impl SaleLineDetail {
    /// Builds a detail from a stored line and the product's code and name.
    ///
    /// # Errors
    /// Returns `Error::InvalidRecord` for an unknown unit kind or a non-positive quantity.
    pub fn from_model(
        model: sale_line::Model,
        product_code: String,
        product_name: String,
    ) -> Result<Self> {
        let quantity = u32::try_from(model.quantity)
            .ok()
            .filter(|quantity| *quantity > 0)
            .ok_or_else(|| Error::InvalidRecord {
                message: format!("sale line {} has quantity {}", model.id, model.quantity),
            })?;
        Ok(Self {
            unit_kind: model.unit_kind.parse()?,
            product_id: model.product_id,
            product_code,
            product_name,
            quantity,
            unit_price: from_cents(model.unit_price_cents),
            subtotal: from_cents(model.subtotal_cents),
        })
    }
}

/// Payment to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPayment {
    /// Sale being paid
    pub sale_id: i64,
    /// Must equal the sale total
    pub amount: Decimal,
    /// How the customer paid
    pub method: PaymentMethod,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_payment_method_storage_names() {
        for method in [
            PaymentMethod::Cash,
            PaymentMethod::DebitCard,
            PaymentMethod::CreditCard,
            PaymentMethod::Transfer,
            PaymentMethod::MobileWallet,
        ] {
            assert_eq!(method.as_str().parse::<PaymentMethod>().unwrap(), method);
        }
        assert!(PaymentMethod::Cash.is_cash());
        assert!(!PaymentMethod::CreditCard.is_cash());
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_sale_conversion_validates_status() {
        let model = sale::Model {
            id: 4,
            total_cents: 696,
            status: "completed".to_string(),
            seller_id: 1,
            customer_name: None,
            customer_document: Some("12345678".to_string()),
            requires_prescription: false,
            created_at: Utc::now(),
        };
        let sale = Sale::try_from(model.clone()).unwrap();
        assert_eq!(sale.total, Decimal::new(696, 2));
        assert_eq!(sale.status, RecordStatus::Completed);

        let pending = sale::Model {
            status: "pending".to_string(),
            ..model
        };
        assert!(matches!(
            Sale::try_from(pending),
            Err(Error::InvalidRecord { .. })
        ));
    }

    #[test]
    fn test_line_conversion_rejects_bad_rows() {
        let model = sale_line::Model {
            id: 1,
            sale_id: 4,
            product_id: 9,
            unit_kind: "pack".to_string(),
            quantity: 2,
            unit_price_cents: 1500,
            subtotal_cents: 3000,
        };
        let detail =
            SaleLineDetail::from_model(model.clone(), "MED-009".to_string(), "Gauze".to_string())
                .unwrap();
        assert_eq!(detail.unit_kind, UnitKind::Pack);
        assert_eq!(detail.subtotal, Decimal::new(3000, 2));

        let zero = sale_line::Model {
            quantity: 0,
            ..model.clone()
        };
        assert!(SaleLineDetail::from_model(zero, String::new(), String::new()).is_err());

        let unknown = sale_line::Model {
            unit_kind: "crate".to_string(),
            ..model
        };
        assert!(SaleLineDetail::from_model(unknown, String::new(), String::new()).is_err());
    }
}
