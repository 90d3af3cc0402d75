//! Receipts for committed sales.
//!
//! A receipt is always built from what the store holds, never from the cart, so it
//! shows exactly what was recorded.

use crate::{
    core::{
        money::format_amount,
        records::{Sale, SaleLineDetail},
        store::SaleStore,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use std::fmt;
use tracing::{instrument, warn};

/// Printable summary of a stored sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Sale header as stored
    pub sale: Sale,
    /// Sale lines as stored, in insertion order
    pub lines: Vec<SaleLineDetail>,
    /// Sum of stored line subtotals
    pub subtotal: Decimal,
    /// `total - subtotal`
    pub tax: Decimal,
    /// Stored sale total
    pub total: Decimal,
}

/// Re-reads a committed sale and its lines and assembles the receipt.
///
/// # Errors
/// Returns `Error::ReceiptUnavailable` wrapping the read error. The sale itself is
/// unaffected.
#[instrument(skip(store))]
pub async fn build_receipt<S: SaleStore>(store: &S, sale_id: i64) -> Result<Receipt> {
    let (sale, lines) = store
        .read_sale_with_lines(sale_id)
        .await
        .map_err(|source| {
            warn!("Receipt for sale {} unavailable: {}", sale_id, source);
            Error::ReceiptUnavailable {
                sale_id,
                source: Box::new(source),
            }
        })?;

    let subtotal: Decimal = lines.iter().map(|line| line.subtotal).sum();
    let total = sale.total;
    Ok(Receipt {
        sale,
        lines,
        subtotal,
        tax: total - subtotal,
        total,
    })
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sale #{}", self.sale.id)?;
        writeln!(f, "{}", self.sale.created_at.format("%Y-%m-%d %H:%M"))?;
        if let Some(name) = &self.sale.customer_name {
            writeln!(f, "Customer: {name}")?;
        }
        if let Some(document) = &self.sale.customer_document {
            writeln!(f, "Document: {document}")?;
        }
        writeln!(f)?;

        for line in &self.lines {
            writeln!(
                f,
                "{} {} x{} {} @ {} = {}",
                line.product_code,
                line.product_name,
                line.quantity,
                line.unit_kind,
                format_amount(line.unit_price),
                format_amount(line.subtotal)
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Subtotal: {}", format_amount(self.subtotal))?;
        writeln!(f, "Tax: {}", format_amount(self.tax))?;
        write!(f, "Total: {}", format_amount(self.total))
    }
}
