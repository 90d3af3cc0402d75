//! Sale finalization.
//!
//! A sale is persisted as three sequential writes (header, lines, payment) with no
//! wrapping transaction and no rollback. If a write after the header fails, the rows
//! already written stay in the store and the error carries the sale id so the operator
//! can reconcile it by hand. The line write also takes the sold goods off the shelf.

use crate::{
    core::{
        cart::Cart,
        money::{Totals, round_cents},
        records::{NewPayment, NewSale, NewSaleLine, PaymentMethod},
        session::Session,
        stock::{self, StockVerdict},
        store::SaleStore,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use std::fmt;
use tracing::{debug, error, info, instrument, warn};

/// One of the three writes that make up a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    /// The `sales` row
    SaleHeader,
    /// The `sale_lines` rows
    LineItems,
    /// The `payments` row
    Payment,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SaleHeader => "sale header",
            Self::LineItems => "line items",
            Self::Payment => "payment",
        })
    }
}

/// Why a commit attempt stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// Stock check rejected the cart or a product could not be read
    Stock,
    /// Sale header write failed; nothing was persisted
    HeaderWrite,
    /// Line write failed; `partial` is set when the header is already persisted
    LinesWrite {
        /// Earlier writes are in the store
        partial: bool,
    },
    /// Payment write failed; `partial` is set when header and lines are persisted
    PaymentWrite {
        /// Earlier writes are in the store
        partial: bool,
    },
}

/// Where a commit attempt currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitStage {
    /// Nothing started yet, or rejected before any I/O
    #[default]
    Idle,
    /// Re-reading stock for every line
    ValidatingStock,
    /// Writing the sale header
    WritingSaleHeader,
    /// Writing the sale lines
    WritingLineItems,
    /// Writing the payment
    WritingPayment,
    /// All three writes succeeded
    Committed,
    /// Stopped; see the reason
    Failed(FailureReason),
}

/// What the cashier entered at the payment screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkout {
    method: PaymentMethod,
    tendered: Option<Decimal>,
    customer_name: Option<String>,
    customer_document: Option<String>,
    prescription_confirmed: bool,
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl Checkout {
    /// Starts a checkout paid by `method`.
    #[must_use]
    pub const fn new(method: PaymentMethod) -> Self {
        Self {
            method,
            tendered: None,
            customer_name: None,
            customer_document: None,
            prescription_confirmed: false,
        }
    }

    /// Amount of cash handed over.
    #[must_use]
    pub fn with_tendered(mut self, amount: Decimal) -> Self {
        self.tendered = Some(amount);
        self
    }

    /// Customer name and document number. Blank values are dropped.
    #[must_use]
    pub fn with_customer(mut self, name: impl Into<String>, document: impl Into<String>) -> Self {
        self.customer_name = non_blank(name.into());
        self.customer_document = non_blank(document.into());
        self
    }

    /// Marks the prescription as checked by the cashier.
    #[must_use]
    pub fn with_prescription_confirmed(mut self) -> Self {
        self.prescription_confirmed = true;
        self
    }

    /// Payment method
    #[must_use]
    pub const fn method(&self) -> PaymentMethod {
        self.method
    }

    /// Tendered cash, if any
    #[must_use]
    pub const fn tendered(&self) -> Option<Decimal> {
        self.tendered
    }

    /// Change owed for a sale of `total`. Non-cash methods never give change.
    ///
    /// # Errors
    /// Returns `Error::InsufficientPayment` for a cash payment with no tendered amount
    /// or one below `total`.
    pub fn change_due(&self, total: Decimal) -> Result<Option<Decimal>> {
        if !self.method.is_cash() {
            return Ok(None);
        }
        let tendered = self.tendered.unwrap_or(Decimal::ZERO);
        if tendered < total {
            return Err(Error::InsufficientPayment { tendered, total });
        }
        Ok(Some(round_cents(tendered - total)))
    }
}

/// Result of a successful commit, handed to the receipt builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedSale {
    /// Id of the new sale
    pub sale_id: i64,
    /// Totals as charged
    pub totals: Totals,
    /// How the customer paid
    pub method: PaymentMethod,
    /// Change handed back, for cash payments
    pub change: Option<Decimal>,
}

/// Drives one sale through stock validation and the three writes.
#[derive(Debug)]
pub struct SaleCommitter<'a, S> {
    store: &'a S,
    stage: CommitStage,
}

impl<'a, S: SaleStore> SaleCommitter<'a, S> {
    /// Creates an idle committer over `store`.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self {
            store,
            stage: CommitStage::Idle,
        }
    }

    /// Stage reached by the last attempt
    #[must_use]
    pub const fn stage(&self) -> CommitStage {
        self.stage
    }

    /// Persists the cart as a sale paid according to `checkout`.
    ///
    /// Empty carts, sellers without permission, short cash and unconfirmed
    /// prescriptions are rejected before any I/O. Stock is then re-validated and the
    /// header, lines and payment are written in that order. On success the cart is
    /// cleared; on any failure it is left as it was.
    ///
    /// # Errors
    /// - `Error::EmptyCart`, `Error::PermissionDenied`, `Error::InsufficientPayment`,
    ///   `Error::PrescriptionNotConfirmed` before any I/O
    /// - `Error::InsufficientStock` if a line no longer fits current stock
    /// - `Error::SaleWrite` if a write fails; see [`Error::is_partial_commit`]
    #[instrument(skip_all, fields(seller = session.employee().id, method = checkout.method().as_str()))]
    pub async fn commit(
        &mut self,
        session: &Session,
        cart: &mut Cart,
        checkout: &Checkout,
    ) -> Result<CommittedSale> {
        let store = self.store;
        self.stage = CommitStage::Idle;

        if cart.is_empty() {
            return Err(Error::EmptyCart);
        }
        if !session.can_sell() {
            let employee = session.employee();
            return Err(Error::PermissionDenied {
                name: employee.name.clone(),
                role: employee.role.to_string(),
                action: "ring up sales".to_string(),
            });
        }
        let totals = cart.totals();
        let change = checkout.change_due(totals.total)?;
        if cart.requires_prescription() && !checkout.prescription_confirmed {
            return Err(Error::PrescriptionNotConfirmed);
        }

        self.stage = CommitStage::ValidatingStock;
        match stock::validate(store, cart).await {
            Ok(StockVerdict::Valid) => {}
            Ok(StockVerdict::Short(shortage)) => {
                self.stage = CommitStage::Failed(FailureReason::Stock);
                return Err(shortage.into());
            }
            Err(e) => {
                warn!("Stock check failed: {}", e);
                self.stage = CommitStage::Failed(FailureReason::Stock);
                return Err(e);
            }
        }

        self.stage = CommitStage::WritingSaleHeader;
        let header = NewSale {
            total: totals.total,
            seller_id: session.employee().id,
            customer_name: checkout.customer_name.clone(),
            customer_document: checkout.customer_document.clone(),
            requires_prescription: cart.requires_prescription(),
        };
        let sale = match store.insert_sale(header).await {
            Ok(sale) => sale,
            Err(source) => return Err(self.write_failed(WriteStage::SaleHeader, None, source)),
        };
        debug!("Sale header {} written", sale.id);

        self.stage = CommitStage::WritingLineItems;
        let lines = cart
            .lines()
            .iter()
            .map(|line| NewSaleLine {
                sale_id: sale.id,
                product_id: line.product_id(),
                unit_kind: line.unit_kind(),
                quantity: line.quantity(),
                unit_price: line.unit_price(),
                subtotal: line.subtotal(),
            })
            .collect();
        if let Err(source) = store.insert_sale_lines(lines).await {
            return Err(self.write_failed(WriteStage::LineItems, Some(sale.id), source));
        }

        self.stage = CommitStage::WritingPayment;
        let payment = NewPayment {
            sale_id: sale.id,
            amount: totals.total,
            method: checkout.method,
        };
        if let Err(source) = store.insert_payment(payment).await {
            return Err(self.write_failed(WriteStage::Payment, Some(sale.id), source));
        }

        self.stage = CommitStage::Committed;
        cart.clear();
        info!(
            "Sale {} committed: total {} paid by {}",
            sale.id,
            totals.total,
            checkout.method.as_str()
        );

        Ok(CommittedSale {
            sale_id: sale.id,
            totals,
            method: checkout.method,
            change,
        })
    }

    fn write_failed(&mut self, stage: WriteStage, sale_id: Option<i64>, source: Error) -> Error {
        let partial = sale_id.is_some();
        let reason = match stage {
            WriteStage::SaleHeader => FailureReason::HeaderWrite,
            WriteStage::LineItems => FailureReason::LinesWrite { partial },
            WriteStage::Payment => FailureReason::PaymentWrite { partial },
        };
        self.stage = CommitStage::Failed(reason);

        if let Some(id) = sale_id {
            error!(
                "Sale {} left partially recorded: {} write failed: {}",
                id, stage, source
            );
        } else {
            warn!("Sale not recorded: {} write failed: {}", stage, source);
        }

        Error::SaleWrite {
            stage,
            sale_id,
            source: Box::new(source),
        }
    }
}
