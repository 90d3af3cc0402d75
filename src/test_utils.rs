//! Shared test utilities.
//!
//! This module provides helpers for setting up test databases, creating test rows
//! with sensible defaults, and a store wrapper that fails on demand.

use crate::{
    core::{
        product::{self, NewProduct, Product},
        records::{NewPayment, NewSale, NewSaleLine, Sale, SaleLineDetail},
        session::{self, Role},
        store::SaleStore,
    },
    entities,
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DbErr};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_subscriber::EnvFilter;

/// Routes `tracing` output through the test harness. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

static NEXT_EMPLOYEE: AtomicUsize = AtomicUsize::new(1);

/// Creates an active employee with the given role and a unique email.
pub async fn create_test_employee(
    db: &DatabaseConnection,
    role: Role,
) -> Result<entities::employee::Model> {
    let n = NEXT_EMPLOYEE.fetch_add(1, Ordering::Relaxed);
    session::create_employee(
        db,
        &format!("Test {role} {n}"),
        &format!("{role}{n}@example.com"),
        role,
    )
    .await
}

/// Creates a test product with sensible defaults.
///
/// # Defaults
/// * name: `"Test <code>"`
/// * `units_per_pack`: 10
/// * `unit_price`: 2.00
/// * `pack_price`: 15.00
pub async fn create_test_product(
    db: &DatabaseConnection,
    code: &str,
    loose_units: u32,
    packs: u32,
    requires_prescription: bool,
) -> Result<entities::product::Model> {
    product::create_product(
        db,
        NewProduct {
            code: code.to_string(),
            name: format!("Test {code}"),
            description: None,
            units_per_pack: 10,
            loose_units,
            packs,
            unit_price: Decimal::new(200, 2),
            pack_price: Decimal::new(1500, 2),
            requires_prescription,
        },
    )
    .await
}

/// Creates a well-stocked test product (50 units, 10 packs) with custom prices.
pub async fn create_priced_product(
    db: &DatabaseConnection,
    code: &str,
    unit_price: Decimal,
    pack_price: Decimal,
    requires_prescription: bool,
) -> Result<entities::product::Model> {
    product::create_product(
        db,
        NewProduct {
            code: code.to_string(),
            name: format!("Test {code}"),
            description: None,
            units_per_pack: 10,
            loose_units: 50,
            packs: 10,
            unit_price,
            pack_price,
            requires_prescription,
        },
    )
    .await
}

/// Store call that [`FailingStore`] turns into an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    /// Pass everything through
    Never,
    /// `read_product`
    ProductRead,
    /// `insert_sale`
    SaleHeader,
    /// `insert_sale_lines`
    LineItems,
    /// `insert_payment`
    Payment,
    /// `read_sale_with_lines`
    SaleRead,
}

/// Wraps a store, fails the chosen call and counts writes that reached the inner store.
#[derive(Debug)]
pub struct FailingStore<S> {
    inner: S,
    fail_at: FailAt,
    writes: AtomicUsize,
}

impl<S> FailingStore<S> {
    /// Wraps `inner`, failing at `fail_at`.
    pub const fn new(inner: S, fail_at: FailAt) -> Self {
        Self {
            inner,
            fail_at,
            writes: AtomicUsize::new(0),
        }
    }

    /// The wrapped store
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Writes passed through to the inner store so far
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self, call: FailAt) -> Result<()> {
        if self.fail_at == call {
            return Err(Error::Database(DbErr::Custom(format!(
                "injected failure at {call:?}"
            ))));
        }
        Ok(())
    }

    fn count_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl<S: SaleStore> SaleStore for FailingStore<S> {
    async fn read_product(&self, product_id: i64) -> Result<Product> {
        self.check(FailAt::ProductRead)?;
        self.inner.read_product(product_id).await
    }

    async fn insert_sale(&self, sale: NewSale) -> Result<Sale> {
        self.check(FailAt::SaleHeader)?;
        self.count_write();
        self.inner.insert_sale(sale).await
    }

    async fn insert_sale_lines(&self, lines: Vec<NewSaleLine>) -> Result<()> {
        self.check(FailAt::LineItems)?;
        self.count_write();
        self.inner.insert_sale_lines(lines).await
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<()> {
        self.check(FailAt::Payment)?;
        self.count_write();
        self.inner.insert_payment(payment).await
    }

    async fn read_sale_with_lines(&self, sale_id: i64) -> Result<(Sale, Vec<SaleLineDetail>)> {
        self.check(FailAt::SaleRead)?;
        self.inner.read_sale_with_lines(sale_id).await
    }
}
