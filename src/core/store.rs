//! Persistence boundary for the sale workflow.
//!
//! The stock validator, sale committer and receipt builder only talk to a
//! [`SaleStore`]. [`DbStore`] is the `SeaORM` implementation used by the till; tests
//! wrap it to inject failures at a given write.

use crate::{
    core::{
        inventory,
        money::to_cents,
        product::Product,
        records::{NewPayment, NewSale, NewSaleLine, RecordStatus, Sale, SaleLineDetail},
    },
    entities::{
        Product as ProductEntity, Sale as SaleEntity, SaleLine as SaleLineEntity, payment, sale,
        sale_line,
    },
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, instrument};

/// Reads and writes needed to finalize a sale and print its receipt.
///
/// The three inserts are independent writes; an implementation is not expected to
/// make them atomic with each other.
pub trait SaleStore {
    /// Fresh snapshot of a product.
    ///
    /// # Errors
    /// Returns `Error::ProductNotFound` if no product has this id.
    async fn read_product(&self, product_id: i64) -> Result<Product>;

    /// Writes a sale header with status `completed` and returns it with its id.
    async fn insert_sale(&self, sale: NewSale) -> Result<Sale>;

    /// Writes all lines of a sale and takes the sold goods off the shelf.
    async fn insert_sale_lines(&self, lines: Vec<NewSaleLine>) -> Result<()>;

    /// Writes the payment of a sale with status `completed`.
    async fn insert_payment(&self, payment: NewPayment) -> Result<()>;

    /// Reads a sale header and its lines, each joined with product code and name.
    ///
    /// # Errors
    /// Returns `Error::SaleNotFound` if no sale has this id.
    async fn read_sale_with_lines(&self, sale_id: i64) -> Result<(Sale, Vec<SaleLineDetail>)>;
}

/// [`SaleStore`] backed by a `SeaORM` connection.
#[derive(Debug)]
pub struct DbStore {
    db: DatabaseConnection,
}

impl DbStore {
    /// Wraps a database connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Gives the connection back.
    #[must_use]
    pub fn into_inner(self) -> DatabaseConnection {
        self.db
    }
}

fn quantity_column(quantity: u32) -> Result<i32> {
    i32::try_from(quantity).map_err(|_| Error::InvalidQuantity {
        quantity: i64::from(quantity),
    })
}

impl SaleStore for DbStore {
    #[instrument(skip(self))]
    async fn read_product(&self, product_id: i64) -> Result<Product> {
        let model = ProductEntity::find_by_id(product_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| Error::ProductNotFound {
                name: format!("id {product_id}"),
            })?;
        Product::try_from(model)
    }

    #[instrument(skip(self, sale), fields(seller_id = sale.seller_id, total = %sale.total))]
    async fn insert_sale(&self, sale: NewSale) -> Result<Sale> {
        let model = sale::ActiveModel {
            total_cents: Set(to_cents(sale.total)?),
            status: Set(RecordStatus::Completed.as_str().to_string()),
            seller_id: Set(sale.seller_id),
            customer_name: Set(sale.customer_name),
            customer_document: Set(sale.customer_document),
            requires_prescription: Set(sale.requires_prescription),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        debug!("Inserted sale header {}", model.id);
        Sale::try_from(model)
    }

    #[instrument(skip(self, lines), fields(count = lines.len()))]
    async fn insert_sale_lines(&self, lines: Vec<NewSaleLine>) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }

        let txn = self.db.begin().await?;

        let mut models = Vec::with_capacity(lines.len());
        for line in &lines {
            models.push(sale_line::ActiveModel {
                sale_id: Set(line.sale_id),
                product_id: Set(line.product_id),
                unit_kind: Set(line.unit_kind.as_str().to_string()),
                quantity: Set(quantity_column(line.quantity)?),
                unit_price_cents: Set(to_cents(line.unit_price)?),
                subtotal_cents: Set(to_cents(line.subtotal)?),
                ..Default::default()
            });
        }
        SaleLineEntity::insert_many(models).exec(&txn).await?;

        let mut seller: Option<(i64, i64)> = None;
        for line in &lines {
            let seller_id = match seller {
                Some((sale_id, seller_id)) if sale_id == line.sale_id => seller_id,
                _ => {
                    let header = SaleEntity::find_by_id(line.sale_id)
                        .one(&txn)
                        .await?
                        .ok_or(Error::SaleNotFound {
                            sale_id: line.sale_id,
                        })?;
                    seller = Some((header.id, header.seller_id));
                    header.seller_id
                }
            };
            inventory::record_sale(
                &txn,
                line.sale_id,
                seller_id,
                line.product_id,
                line.unit_kind,
                line.quantity,
            )
            .await?;
        }

        txn.commit().await?;
        debug!("Stored {} sale lines and reduced stock", lines.len());
        Ok(())
    }

    #[instrument(skip(self, payment), fields(sale_id = payment.sale_id, method = payment.method.as_str()))]
    async fn insert_payment(&self, payment: NewPayment) -> Result<()> {
        payment::ActiveModel {
            sale_id: Set(payment.sale_id),
            amount_cents: Set(to_cents(payment.amount)?),
            method: Set(payment.method.as_str().to_string()),
            status: Set(RecordStatus::Completed.as_str().to_string()),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn read_sale_with_lines(&self, sale_id: i64) -> Result<(Sale, Vec<SaleLineDetail>)> {
        let header = SaleEntity::find_by_id(sale_id)
            .one(&self.db)
            .await?
            .ok_or(Error::SaleNotFound { sale_id })?;

        let rows = SaleLineEntity::find()
            .filter(sale_line::Column::SaleId.eq(sale_id))
            .order_by_asc(sale_line::Column::Id)
            .find_also_related(ProductEntity)
            .all(&self.db)
            .await?;

        let lines = rows
            .into_iter()
            .map(|(line, product)| {
                let product = product.ok_or_else(|| Error::InvalidRecord {
                    message: format!(
                        "sale line {} refers to missing product {}",
                        line.id, line.product_id
                    ),
                })?;
                SaleLineDetail::from_model(line, product.code, product.name)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((Sale::try_from(header)?, lines))
    }
}
