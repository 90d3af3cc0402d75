use dotenvy::dotenv;
use pharmacy_pos::{
    config::{database, store},
    core::product,
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load store configuration
    let config = store::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!(
        "Starting till for {} (tax rate {})",
        config.store.name, config.store.tax_rate
    );

    // 4. Initialize database
    if database::get_database_url() == database::DEFAULT_DATABASE_URL {
        std::fs::create_dir_all("data")?;
    }
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to open database: {}", e))?;
    database::create_tables(&db).await?;

    // 5. Seed catalog products missing from the database
    product::seed_products(&db, &config.products)
        .await
        .inspect_err(|e| error!("Failed to seed products: {}", e))?;

    let catalog = product::get_all_active_products(&db).await?;
    info!("{} active products in catalog", catalog.len());
    for item in &catalog {
        info!(
            "{} {}: {} units, {} packs",
            item.code, item.name, item.loose_units, item.packs
        );
    }

    // 6. Open the first cart at the configured tax rate
    let cart = config.store.new_cart();
    info!("Till ready, carts taxed at {}", cart.tax_rate());

    Ok(())
}
