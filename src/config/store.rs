//! Store configuration loading from config.toml
//!
//! The file names the store, optionally overrides the sales tax rate and lists the
//! products used to seed an empty catalog. Seeding only inserts codes that are not
//! yet present, so shelf counts edited at the till survive a restart.

use crate::{
    core::{cart::Cart, money::DEFAULT_TAX_RATE},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_VAR: &str = "POS_CONFIG";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// Store-wide settings
    #[serde(default)]
    pub store: StoreSettings,
    /// Products to seed
    #[serde(default)]
    pub products: Vec<ProductConfig>,
}

/// The `[store]` table
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Store name, logged when the till starts
    #[serde(default = "default_store_name")]
    pub name: String,
    /// Sales tax rate as a fraction, e.g. `"0.16"`
    #[serde(default = "default_tax_rate")]
    pub tax_rate: Decimal,
}

impl StoreSettings {
    /// Empty cart taxed at this store's rate.
    #[must_use]
    pub const fn new_cart(&self) -> Cart {
        Cart::with_tax_rate(self.tax_rate)
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            name: default_store_name(),
            tax_rate: default_tax_rate(),
        }
    }
}

fn default_store_name() -> String {
    "Pharmacy".to_string()
}

const fn default_tax_rate() -> Decimal {
    DEFAULT_TAX_RATE
}

const fn default_units_per_pack() -> u32 {
    1
}

/// Configuration for a single catalog product
#[derive(Debug, Deserialize, Clone)]
pub struct ProductConfig {
    /// Unique shelf code, e.g. `MED-001`
    pub code: String,
    /// Display name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Loose units in one pack
    #[serde(default = "default_units_per_pack")]
    pub units_per_pack: u32,
    /// Initial loose units on the shelf
    #[serde(default)]
    pub loose_units: u32,
    /// Initial packs on the shelf
    #[serde(default)]
    pub packs: u32,
    /// Price of one loose unit
    pub unit_price: Decimal,
    /// Price of one pack
    pub pack_price: Decimal,
    /// Whether a prescription must be verified at checkout
    #[serde(default)]
    pub requires_prescription: bool,
}

/// Loads store configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
/// - The tax rate is negative
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<StoreConfig> {
    debug!("Loading configuration from {:?}", path.as_ref());
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

fn parse_config(contents: &str) -> Result<StoreConfig> {
    let config: StoreConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if config.store.tax_rate.is_sign_negative() {
        return Err(Error::Config {
            message: format!("Tax rate cannot be negative: {}", config.store.tax_rate),
        });
    }
    Ok(config)
}

/// Loads store configuration from `$POS_CONFIG`, or `./config.toml` if unset
///
/// # Errors
/// Same as [`load_config`].
pub fn load_default_config() -> Result<StoreConfig> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_store_config() {
        let toml_str = r#"
            [store]
            name = "Farmacia Central"
            tax_rate = "0.08"

            [[products]]
            code = "MED-001"
            name = "Paracetamol 500mg"
            units_per_pack = 10
            loose_units = 30
            packs = 5
            unit_price = "2.00"
            pack_price = "15.00"

            [[products]]
            code = "MED-002"
            name = "Amoxicillin 500mg"
            unit_price = "1.50"
            pack_price = "16.00"
            requires_prescription = true
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.store.name, "Farmacia Central");
        assert_eq!(config.store.tax_rate, Decimal::new(8, 2));
        assert_eq!(config.products.len(), 2);
        assert_eq!(config.products[0].pack_price, Decimal::new(1500, 2));
        assert!(!config.products[0].requires_prescription);

        assert_eq!(config.products[1].units_per_pack, 1);
        assert_eq!(config.products[1].loose_units, 0);
        assert!(config.products[1].requires_prescription);

        assert_eq!(config.store.new_cart().tax_rate(), Decimal::new(8, 2));
    }

    #[test]
    fn test_missing_store_table_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.store, StoreSettings::default());
        assert_eq!(config.store.tax_rate, DEFAULT_TAX_RATE);
        assert!(config.products.is_empty());
    }

    #[test]
    fn test_rejects_negative_tax_rate() {
        let result = parse_config("[store]\ntax_rate = \"-0.16\"\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_missing_file_is_a_config_error() {
        let result = load_config("does/not/exist.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
