/// In-memory cart for the sale in progress
pub mod cart;
/// Stock receipts, withdrawals, adjustments and movement history
pub mod inventory;
/// Decimal money, cents conversion and sales tax
pub mod money;
/// Catalog products and stock counts
pub mod product;
/// Receipts rebuilt from stored sales
pub mod receipt;
/// Typed sale, line and payment records
pub mod records;
/// Sale committer and checkout
pub mod sale;
/// Employees and the signed-in session
pub mod session;
/// Stock validation before commit
pub mod stock;
/// Persistence boundary for the sale workflow
pub mod store;
