//! `SQLite` schema definitions for the product dataset.
//!
//! Column names follow the published dataset, which is camel-cased.

use crate::migrations::{Migration, Schema};

/// Name of the products table.
pub const PRODUCTS_TABLE: &str = "products";

/// Name of the specifications table.
pub const SPECIFICATIONS_TABLE: &str = "specifications";

/// Columns a dataset must expose on the products table.
pub const PRODUCT_COLUMNS: &[&str] = &["productId", "displayName", "productUrl", "price"];

/// Columns a dataset must expose on the specifications table.
pub const SPECIFICATION_COLUMNS: &[&str] = &[
    "productId",
    "specGroupKeyDisplayName",
    "specKey",
    "specValue",
    "specDisplayName",
    "specDisplayValue",
];

/// SQL statement to create the products table.
pub const CREATE_PRODUCTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS products (
    productId TEXT PRIMARY KEY,
    displayName TEXT NOT NULL,
    productUrl TEXT NOT NULL,
    price REAL
)
";

/// SQL statement to create the specifications table.
///
/// No uniqueness constraint: published datasets do contain repeated rows.
pub const CREATE_SPECIFICATIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS specifications (
    productId TEXT NOT NULL,
    specGroupKeyDisplayName TEXT NOT NULL,
    specKey TEXT NOT NULL,
    specValue TEXT NOT NULL,
    specDisplayName TEXT NOT NULL,
    specDisplayValue TEXT NOT NULL
)
";

/// Index backing the per-product lookups of the facet query.
pub const CREATE_SPEC_PRODUCT_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_specifications_product ON specifications(productId)
";

/// Index backing criterion matching.
pub const CREATE_SPEC_FACET_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_specifications_facet
    ON specifications(specGroupKeyDisplayName, specKey, specValue)
";

/// Index for ordering results by price.
pub const CREATE_PRICE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_products_price ON products(price)
";

/// Dataset layout written by the catalog builder.
pub const CATALOG_SCHEMA: Schema = Schema {
    name: "catalog",
    statements: &[
        CREATE_PRODUCTS_TABLE,
        CREATE_SPECIFICATIONS_TABLE,
        CREATE_SPEC_PRODUCT_INDEX,
        CREATE_SPEC_FACET_INDEX,
        CREATE_PRICE_INDEX,
    ],
    migrations: &[Migration { version: 1, sql: "" }],
};
