//! Writing product datasets.
//!
//! Published datasets are produced elsewhere; the builder exists so that
//! `specwiz import` can turn a JSON export into a dataset file and so tests can
//! assemble small fixtures.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::migrations;
use crate::product::{Product, SpecEntry};

use super::schema::CATALOG_SCHEMA;
use super::Catalog;

/// A JSON export of products and their specifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportDocument {
    /// Products to write.
    pub products: Vec<ImportProduct>,
}

/// One product of an [`ImportDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportProduct {
    /// Dataset identifier.
    pub product_id: String,
    /// Name shown to the user.
    pub display_name: String,
    /// Canonical product page.
    pub product_url: String,
    /// Optional price.
    #[serde(default)]
    pub price: Option<f64>,
    /// Specification entries.
    #[serde(default)]
    pub specs: Vec<ImportSpec>,
}

/// One specification of an [`ImportProduct`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    /// Specification group display name.
    pub group: String,
    /// Specification key.
    pub key: String,
    /// Specification value.
    pub value: String,
    /// Human-readable key; defaults to `key`.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Human-readable value; defaults to `value`.
    #[serde(default)]
    pub display_value: Option<String>,
}

/// Counts of rows written by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Products written.
    pub products: usize,
    /// Specification rows written.
    pub specs: usize,
}

/// Creates a product dataset.
#[derive(Debug)]
pub struct CatalogBuilder {
    path: PathBuf,
    conn: Connection,
}

impl CatalogBuilder {
    /// Create a dataset file at `path`, or open an existing one for updating.
    ///
    /// Creates parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the schema cannot be
    /// initialized.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        migrations::initialize_schema(&conn, &CATALOG_SCHEMA)?;

        debug!("Created dataset at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        migrations::initialize_schema(&conn, &CATALOG_SCHEMA)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Insert or replace a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_product(&self, product: &Product) -> Result<()> {
        insert_product(&self.conn, product)
    }

    /// Insert a specification row. Duplicates are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_spec(&self, spec: &SpecEntry) -> Result<()> {
        insert_spec(&self.conn, spec)
    }

    /// Write every product of `document` in one transaction.
    ///
    /// Products already in the dataset are replaced along with all of their
    /// specification rows.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; nothing is written in that case.
    pub fn import(&mut self, document: &ImportDocument) -> Result<ImportSummary> {
        let tx = self.conn.transaction()?;
        let mut summary = ImportSummary::default();
        let mut replaced = HashSet::new();

        for item in &document.products {
            let product = Product::new(
                item.product_id.clone(),
                item.display_name.clone(),
                item.product_url.clone(),
                item.price,
            );
            insert_product(&tx, &product)?;
            summary.products += 1;

            // an exported product carries its full specification list
            if replaced.insert(item.product_id.as_str()) {
                let stale = delete_specs(&tx, &item.product_id)?;
                if stale > 0 {
                    debug!(product = %item.product_id, stale, "Replacing specifications");
                }
            }

            for spec in &item.specs {
                let entry = SpecEntry::new(
                    item.product_id.clone(),
                    spec.group.clone(),
                    spec.key.clone(),
                    spec.value.clone(),
                )
                .with_display(
                    spec.display_name.clone().unwrap_or_else(|| spec.key.clone()),
                    spec.display_value
                        .clone()
                        .unwrap_or_else(|| spec.value.clone()),
                );
                insert_spec(&tx, &entry)?;
                summary.specs += 1;
            }
        }

        tx.commit()?;
        info!(
            "Imported {} products and {} specifications into {}",
            summary.products,
            summary.specs,
            self.path.display()
        );
        Ok(summary)
    }

    /// Read an [`ImportDocument`] from a JSON file and write it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the import fails.
    pub fn import_json(&mut self, path: impl AsRef<Path>) -> Result<ImportSummary> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let document: ImportDocument = serde_json::from_str(&text)?;
        self.import(&document)
    }

    /// Close the builder and reopen the result as a read-only [`Catalog`].
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset cannot be reopened.
    pub fn finish(self) -> Result<Catalog> {
        if self.path.as_os_str() == ":memory:" {
            return Catalog::from_connection(self.conn);
        }
        self.conn.close().map_err(|(_, e)| Error::from(e))?;
        Catalog::open(&self.path)
    }
}

fn insert_product(conn: &Connection, product: &Product) -> Result<()> {
    conn.execute(
        r"
        INSERT OR REPLACE INTO products (productId, displayName, productUrl, price)
        VALUES (?1, ?2, ?3, ?4)
        ",
        params![
            product.product_id,
            product.display_name,
            product.product_url,
            product.price,
        ],
    )?;
    Ok(())
}

fn delete_specs(conn: &Connection, product_id: &str) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM specifications WHERE productId = ?1",
        params![product_id],
    )?)
}

fn insert_spec(conn: &Connection, spec: &SpecEntry) -> Result<()> {
    conn.execute(
        r"
        INSERT INTO specifications
            (productId, specGroupKeyDisplayName, specKey, specValue, specDisplayName, specDisplayValue)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ",
        params![
            spec.product_id,
            spec.group,
            spec.key,
            spec.value,
            spec.display_name,
            spec.display_value,
        ],
    )?;
    Ok(())
}
