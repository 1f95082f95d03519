//! Read-only access to the product dataset.
//!
//! The dataset is an `SQLite` file with a `products` table and a denormalized
//! `specifications` table joined on `productId`. A [`Catalog`] never writes to
//! it; new datasets are produced with [`CatalogBuilder`].

mod builder;
pub mod schema;

pub use builder::{CatalogBuilder, ImportDocument, ImportProduct, ImportSpec, ImportSummary};

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::product::{FacetGroup, Product, SpecFacet};

use schema::{PRODUCTS_TABLE, PRODUCT_COLUMNS, SPECIFICATIONS_TABLE, SPECIFICATION_COLUMNS};

/// Column list selecting a [`Product`] from `products p`.
pub(crate) const PRODUCT_SELECT: &str =
    "CAST(p.productId AS TEXT), p.displayName, p.productUrl, p.price";

/// Ascending price with missing prices last; name and id make ties deterministic.
pub(crate) const PRICE_ORDER: &str =
    "ORDER BY p.price IS NULL, p.price ASC, p.displayName ASC, p.productId ASC";

/// An immutable, queryable snapshot of the product dataset.
#[derive(Debug)]
pub struct Catalog {
    /// Where the dataset was read from.
    path: PathBuf,
    /// Read-only connection.
    conn: Connection,
    /// blake3 hash of the dataset file, when loaded from bytes.
    fingerprint: Option<String>,
}

impl Catalog {
    /// Open a dataset file read-only.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or lacks the expected
    /// tables and columns.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        debug!("Opening dataset at {}", path.display());
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        let catalog = Self::with_path(conn, path)?;
        info!("Dataset opened successfully at {}", catalog.path.display());
        Ok(catalog)
    }

    /// Open a dataset from the bytes of its file.
    ///
    /// The bytes are copied into an in-memory, read-only database, so the
    /// catalog queries exactly what was read even if `path` later changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not an `SQLite` database or lack the
    /// expected tables and columns.
    pub fn from_bytes(path: impl AsRef<Path>, bytes: &[u8]) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        debug!(bytes = bytes.len(), "Deserializing dataset read from {}", path.display());
        let mut conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        conn.deserialize_read_exact("main", bytes, bytes.len(), true)
            .map_err(|source| Error::DatabaseOpen {
                path: path.clone(),
                source,
            })?;

        Self::with_path(conn, path)
    }

    /// Wrap an existing connection, e.g. an in-memory dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection lacks the expected tables and columns.
    pub fn from_connection(conn: Connection) -> Result<Self> {
        Self::with_path(conn, PathBuf::from(":memory:"))
    }

    fn with_path(conn: Connection, path: PathBuf) -> Result<Self> {
        verify_table(&conn, PRODUCTS_TABLE, PRODUCT_COLUMNS)?;
        verify_table(&conn, SPECIFICATIONS_TABLE, SPECIFICATION_COLUMNS)?;
        conn.execute_batch("PRAGMA query_only = ON;")?;
        Ok(Self {
            path,
            conn,
            fingerprint: None,
        })
    }

    /// Attach the fingerprint of the bytes this dataset was loaded from.
    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    /// Get the path the dataset was opened from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the dataset fingerprint, if known.
    #[must_use]
    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Count distinct products and distinct specification keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<CatalogStats> {
        let products: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT productId) FROM products",
            [],
            |row| row.get(0),
        )?;
        let spec_keys: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT specKey) FROM specifications",
            [],
            |row| row.get(0),
        )?;

        Ok(CatalogStats {
            products: to_count(products),
            spec_keys: to_count(spec_keys),
            fingerprint: self.fingerprint.clone(),
        })
    }

    /// Names of all specification groups, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn group_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT specGroupKeyDisplayName FROM specifications ORDER BY 1",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// Every distinct (group, key, value), grouped by specification group.
    ///
    /// This is the data behind the checkbox tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn facets(&self) -> Result<Vec<FacetGroup>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT specGroupKeyDisplayName, specKey, specValue,
                   MIN(specDisplayName), MIN(specDisplayValue), COUNT(DISTINCT productId)
            FROM specifications
            GROUP BY specGroupKeyDisplayName, specKey, specValue
            ORDER BY specGroupKeyDisplayName, specKey, specValue
            ",
        )?;

        let facets = stmt
            .query_map([], |row| {
                let product_count: i64 = row.get(5)?;
                Ok(SpecFacet {
                    group: row.get(0)?,
                    key: row.get(1)?,
                    value: row.get(2)?,
                    display_name: row.get(3)?,
                    display_value: row.get(4)?,
                    product_count: to_count(product_count),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut groups: Vec<FacetGroup> = Vec::new();
        for facet in facets {
            match groups.last_mut() {
                Some(group) if group.name == facet.group => group.facets.push(facet),
                _ => groups.push(FacetGroup {
                    name: facet.group.clone(),
                    facets: vec![facet],
                }),
            }
        }
        Ok(groups)
    }

    /// Products carrying one specific key and value, cheapest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn products_with_spec(&self, key: &str, value: &str) -> Result<Vec<Product>> {
        let sql = format!(
            r"
            SELECT {PRODUCT_SELECT}
            FROM products p
            WHERE EXISTS (
                SELECT 1 FROM specifications s
                WHERE s.productId = p.productId AND s.specKey = ?1 AND s.specValue = ?2
            )
            {PRICE_ORDER}
            "
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let products = stmt
            .query_map([key, value], row_to_product)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(products)
    }
}

/// Statistics about the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    /// Number of distinct products.
    pub products: usize,
    /// Number of distinct specification keys.
    pub spec_keys: usize,
    /// blake3 hash of the dataset file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// Convert a row selected with [`PRODUCT_SELECT`] into a [`Product`].
pub(crate) fn row_to_product(row: &rusqlite::Row) -> rusqlite::Result<Product> {
    Ok(Product {
        product_id: row.get(0)?,
        display_name: row.get(1)?,
        product_url: row.get(2)?,
        price: row.get(3)?,
    })
}

fn to_count(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}

/// Check that `table` exists and has every column in `required`.
fn verify_table(conn: &Connection, table: &str, required: &[&str]) -> Result<()> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if columns.is_empty() {
        return Err(Error::dataset_schema(format!("missing table {table}")));
    }
    if let Some(missing) = required.iter().find(|c| !columns.iter().any(|have| have == *c)) {
        return Err(Error::dataset_schema(format!(
            "table {table} has no column {missing}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::SpecEntry;

    fn create_test_catalog() -> Catalog {
        let builder = CatalogBuilder::in_memory().unwrap();
        builder
            .insert_product(&Product::new("p1", "Forerunner 265", "https://example.com/fr265", Some(4999.0)))
            .unwrap();
        builder
            .insert_product(&Product::new("p2", "Instinct 2", "https://example.com/instinct2", Some(2999.0)))
            .unwrap();
        builder
            .insert_product(&Product::new("p3", "Edge 1040", "https://example.com/edge1040", None))
            .unwrap();
        for spec in [
            SpecEntry::new("p1", "Display", "displayType", "amoled").with_display("Display type", "AMOLED"),
            SpecEntry::new("p2", "Display", "displayType", "mip").with_display("Display type", "MIP"),
            SpecEntry::new("p1", "Sensors", "gps", "multiband"),
            SpecEntry::new("p2", "Sensors", "gps", "multiband"),
            SpecEntry::new("p3", "Sensors", "gps", "multiband"),
        ] {
            builder.insert_spec(&spec).unwrap();
        }
        builder.finish().unwrap()
    }

    #[test]
    fn test_stats() {
        let catalog = create_test_catalog();
        let stats = catalog.stats().unwrap();
        assert_eq!(stats.products, 3);
        assert_eq!(stats.spec_keys, 2);
        assert!(stats.fingerprint.is_none());
    }

    #[test]
    fn test_group_names_sorted() {
        let catalog = create_test_catalog();
        assert_eq!(catalog.group_names().unwrap(), vec!["Display", "Sensors"]);
    }

    #[test]
    fn test_facets_grouped_and_counted() {
        let catalog = create_test_catalog();
        let groups = catalog.facets().unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Display");
        assert_eq!(groups[0].facets.len(), 2);
        assert_eq!(groups[0].facets[0].value, "amoled");
        assert_eq!(groups[0].facets[0].display_value, "AMOLED");
        assert_eq!(groups[1].facets[0].product_count, 3);
    }

    #[test]
    fn test_products_with_spec_ordered_by_price() {
        let catalog = create_test_catalog();
        let products = catalog.products_with_spec("gps", "multiband").unwrap();

        let ids: Vec<&str> = products.iter().map(|p| p.product_id.as_str()).collect();
        assert_eq!(ids, vec!["p2", "p1", "p3"]);
    }

    #[test]
    fn test_products_with_unknown_spec() {
        let catalog = create_test_catalog();
        assert!(catalog.products_with_spec("gps", "none").unwrap().is_empty());
    }

    #[test]
    fn test_catalog_is_read_only() {
        let catalog = create_test_catalog();
        let result = catalog
            .connection()
            .execute("DELETE FROM products", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_connection_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(schema::CREATE_PRODUCTS_TABLE).unwrap();

        let err = Catalog::from_connection(conn).unwrap_err();
        assert!(err.to_string().contains("missing table specifications"));
    }

    #[test]
    fn test_from_connection_missing_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE products (productId TEXT, displayName TEXT, productUrl TEXT);",
        )
        .unwrap();
        conn.execute_batch(schema::CREATE_SPECIFICATIONS_TABLE).unwrap();

        let err = Catalog::from_connection(conn).unwrap_err();
        assert!(err.to_string().contains("no column price"));
    }

    #[test]
    fn test_open_nonexistent_file() {
        let err = Catalog::open("/nonexistent/path/products.db").unwrap_err();
        assert!(matches!(err, Error::DatabaseOpen { .. }));
    }

    #[test]
    fn test_from_bytes_is_a_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.db");
        let builder = CatalogBuilder::create(&path).unwrap();
        builder
            .insert_product(&Product::new("p1", "Fenix 8", "https://example.com/fenix8", Some(9999.0)))
            .unwrap();
        builder.finish().unwrap();
        let bytes = std::fs::read(&path).unwrap();

        // replace the file after its bytes were read
        std::fs::remove_file(&path).unwrap();
        let builder = CatalogBuilder::create(&path).unwrap();
        builder
            .insert_product(&Product::new("p2", "Venu 3", "https://example.com/venu3", None))
            .unwrap();
        builder
            .insert_product(&Product::new("p3", "Edge 1040", "https://example.com/edge1040", None))
            .unwrap();
        builder.finish().unwrap();

        let catalog = Catalog::from_bytes(&path, &bytes).unwrap();
        assert_eq!(catalog.path(), path.as_path());
        assert_eq!(catalog.stats().unwrap().products, 1);
        assert!(catalog.connection().execute("DELETE FROM products", []).is_err());
    }

    #[test]
    fn test_from_bytes_rejects_garbage() {
        assert!(Catalog::from_bytes("products.db", b"this is not sqlite").is_err());
    }

    #[test]
    fn test_integer_product_ids_are_read_as_text() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r"
            CREATE TABLE products (productId INTEGER, displayName TEXT, productUrl TEXT, price REAL);
            CREATE TABLE specifications (productId INTEGER, specGroupKeyDisplayName TEXT,
                specKey TEXT, specValue TEXT, specDisplayName TEXT, specDisplayValue TEXT);
            INSERT INTO products VALUES (42, 'Venu 3', 'https://example.com/venu3', 4499);
            INSERT INTO specifications VALUES (42, 'Display', 'displayType', 'amoled', 'Display type', 'AMOLED');
            ",
        )
        .unwrap();

        let catalog = Catalog::from_connection(conn).unwrap();
        let products = catalog.products_with_spec("displayType", "amoled").unwrap();
        assert_eq!(products[0].product_id, "42");
        assert_eq!(products[0].price, Some(4499.0));
    }
}
