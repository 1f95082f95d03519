//! Translating a selection into SQL.
//!
//! Within one (group, key) the selected values are alternatives, and all
//! facets are OR-ed together in the row predicate. The AND across facets
//! comes from the `HAVING` clause: a product matches only when the number of
//! distinct (group, key) pairs it satisfies equals the number selected.
//! Counting distinct pairs rather than rows keeps duplicate specification
//! rows from satisfying a facet twice.

use rusqlite::Connection;
use tracing::debug;

use crate::catalog::{row_to_product, PRICE_ORDER, PRODUCT_SELECT};
use crate::error::Result;
use crate::product::Product;

use super::selection::SelectionState;

/// A parameterised query produced by [`build_query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetQuery {
    sql: String,
    params: Vec<String>,
    required_facets: usize,
    inverted: bool,
}

impl FacetQuery {
    /// The SQL text. Every criterion value is a bound `?` parameter.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound parameters in placeholder order.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Number of distinct (group, key) facets a product must satisfy.
    #[must_use]
    pub fn required_facets(&self) -> usize {
        self.required_facets
    }

    /// Whether this is the "products without" anti-join.
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Run the query, cheapest products first and unpriced products last.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn execute(&self, conn: &Connection) -> Result<Vec<Product>> {
        let mut stmt = conn.prepare(&self.sql)?;
        let products = stmt
            .query_map(rusqlite::params_from_iter(self.params.iter()), row_to_product)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(products)
    }
}

/// Build the query for `selection`.
///
/// With `invert` set, the result is every product that has at least one
/// specification entry but none matching a selected criterion.
#[must_use]
pub fn build_query(selection: &SelectionState, invert: bool) -> FacetQuery {
    let mut params = Vec::new();
    let predicate = build_predicate(selection, &mut params);
    let required_facets = selection.facet_count();

    let sql = match (predicate, invert) {
        (None, false) => format!("SELECT {PRODUCT_SELECT} FROM products p {PRICE_ORDER}"),
        (None, true) => format!(
            r"SELECT {PRODUCT_SELECT} FROM products p
WHERE EXISTS (SELECT 1 FROM specifications s WHERE s.productId = p.productId)
{PRICE_ORDER}"
        ),
        (Some(predicate), false) => format!(
            r"SELECT {PRODUCT_SELECT} FROM products p
JOIN (
    SELECT productId FROM (
        SELECT DISTINCT s.productId, s.specGroupKeyDisplayName, s.specKey
        FROM specifications s
        WHERE {predicate}
    )
    GROUP BY productId
    HAVING COUNT(*) = {required_facets}
) m ON m.productId = p.productId
{PRICE_ORDER}"
        ),
        (Some(predicate), true) => format!(
            r"SELECT {PRODUCT_SELECT} FROM products p
WHERE EXISTS (SELECT 1 FROM specifications s WHERE s.productId = p.productId)
AND NOT EXISTS (
    SELECT 1 FROM specifications s
    WHERE s.productId = p.productId AND ({predicate})
)
{PRICE_ORDER}"
        ),
    };

    debug!(inverted = invert, required_facets, params = ?params, "Built facet query");
    FacetQuery {
        sql,
        params,
        required_facets,
        inverted: invert,
    }
}

/// OR of groups, each an OR of keys, each matching any of its values.
///
/// Returns `None` for an empty selection.
fn build_predicate(selection: &SelectionState, params: &mut Vec<String>) -> Option<String> {
    let groups: Vec<String> = selection
        .groups()
        .map(|(group, keys)| {
            let keys: Vec<String> = keys
                .iter()
                .map(|(key, values)| {
                    params.push(group.to_string());
                    params.push(key.clone());
                    params.extend(values.iter().cloned());
                    let placeholders = vec!["?"; values.len()].join(", ");
                    format!(
                        "(s.specGroupKeyDisplayName = ? AND s.specKey = ? AND s.specValue IN ({placeholders}))"
                    )
                })
                .collect();
            format!("({})", keys.join(" OR "))
        })
        .collect();

    if groups.is_empty() {
        None
    } else {
        Some(groups.join(" OR "))
    }
}
