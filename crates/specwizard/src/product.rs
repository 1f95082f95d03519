//! Core product types for specwizard.
//!
//! These mirror the two logical tables of the product dataset: products and
//! their specification entries, plus the distinct spec facets derived from
//! them that drive the checkbox tree.

use serde::{Deserialize, Serialize};

/// A product as listed in a result panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Dataset identifier.
    pub product_id: String,
    /// Name shown to the user.
    pub display_name: String,
    /// Canonical product page.
    pub product_url: String,
    /// Price, if the dataset has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl Product {
    /// Create a new product.
    #[must_use]
    pub fn new(
        product_id: impl Into<String>,
        display_name: impl Into<String>,
        product_url: impl Into<String>,
        price: Option<f64>,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            display_name: display_name.into(),
            product_url: product_url.into(),
            price,
        }
    }

    /// Render the price, using `placeholder` when it is missing.
    ///
    /// Whole prices are shown without decimals.
    #[must_use]
    pub fn price_label(&self, placeholder: &str, currency: &str) -> String {
        match self.price {
            Some(price) if price.fract() == 0.0 => format!("{price:.0}{currency}"),
            Some(price) => format!("{price:.2}{currency}"),
            None => placeholder.to_string(),
        }
    }
}

/// One specification row of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecEntry {
    /// Product this entry belongs to.
    pub product_id: String,
    /// Specification group display name (the checkbox section).
    pub group: String,
    /// Specification key.
    pub key: String,
    /// Specification value.
    pub value: String,
    /// Human-readable key.
    pub display_name: String,
    /// Human-readable value.
    pub display_value: String,
}

impl SpecEntry {
    /// Create a spec entry whose display strings equal the raw key and value.
    #[must_use]
    pub fn new(
        product_id: impl Into<String>,
        group: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let key = key.into();
        let value = value.into();
        Self {
            product_id: product_id.into(),
            group: group.into(),
            display_name: key.clone(),
            display_value: value.clone(),
            key,
            value,
        }
    }

    /// Override the display strings.
    #[must_use]
    pub fn with_display(
        mut self,
        display_name: impl Into<String>,
        display_value: impl Into<String>,
    ) -> Self {
        self.display_name = display_name.into();
        self.display_value = display_value.into();
        self
    }
}

/// A distinct (group, key, value) present in the dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecFacet {
    /// Specification group display name.
    pub group: String,
    /// Specification key.
    pub key: String,
    /// Specification value.
    pub value: String,
    /// Human-readable key.
    pub display_name: String,
    /// Human-readable value.
    pub display_value: String,
    /// Number of distinct products carrying this value.
    pub product_count: usize,
}

/// All facets of one specification group, in key then value order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetGroup {
    /// Group display name.
    pub name: String,
    /// Facets in this group.
    pub facets: Vec<SpecFacet>,
}

impl FacetGroup {
    /// Number of distinct keys in the group.
    #[must_use]
    pub fn key_count(&self) -> usize {
        let mut keys: Vec<&str> = self.facets.iter().map(|f| f.key.as_str()).collect();
        keys.dedup();
        keys.len()
    }
}
