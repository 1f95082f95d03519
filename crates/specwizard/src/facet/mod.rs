//! Faceted product search.
//!
//! The [`FacetEngine`] owns the [`SelectionState`] (the checked boxes), turns
//! it into a [`FacetQuery`] on every change, and keeps the resulting product
//! lists, badge counts and matching count up to date. Semantics are the usual
//! faceted-search ones: OR within a facet's selected values, AND across
//! facets.
//!
//! ```
//! use specwizard::catalog::CatalogBuilder;
//! use specwizard::facet::FacetEngine;
//! use specwizard::product::{Product, SpecEntry};
//!
//! let builder = CatalogBuilder::in_memory()?;
//! builder.insert_product(&Product::new("p1", "Fenix 8", "https://example.com/fenix8", Some(9999.0)))?;
//! builder.insert_spec(&SpecEntry::new("p1", "Display", "displayType", "amoled"))?;
//!
//! let mut engine = FacetEngine::with_catalog(builder.finish()?);
//! engine.toggle_criterion("Display", "displayType", "amoled", true);
//! assert_eq!(engine.compute_matching_count(), 1);
//! assert_eq!(engine.compute_badge_count("Display").count, 1);
//! # Ok::<(), specwizard::Error>(())
//! ```

mod engine;
mod query;
mod selection;

pub use engine::{Badge, DatasetState, FacetEngine, QueryState, ResultPanel};
pub use query::{build_query, FacetQuery};
pub use selection::{FilterCriterion, GroupSelection, SelectionState};
