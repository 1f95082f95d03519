//! `specwizard` - Faceted product search over a specification dataset
//!
//! This library provides the engine behind a "product wizard": the user checks
//! specification values grouped by category and sees the products that have
//! all of them, cheapest first. It also carries the QR-code treasure hunt that
//! ships alongside the wizard.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod facet;
pub mod hunt;
pub mod loader;
pub mod logging;
pub mod migrations;
pub mod product;
pub mod view;

pub use catalog::{Catalog, CatalogStats};
pub use config::Config;
pub use error::{Error, Result};
pub use facet::{FacetEngine, FilterCriterion, SelectionState};
pub use loader::DatasetLoader;
pub use logging::init_logging;
pub use product::{Product, SpecEntry};
