//! Read-only projection of engine state for display.
//!
//! A [`WizardView`] is everything a front end needs to draw the wizard:
//! group badges, the matching-count indicator and the result panels. Building
//! one never touches the selection.

use std::fmt::Write as _;

use serde::Serialize;

use crate::config::DisplayConfig;
use crate::facet::{Badge, FacetEngine, ResultPanel};
use crate::product::Product;

/// One rendered row of a result panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductLine {
    /// Product name, the link text.
    pub name: String,
    /// Link target.
    pub url: String,
    /// Formatted price or the placeholder.
    pub price: String,
}

impl ProductLine {
    fn from_product(product: &Product, display: &DisplayConfig) -> Self {
        Self {
            name: product.display_name.clone(),
            url: product.product_url.clone(),
            price: product.price_label(&display.price_placeholder, &display.currency),
        }
    }
}

/// A result panel ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PanelView {
    /// The dataset is still loading.
    Loading,
    /// The dataset could not be loaded.
    LoadFailed {
        /// Why loading failed.
        message: String,
    },
    /// No product matches the selection.
    NoMatches,
    /// Matching products in display order.
    Products {
        /// Rendered rows.
        lines: Vec<ProductLine>,
    },
}

impl PanelView {
    fn from_panel(panel: ResultPanel, display: &DisplayConfig) -> Self {
        match panel {
            ResultPanel::Loading => Self::Loading,
            ResultPanel::LoadFailed { message } => Self::LoadFailed { message },
            ResultPanel::NoMatches => Self::NoMatches,
            ResultPanel::Products(products) => Self::Products {
                lines: products
                    .iter()
                    .map(|p| ProductLine::from_product(p, display))
                    .collect(),
            },
        }
    }
}

/// Snapshot of what the wizard shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardView {
    /// One badge per group, hidden ones included.
    pub badges: Vec<Badge>,
    /// Number of products in the main panel.
    pub matching_count: usize,
    /// Products with the selected specs.
    pub panel: PanelView,
    /// Products without the selected specs, when that panel is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inverted: Option<PanelView>,
}

impl WizardView {
    /// Project the engine's current state.
    #[must_use]
    pub fn project(engine: &FacetEngine, display: &DisplayConfig) -> Self {
        Self {
            badges: engine.badges(),
            matching_count: engine.compute_matching_count(),
            panel: PanelView::from_panel(engine.result_panel(), display),
            inverted: engine
                .inverted_panel()
                .map(|panel| PanelView::from_panel(panel, display)),
        }
    }
}

/// Render a view as plain text for the terminal.
#[must_use]
pub fn render_text(view: &WizardView) -> String {
    let mut out = String::new();

    let visible: Vec<String> = view
        .badges
        .iter()
        .filter(|b| b.visible)
        .map(|b| format!("{} ({})", b.group, b.count))
        .collect();
    if !visible.is_empty() {
        let _ = writeln!(out, "Selected: {}", visible.join(", "));
    }

    let _ = writeln!(out, "Matching products: {}", view.matching_count);
    out.push('\n');
    render_panel(&mut out, &view.panel);

    if let Some(inverted) = &view.inverted {
        out.push('\n');
        out.push_str("Products without the selected specifications\n");
        render_panel(&mut out, inverted);
    }
    out
}

fn render_panel(out: &mut String, panel: &PanelView) {
    match panel {
        PanelView::Loading => out.push_str("Loading products...\n"),
        PanelView::LoadFailed { message } => {
            let _ = writeln!(out, "Could not load products: {message}");
        }
        PanelView::NoMatches => out.push_str("No matching products.\n"),
        PanelView::Products { lines } => {
            let width = lines.iter().map(|l| l.price.len()).max().unwrap_or(0);
            for line in lines {
                let _ = writeln!(out, "{:>width$}  {}  <{}>", line.price, line.name, line.url);
            }
        }
    }
}
