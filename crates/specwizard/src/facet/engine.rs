//! The facet query engine.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::loader::DatasetLoader;
use crate::product::Product;

use super::query::{build_query, FacetQuery};
use super::selection::{FilterCriterion, SelectionState};

/// Lifecycle of the product dataset.
#[derive(Debug, Default)]
pub enum DatasetState {
    /// No load has been attempted.
    #[default]
    Uninitialized,
    /// A load is in progress.
    Loading,
    /// The dataset is queryable.
    Ready(Catalog),
    /// The last load failed; it may be retried.
    Failed(String),
}

impl DatasetState {
    /// Short lowercase name, for logs and JSON output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loading => "loading",
            Self::Ready(_) => "ready",
            Self::Failed(_) => "failed",
        }
    }
}

/// Whether any checkbox is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryState {
    /// Nothing checked: every product is listed.
    NoSelection,
    /// At least one criterion is active.
    Filtered,
}

/// The counter shown next to a group title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    /// Group display name.
    pub group: String,
    /// Checked boxes in the group.
    pub count: usize,
    /// Hidden when nothing in the group is checked.
    pub visible: bool,
}

/// What a result panel should show.
///
/// Loading, failure and an empty result are deliberately separate states.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultPanel {
    /// The dataset is not loaded yet.
    Loading,
    /// The dataset failed to load.
    LoadFailed {
        /// Why the load failed.
        message: String,
    },
    /// The query ran and nothing matched.
    NoMatches,
    /// Matching products, cheapest first.
    Products(Vec<Product>),
}

/// Holds the selection and the results derived from it.
///
/// Every mutation recomputes results synchronously against the loaded
/// catalog. Until the catalog is ready, mutations are ignored.
#[derive(Debug, Default)]
pub struct FacetEngine {
    dataset: DatasetState,
    selection: SelectionState,
    groups: Vec<String>,
    invert: bool,
    results: Vec<Product>,
    inverted_results: Vec<Product>,
    matching_count: usize,
}

impl FacetEngine {
    /// Create an engine with no dataset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine over an already loaded catalog.
    #[must_use]
    pub fn with_catalog(catalog: Catalog) -> Self {
        let mut engine = Self::new();
        engine.finish_loading(Ok(catalog));
        engine
    }

    /// Load the dataset, moving through `Loading` to `Ready` or `Failed`.
    ///
    /// The selection survives a reload.
    ///
    /// # Errors
    ///
    /// Returns the load error after recording it as [`DatasetState::Failed`].
    pub async fn load(&mut self, loader: &DatasetLoader) -> Result<()> {
        self.begin_loading();
        match loader.load().await {
            Ok(catalog) => {
                self.finish_loading(Ok(catalog));
                Ok(())
            }
            Err(e) => {
                self.dataset = DatasetState::Failed(e.to_string());
                warn!(error = %e, "Dataset failed to load");
                Err(e)
            }
        }
    }

    /// Mark the dataset as loading.
    pub fn begin_loading(&mut self) {
        debug!(from = self.dataset.name(), "Dataset loading");
        self.dataset = DatasetState::Loading;
    }

    /// Record the outcome of a load started with [`begin_loading`](Self::begin_loading).
    pub fn finish_loading(&mut self, outcome: Result<Catalog>) {
        match outcome {
            Ok(catalog) => {
                self.groups = catalog.group_names().unwrap_or_else(|e| {
                    warn!(error = %e, "Could not list specification groups");
                    Vec::new()
                });
                info!(groups = self.groups.len(), "Dataset ready");
                self.dataset = DatasetState::Ready(catalog);
                self.refresh();
            }
            Err(e) => {
                warn!(error = %e, "Dataset failed to load");
                self.dataset = DatasetState::Failed(e.to_string());
            }
        }
    }

    /// Current dataset lifecycle state.
    #[must_use]
    pub fn dataset_state(&self) -> &DatasetState {
        &self.dataset
    }

    /// Check whether queries can run.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.dataset, DatasetState::Ready(_))
    }

    /// The loaded catalog, if ready.
    #[must_use]
    pub fn catalog(&self) -> Option<&Catalog> {
        match &self.dataset {
            DatasetState::Ready(catalog) => Some(catalog),
            _ => None,
        }
    }

    /// The catalog, or [`Error::DatasetNotReady`].
    ///
    /// # Errors
    ///
    /// Returns an error while the dataset is not loaded.
    pub fn require_catalog(&self) -> Result<&Catalog> {
        self.catalog().ok_or(Error::DatasetNotReady)
    }

    /// Specification group names known from the dataset.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// The current selection.
    #[must_use]
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// Whether any criterion is active.
    #[must_use]
    pub fn query_state(&self) -> QueryState {
        if self.selection.is_empty() {
            QueryState::NoSelection
        } else {
            QueryState::Filtered
        }
    }

    /// Check or uncheck one box and recompute results.
    ///
    /// Returns `true` if the selection changed. Ignored until the dataset is
    /// ready.
    pub fn toggle_criterion(&mut self, group: &str, key: &str, value: &str, checked: bool) -> bool {
        if !self.is_ready() {
            debug!(group, key, value, checked, "Ignoring toggle before dataset is ready");
            return false;
        }

        let changed = self
            .selection
            .set(FilterCriterion::new(group, key, value), checked);
        debug!(
            group,
            key,
            value,
            checked,
            changed,
            badge = self.selection.checked_in_group(group),
            "Toggled criterion"
        );
        if changed {
            self.refresh();
        }
        changed
    }

    /// Enable or disable the "products without" panel.
    ///
    /// Ignored until the dataset is ready.
    pub fn set_invert(&mut self, invert: bool) {
        if self.is_ready() && self.invert != invert {
            self.invert = invert;
            self.refresh();
        }
    }

    /// Whether the "products without" panel is enabled.
    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.invert
    }

    /// Uncheck everything.
    pub fn clear(&mut self) {
        if !self.is_ready() || self.selection.is_empty() {
            return;
        }
        self.selection.clear();
        self.refresh();
    }

    /// Build the query for the current selection.
    #[must_use]
    pub fn build_query(&self, invert: bool) -> FacetQuery {
        build_query(&self.selection, invert)
    }

    /// Run a query against the dataset.
    ///
    /// Returns an empty list when the dataset is not ready. A failing query is
    /// logged and also yields an empty list.
    #[must_use]
    pub fn execute(&self, query: &FacetQuery) -> Vec<Product> {
        let Some(catalog) = self.catalog() else {
            return Vec::new();
        };
        match query.execute(catalog.connection()) {
            Ok(products) => products,
            Err(e) => {
                warn!(error = %e, sql = query.sql(), "Facet query failed; showing no matches");
                Vec::new()
            }
        }
    }

    /// Badge for `group`: the number of checked boxes, hidden at zero.
    #[must_use]
    pub fn compute_badge_count(&self, group: &str) -> Badge {
        let count = self.selection.checked_in_group(group);
        Badge {
            group: group.to_string(),
            count,
            visible: count > 0,
        }
    }

    /// Badges for every known group, plus any selected group the dataset lacks.
    #[must_use]
    pub fn badges(&self) -> Vec<Badge> {
        let mut names: Vec<&str> = self.groups.iter().map(String::as_str).collect();
        for (group, _) in self.selection.groups() {
            if !names.contains(&group) {
                names.push(group);
            }
        }
        names.sort_unstable();
        names
            .into_iter()
            .map(|group| self.compute_badge_count(group))
            .collect()
    }

    /// Number of products in the last non-inverted result.
    #[must_use]
    pub fn compute_matching_count(&self) -> usize {
        self.matching_count
    }

    /// Last non-inverted result.
    #[must_use]
    pub fn results(&self) -> &[Product] {
        &self.results
    }

    /// Last inverted result, when the inverted panel is enabled.
    #[must_use]
    pub fn inverted_results(&self) -> Option<&[Product]> {
        self.invert.then_some(self.inverted_results.as_slice())
    }

    /// The main result panel.
    #[must_use]
    pub fn result_panel(&self) -> ResultPanel {
        self.panel_for(&self.results)
    }

    /// The "products without" panel, when enabled.
    #[must_use]
    pub fn inverted_panel(&self) -> Option<ResultPanel> {
        self.invert.then(|| self.panel_for(&self.inverted_results))
    }

    fn panel_for(&self, products: &[Product]) -> ResultPanel {
        match &self.dataset {
            DatasetState::Uninitialized | DatasetState::Loading => ResultPanel::Loading,
            DatasetState::Failed(message) => ResultPanel::LoadFailed {
                message: message.clone(),
            },
            DatasetState::Ready(_) if products.is_empty() => ResultPanel::NoMatches,
            DatasetState::Ready(_) => ResultPanel::Products(products.to_vec()),
        }
    }

    /// Recompute every derived result from the selection.
    fn refresh(&mut self) {
        let results = self.execute(&self.build_query(false));
        let inverted = if self.invert {
            self.execute(&self.build_query(true))
        } else {
            Vec::new()
        };

        self.matching_count = results.len();
        self.results = results;
        self.inverted_results = inverted;
        debug!(
            matching = self.matching_count,
            inverted = self.inverted_results.len(),
            "Results recomputed"
        );
    }
}
