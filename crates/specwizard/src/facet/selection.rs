//! Checked-checkbox state.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One checked checkbox: a value of a key inside a specification group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FilterCriterion {
    /// Specification group display name.
    pub group: String,
    /// Specification key.
    pub key: String,
    /// Specification value.
    pub value: String,
}

impl FilterCriterion {
    /// Create a new criterion.
    #[must_use]
    pub fn new(
        group: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for FilterCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}={}", self.group, self.key, self.value)
    }
}

/// Parses `GROUP/KEY=VALUE`.
///
/// The value is everything after the first `=`; the group is everything before
/// the last `/` preceding it, so group names may contain slashes.
impl FromStr for FilterCriterion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, value) = s.split_once('=').ok_or_else(|| Error::invalid_criterion(s))?;
        let (group, key) = path
            .rsplit_once('/')
            .ok_or_else(|| Error::invalid_criterion(s))?;
        if group.is_empty() || key.is_empty() {
            return Err(Error::invalid_criterion(s));
        }
        Ok(Self::new(group, key, value))
    }
}

/// Selected values of one group, keyed by spec key.
pub type GroupSelection = BTreeMap<String, BTreeSet<String>>;

/// The set of all currently checked criteria.
///
/// Stored group → key → values in ordered collections, so iteration order
/// (and therefore generated SQL) depends only on the set's contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    groups: BTreeMap<String, GroupSelection>,
}

impl SelectionState {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check or uncheck a criterion. Returns `true` if the state changed.
    pub fn set(&mut self, criterion: FilterCriterion, checked: bool) -> bool {
        if checked {
            self.insert(criterion)
        } else {
            self.remove(&criterion)
        }
    }

    /// Add a criterion. Returns `true` if it was not already present.
    pub fn insert(&mut self, criterion: FilterCriterion) -> bool {
        self.groups
            .entry(criterion.group)
            .or_default()
            .entry(criterion.key)
            .or_default()
            .insert(criterion.value)
    }

    /// Remove a criterion. Returns `true` if it was present.
    ///
    /// Empty keys and groups are pruned so an unchecked group leaves no trace.
    pub fn remove(&mut self, criterion: &FilterCriterion) -> bool {
        let Some(keys) = self.groups.get_mut(&criterion.group) else {
            return false;
        };
        let Some(values) = keys.get_mut(&criterion.key) else {
            return false;
        };
        let removed = values.remove(&criterion.value);
        if values.is_empty() {
            keys.remove(&criterion.key);
        }
        if keys.is_empty() {
            self.groups.remove(&criterion.group);
        }
        removed
    }

    /// Check whether a criterion is selected.
    #[must_use]
    pub fn contains(&self, criterion: &FilterCriterion) -> bool {
        self.groups
            .get(&criterion.group)
            .and_then(|keys| keys.get(&criterion.key))
            .is_some_and(|values| values.contains(&criterion.value))
    }

    /// Uncheck everything.
    pub fn clear(&mut self) {
        self.groups.clear();
    }

    /// Check whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of checked criteria.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups
            .values()
            .flat_map(BTreeMap::values)
            .map(BTreeSet::len)
            .sum()
    }

    /// Number of checked criteria in `group`.
    #[must_use]
    pub fn checked_in_group(&self, group: &str) -> usize {
        self.groups
            .get(group)
            .map_or(0, |keys| keys.values().map(BTreeSet::len).sum())
    }

    /// Number of distinct (group, key) pairs with at least one checked value.
    ///
    /// A product must satisfy this many facets to match.
    #[must_use]
    pub fn facet_count(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    /// Iterate groups in name order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &GroupSelection)> {
        self.groups.iter().map(|(name, keys)| (name.as_str(), keys))
    }

    /// Iterate all criteria in group, key, value order.
    pub fn criteria(&self) -> impl Iterator<Item = FilterCriterion> + '_ {
        self.groups.iter().flat_map(|(group, keys)| {
            keys.iter().flat_map(move |(key, values)| {
                values
                    .iter()
                    .map(move |value| FilterCriterion::new(group, key, value))
            })
        })
    }
}

impl FromIterator<FilterCriterion> for SelectionState {
    fn from_iter<I: IntoIterator<Item = FilterCriterion>>(iter: I) -> Self {
        let mut state = Self::new();
        for criterion in iter {
            state.insert(criterion);
        }
        state
    }
}
