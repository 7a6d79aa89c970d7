#![forbid(unsafe_code)]

//! Region identities, constraints, and the ordered region registry.
//!
//! A [`RegionSet`] is an immutable-by-convention snapshot: solver and
//! interaction functions take `&RegionSet` and hand back a fresh set. Order is
//! insertion order and never changes when an existing id is registered again.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Stable region identifier, unique within a registry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    /// Wrap an identifier.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for RegionId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Solving strategy a region (and its registry) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Weight-based split panels.
    Proportional,
    /// Expand/collapse accordion sections.
    Greedy,
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proportional => f.write_str("proportional"),
            Self::Greedy => f.write_str("greedy"),
        }
    }
}

/// Declared bounds of a split panel, as fractions of the container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelConstraints {
    /// Relative share used for the initial layout. Must be positive.
    pub default_weight: f64,
    /// Lower bound of the share, in `[0, 1]`.
    pub min_weight: f64,
    /// Upper bound of the share, in `[0, 1]`.
    pub max_weight: f64,
}

impl PanelConstraints {
    /// Unbounded panel with the given default weight.
    #[must_use]
    pub const fn weighted(default_weight: f64) -> Self {
        Self {
            default_weight,
            min_weight: 0.0,
            max_weight: 1.0,
        }
    }

    /// Builder: set the share bounds.
    #[must_use]
    pub const fn bounded(mut self, min_weight: f64, max_weight: f64) -> Self {
        self.min_weight = min_weight;
        self.max_weight = max_weight;
        self
    }

    /// Validate the constraints for a given region.
    pub fn validate(&self, id: &RegionId) -> Result<(), LayoutError> {
        let in_unit = |w: f64| w.is_finite() && (0.0..=1.0).contains(&w);
        let valid = self.default_weight.is_finite()
            && self.default_weight > 0.0
            && in_unit(self.min_weight)
            && in_unit(self.max_weight)
            && self.min_weight <= self.max_weight;
        if valid {
            Ok(())
        } else {
            Err(LayoutError::InvalidWeights {
                id: id.clone(),
                default_weight: self.default_weight,
                min_weight: self.min_weight,
                max_weight: self.max_weight,
            })
        }
    }
}

impl Default for PanelConstraints {
    fn default() -> Self {
        Self::weighted(1.0)
    }
}

/// Live state of a split panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelRegion {
    pub constraints: PanelConstraints,
    /// Current share of the container; `0` until the initial layout.
    pub(crate) weight: f64,
}

impl PanelRegion {
    /// A panel that has not been sized yet.
    #[must_use]
    pub const fn new(constraints: PanelConstraints) -> Self {
        Self {
            constraints,
            weight: 0.0,
        }
    }

    /// A panel with an explicit share (used when restoring or testing).
    #[must_use]
    pub const fn with_weight(constraints: PanelConstraints, weight: f64) -> Self {
        Self {
            constraints,
            weight,
        }
    }

    /// Current share of the container.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }
}

/// Amounts an expanded section borrowed from its siblings.
///
/// Valid only while the owning set's generation still equals `generation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanLedger {
    pub generation: u64,
    pub loans: Vec<(RegionId, u32)>,
}

/// Live state of an accordion section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRegion {
    pub expanded: bool,
    /// Last explicitly requested height; `0` means unset.
    pub ideal_height: u32,
    /// Currently rendered height.
    pub displayed_height: u32,
    #[serde(default)]
    pub(crate) ledger: Option<LoanLedger>,
}

impl SectionRegion {
    /// A section that has not been sized yet.
    #[must_use]
    pub const fn new(expanded: bool, ideal_height: u32) -> Self {
        Self {
            expanded,
            ideal_height,
            displayed_height: 0,
            ledger: None,
        }
    }

    /// A section with an explicit displayed height.
    #[must_use]
    pub const fn sized(expanded: bool, displayed_height: u32) -> Self {
        Self {
            expanded,
            ideal_height: 0,
            displayed_height,
            ledger: None,
        }
    }

    /// Loans recorded by the most recent expansion, if any.
    #[must_use]
    pub fn ledger(&self) -> Option<&LoanLedger> {
        self.ledger.as_ref()
    }
}

/// Registration payload: what a mounting region declares.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionSpec {
    Panel(PanelConstraints),
    Section { expanded: bool, ideal_height: u32 },
}

impl RegionSpec {
    /// Default-weighted split panel.
    #[must_use]
    pub const fn panel(default_weight: f64) -> Self {
        Self::Panel(PanelConstraints::weighted(default_weight))
    }

    /// Accordion section without an ideal height.
    #[must_use]
    pub const fn section(expanded: bool) -> Self {
        Self::Section {
            expanded,
            ideal_height: 0,
        }
    }

    /// Strategy this region belongs to.
    #[must_use]
    pub const fn mode(&self) -> LayoutMode {
        match self {
            Self::Panel(_) => LayoutMode::Proportional,
            Self::Section { .. } => LayoutMode::Greedy,
        }
    }
}

/// Ordered registry snapshot.
///
/// `generation` increases by one on every mutation and is used to detect
/// whether anything happened between two operations.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSet<R> {
    entries: IndexMap<RegionId, R>,
    generation: u64,
}

impl<R> Default for RegionSet<R> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            generation: 0,
        }
    }
}

impl<R> RegionSet<R> {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn contains(&self, id: &RegionId) -> bool {
        self.entries.contains_key(id)
    }

    #[must_use]
    pub fn get(&self, id: &RegionId) -> Option<&R> {
        self.entries.get(id)
    }

    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&RegionId, &R)> {
        self.entries.get_index(index)
    }

    /// Solve-order position of `id`.
    #[must_use]
    pub fn index_of(&self, id: &RegionId) -> Option<usize> {
        self.entries.get_index_of(id)
    }

    /// Iterate in solve order.
    pub fn iter(&self) -> impl Iterator<Item = (&RegionId, &R)> {
        self.entries.iter()
    }

    /// Ids in solve order.
    pub fn ids(&self) -> impl Iterator<Item = &RegionId> {
        self.entries.keys()
    }

    /// Region states in solve order.
    pub fn regions(&self) -> impl Iterator<Item = &R> {
        self.entries.values()
    }

    /// Insert a region, or replace it in place if the id already exists.
    ///
    /// Returns the previous state when replacing.
    pub fn upsert(&mut self, id: RegionId, region: R) -> Option<R> {
        self.generation += 1;
        self.entries.insert(id, region)
    }

    /// Remove a region, keeping the order of the others.
    pub fn remove(&mut self, id: &RegionId) -> Option<R> {
        let removed = self.entries.shift_remove(id);
        if removed.is_some() {
            self.generation += 1;
        }
        removed
    }

    /// Mutable access by position. Does not bump the generation.
    pub(crate) fn region_mut(&mut self, index: usize) -> Option<&mut R> {
        self.entries.get_index_mut(index).map(|(_, region)| region)
    }

    /// Mutable iteration in solve order. Does not bump the generation.
    pub(crate) fn regions_mut(&mut self) -> impl Iterator<Item = &mut R> {
        self.entries.values_mut()
    }

    /// Record that a mutation happened.
    pub(crate) fn touch(&mut self) {
        self.generation += 1;
    }
}
