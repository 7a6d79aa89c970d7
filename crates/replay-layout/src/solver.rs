#![forbid(unsafe_code)]

//! Solved layouts and the strategy contract shared by both solvers.

use indexmap::IndexMap;
use serde::Serialize;

use replay_core::geometry::{Axis, Geometry, RegionStyle, Size};

use crate::accordion::AccordionSolver;
use crate::proportional::ProportionalSolver;
use crate::region::{LayoutMode, PanelRegion, RegionId, RegionSet, SectionRegion};

/// Per-region geometry produced by one solve pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Layout {
    axis: Axis,
    total: u32,
    entries: IndexMap<RegionId, Geometry>,
}

impl Layout {
    /// Layout with no regions.
    #[must_use]
    pub fn empty(axis: Axis, total: u32) -> Self {
        Self {
            axis,
            total,
            entries: IndexMap::new(),
        }
    }

    /// Build from geometries in solve order.
    #[must_use]
    pub fn from_entries(
        axis: Axis,
        total: u32,
        entries: impl IntoIterator<Item = (RegionId, Geometry)>,
    ) -> Self {
        Self {
            axis,
            total,
            entries: entries.into_iter().collect(),
        }
    }

    #[must_use]
    pub const fn axis(&self) -> Axis {
        self.axis
    }

    /// Container length along the primary axis.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Geometry of `id`; zero for unknown regions.
    #[must_use]
    pub fn geometry(&self, id: &RegionId) -> Geometry {
        self.entries.get(id).copied().unwrap_or_default()
    }

    /// Absolute-position style of `id`.
    #[must_use]
    pub fn style_for_region(&self, id: &RegionId) -> RegionStyle {
        RegionStyle::from_geometry(self.axis, self.geometry(id))
    }

    /// Iterate in solve order.
    pub fn iter(&self) -> impl Iterator<Item = (&RegionId, Geometry)> {
        self.entries.iter().map(|(id, geometry)| (id, *geometry))
    }

    /// Sizes in solve order.
    #[must_use]
    pub fn sizes(&self) -> Vec<u32> {
        self.entries.values().map(|g| g.size).collect()
    }

    /// Offsets in solve order.
    #[must_use]
    pub fn offsets(&self) -> Vec<u32> {
        self.entries.values().map(|g| g.offset).collect()
    }

    /// Sum of all region sizes.
    #[must_use]
    pub fn occupied(&self) -> u64 {
        self.entries.values().map(|g| u64::from(g.size)).sum()
    }

    /// Trailing space no region occupies.
    #[must_use]
    pub fn unoccupied(&self) -> u32 {
        u64::from(self.total)
            .saturating_sub(self.occupied())
            .try_into()
            .unwrap_or(u32::MAX)
    }

    /// Space requested beyond the container.
    #[must_use]
    pub fn overflow(&self) -> u32 {
        self.occupied()
            .saturating_sub(u64::from(self.total))
            .try_into()
            .unwrap_or(u32::MAX)
    }
}

/// Shared contract of the two solving strategies.
pub trait RegionSolver {
    /// Region state this strategy works with.
    type Region;

    /// Strategy tag.
    fn mode(&self) -> LayoutMode;

    /// Compute offsets and sizes for every region in `regions`.
    fn solve(&self, regions: &RegionSet<Self::Region>, container: Size) -> Layout;
}

/// The strategy an engine was created with, together with its registry.
///
/// Chosen once per engine; every solve dispatches through here.
#[derive(Debug, Clone)]
pub enum Strategy {
    Proportional {
        solver: ProportionalSolver,
        regions: RegionSet<PanelRegion>,
    },
    Greedy {
        solver: AccordionSolver,
        regions: RegionSet<SectionRegion>,
    },
}

impl Strategy {
    #[must_use]
    pub fn mode(&self) -> LayoutMode {
        match self {
            Self::Proportional { solver, .. } => solver.mode(),
            Self::Greedy { solver, .. } => solver.mode(),
        }
    }

    /// Solve the current registry against `container`.
    #[must_use]
    pub fn solve(&self, container: Size) -> Layout {
        match self {
            Self::Proportional { solver, regions } => solver.solve(regions, container),
            Self::Greedy { solver, regions } => solver.solve(regions, container),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Proportional { regions, .. } => regions.len(),
            Self::Greedy { regions, .. } => regions.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn contains(&self, id: &RegionId) -> bool {
        match self {
            Self::Proportional { regions, .. } => regions.contains(id),
            Self::Greedy { regions, .. } => regions.contains(id),
        }
    }

    /// Registry generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        match self {
            Self::Proportional { regions, .. } => regions.generation(),
            Self::Greedy { regions, .. } => regions.generation(),
        }
    }

    /// Solve-order position of `id`.
    #[must_use]
    pub fn index_of(&self, id: &RegionId) -> Option<usize> {
        match self {
            Self::Proportional { regions, .. } => regions.index_of(id),
            Self::Greedy { regions, .. } => regions.index_of(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> RegionId {
        RegionId::new(raw)
    }

    #[test]
    fn unknown_region_has_zero_geometry() {
        let layout = Layout::from_entries(
            Axis::Horizontal,
            100,
            [(id("a"), Geometry::new(0, 100))],
        );
        assert_eq!(layout.geometry(&id("missing")), Geometry::default());
        assert_eq!(layout.geometry(&id("a")), Geometry::new(0, 100));
    }

    #[test]
    fn occupancy_accounting() {
        let layout = Layout::from_entries(
            Axis::Vertical,
            600,
            [
                (id("a"), Geometry::new(0, 25)),
                (id("b"), Geometry::new(25, 25)),
            ],
        );
        assert_eq!(layout.occupied(), 50);
        assert_eq!(layout.unoccupied(), 550);
        assert_eq!(layout.overflow(), 0);

        let tight = Layout::from_entries(Axis::Vertical, 10, [(id("a"), Geometry::new(0, 25))]);
        assert_eq!(tight.unoccupied(), 0);
        assert_eq!(tight.overflow(), 15);
    }

    #[test]
    fn style_follows_axis() {
        let layout = Layout::from_entries(Axis::Vertical, 600, [(id("a"), Geometry::new(25, 550))]);
        let style = layout.style_for_region(&id("a"));
        assert_eq!(style.top, replay_core::Dimension::Px(25));
        assert_eq!(style.width, replay_core::Dimension::Full);
    }
}
