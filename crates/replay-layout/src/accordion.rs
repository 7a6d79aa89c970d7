#![forbid(unsafe_code)]

//! Greedy (accordion) solving: expand, collapse, resize, and reflow.
//!
//! Sections are stacked vertically. A collapsed section is exactly
//! `header_height` tall; an expanded section is at least
//! `min_expanded_height` tall (its *floor*).
//!
//! # Invariants
//!
//! 1. Whenever at least one section is expanded and the container can hold
//!    every floor, `Σ displayed_height == container`.
//! 2. No operation shrinks a section below its floor.
//! 3. Expanding a section and collapsing it again, with nothing in between,
//!    restores every other section exactly (loans are repaid).
//!
//! # Donor and receiver order
//!
//! Expanding measures against a baseline where every other section sits at
//! its floor. Without an ideal height the expanding section takes all of it;
//! otherwise it borrows only what it needs, from sections before it (nearest
//! first) and then after it (nearest first). Collapsing repays outstanding
//! loans and hands any remaining space to the last expanded section after the
//! target, or else the nearest expanded section before it.

use serde::{Deserialize, Serialize};

use replay_core::geometry::{Axis, Geometry, Size};
use replay_core::logging::{debug, debug_span, trace, warn};

use crate::region::{LayoutMode, LoanLedger, RegionId, RegionSet, SectionRegion};
use crate::solver::{Layout, RegionSolver};

/// Collapsed section height used when nothing else is configured.
pub const DEFAULT_HEADER_HEIGHT: u32 = 25;

/// Minimum height of an expanded section used when nothing else is configured.
pub const DEFAULT_MIN_EXPANDED_HEIGHT: u32 = 150;

/// Expand/collapse solver for accordion sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccordionSolver {
    header_height: u32,
    min_expanded_height: u32,
}

impl Default for AccordionSolver {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER_HEIGHT, DEFAULT_MIN_EXPANDED_HEIGHT)
    }
}

/// Working copy of section heights for one pass.
struct Pass {
    ids: Vec<RegionId>,
    heights: Vec<u32>,
    floors: Vec<u32>,
}

impl Pass {
    fn others(&self, index: usize) -> u64 {
        self.heights
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, h)| u64::from(*h))
            .sum()
    }

    fn total(&self) -> u64 {
        self.heights.iter().map(|h| u64::from(*h)).sum()
    }

    fn spare(&self, index: usize) -> u32 {
        self.heights[index].saturating_sub(self.floors[index])
    }
}

impl AccordionSolver {
    /// Build a solver. `min_expanded_height` is raised to `header_height`
    /// if it is smaller.
    #[must_use]
    pub fn new(header_height: u32, min_expanded_height: u32) -> Self {
        Self {
            header_height,
            min_expanded_height: min_expanded_height.max(header_height),
        }
    }

    #[must_use]
    pub const fn header_height(&self) -> u32 {
        self.header_height
    }

    #[must_use]
    pub const fn min_expanded_height(&self) -> u32 {
        self.min_expanded_height
    }

    /// Smallest height `section` may be given.
    #[must_use]
    pub const fn floor(&self, section: &SectionRegion) -> u32 {
        if section.expanded {
            self.min_expanded_height
        } else {
            self.header_height
        }
    }

    fn pass(&self, regions: &RegionSet<SectionRegion>) -> Pass {
        Pass {
            ids: regions.ids().cloned().collect(),
            heights: regions.regions().map(|s| s.displayed_height).collect(),
            floors: regions.regions().map(|s| self.floor(s)).collect(),
        }
    }

    fn commit(
        &self,
        regions: &RegionSet<SectionRegion>,
        pass: &Pass,
        edit: impl FnOnce(&mut RegionSet<SectionRegion>),
    ) -> RegionSet<SectionRegion> {
        let mut next = regions.clone();
        for (section, height) in next.regions_mut().zip(&pass.heights) {
            section.displayed_height = *height;
            section.ledger = None;
        }
        edit(&mut next);
        next.touch();
        next
    }

    /// First layout once the container is known: collapsed sections get the
    /// header height, expanded sections first grow toward their ideal height
    /// and then split whatever is left equally (the last one absorbs
    /// rounding).
    #[must_use]
    pub fn initial_layout(
        &self,
        regions: &RegionSet<SectionRegion>,
        container: u32,
    ) -> RegionSet<SectionRegion> {
        let mut pass = self.pass(regions);
        pass.heights.clone_from(&pass.floors);
        let floors: u64 = pass.total();
        if floors > u64::from(container) {
            warn!(floors, container, "accordion floors exceed the container");
        }
        let mut remaining = u32::try_from(u64::from(container).saturating_sub(floors))
            .unwrap_or(u32::MAX);

        let expanded: Vec<usize> = regions
            .regions()
            .enumerate()
            .filter(|(_, s)| s.expanded)
            .map(|(i, _)| i)
            .collect();

        for &i in &expanded {
            let Some((_, section)) = regions.get_index(i) else {
                continue;
            };
            if section.ideal_height > pass.heights[i] {
                let grow = (section.ideal_height - pass.heights[i]).min(remaining);
                pass.heights[i] += grow;
                remaining -= grow;
            }
        }

        let unsized_sections: Vec<usize> = expanded
            .iter()
            .copied()
            .filter(|&i| {
                regions
                    .get_index(i)
                    .is_some_and(|(_, s)| s.ideal_height == 0)
            })
            .collect();
        let receivers = if unsized_sections.is_empty() {
            expanded.last().copied().into_iter().collect()
        } else {
            unsized_sections
        };
        if let Some((&last, rest)) = receivers.split_last() {
            let count = u32::try_from(receivers.len()).unwrap_or(u32::MAX);
            let share = remaining / count;
            for &i in rest {
                pass.heights[i] += share;
            }
            pass.heights[last] += remaining - share * (count - 1);
        }

        debug!(sections = pass.ids.len(), container, "accordion initial layout");
        self.commit(regions, &pass, |_| {})
    }

    /// Grow section `index` to its ideal height, or to everything the other
    /// sections can spare at their floors when no ideal height is set.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn embiggen(
        &self,
        regions: &RegionSet<SectionRegion>,
        index: usize,
        container: u32,
    ) -> RegionSet<SectionRegion> {
        let len = regions.len();
        assert!(index < len, "section index {index} out of range ({len} sections)");
        let _span = debug_span!("accordion.embiggen", index, container).entered();

        let mut pass = self.pass(regions);
        pass.floors[index] = self.min_expanded_height;
        let ideal = regions
            .get_index(index)
            .map_or(0, |(_, section)| section.ideal_height);

        let unoccupied = u32::try_from(u64::from(container).saturating_sub(pass.others(index)))
            .unwrap_or(u32::MAX);
        // Everything left once every other section sits at its floor.
        let baseline: u64 = pass
            .floors
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, f)| u64::from(*f))
            .sum();
        let available = u32::try_from(u64::from(container).saturating_sub(baseline))
            .unwrap_or(u32::MAX);
        let floor = pass.floors[index];
        let target = if ideal > 0 { ideal.max(floor) } else { available.max(floor) };

        let mut current = unoccupied;
        let mut loans = Vec::new();
        let donors = (0..index).rev().chain(index + 1..len);
        for donor in donors {
            if current >= target {
                break;
            }
            let spare = pass.spare(donor);
            if spare == 0 {
                continue;
            }
            let taken = spare.min(target - current);
            pass.heights[donor] -= taken;
            current += taken;
            trace!(donor, taken, "section lends space");
            loans.push((pass.ids[donor].clone(), taken));
        }
        if current < floor {
            warn!(index, current, floor, "not enough space to reach the expanded floor");
        }
        pass.heights[index] = current;

        let generation = regions.generation() + 1;
        self.commit(regions, &pass, |next| {
            if let Some(section) = next.region_mut(index) {
                section.expanded = true;
                section.ledger = Some(LoanLedger { generation, loans });
            }
        })
    }

    /// Collapse section `index` and hand its freed space back.
    ///
    /// `regions` is the state before the collapse; the receiver is chosen
    /// from its expanded flags.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn ensmallen(
        &self,
        regions: &RegionSet<SectionRegion>,
        index: usize,
        container: u32,
    ) -> RegionSet<SectionRegion> {
        let len = regions.len();
        assert!(index < len, "section index {index} out of range ({len} sections)");
        let expanded: Vec<bool> = regions.regions().map(|s| s.expanded).collect();
        let _span = debug_span!("accordion.ensmallen", index, container).entered();

        let mut pass = self.pass(regions);
        let mut freed = pass.heights[index].saturating_sub(self.header_height);
        pass.heights[index] = self.header_height;
        pass.floors[index] = self.header_height;

        let ledger = regions
            .get_index(index)
            .and_then(|(_, section)| section.ledger.as_ref())
            .filter(|ledger| ledger.generation == regions.generation());
        if let Some(ledger) = ledger {
            for (lender, amount) in &ledger.loans {
                let Some(lender_index) = regions.index_of(lender) else {
                    continue;
                };
                let repaid = (*amount).min(freed);
                pass.heights[lender_index] += repaid;
                freed -= repaid;
                trace!(lender = lender_index, repaid, "loan repaid");
            }
        }

        // Space the section occupied beyond what the container holds is not
        // handed on.
        let overflow = u32::try_from(pass.total().saturating_sub(u64::from(container)))
            .unwrap_or(u32::MAX);
        freed = freed.saturating_sub(overflow);

        if freed > 0 {
            match receiver(&expanded, index) {
                Some(r) => {
                    pass.heights[r] += freed;
                    trace!(receiver = r, freed, "freed space received");
                }
                None => debug!(index, freed, "no expanded section to receive freed space"),
            }
        }

        self.commit(regions, &pass, |next| {
            if let Some(section) = next.region_mut(index) {
                section.expanded = false;
            }
        })
    }

    /// Flip section `index` between collapsed and expanded.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn toggle(
        &self,
        regions: &RegionSet<SectionRegion>,
        index: usize,
        container: u32,
    ) -> RegionSet<SectionRegion> {
        let len = regions.len();
        let Some((_, section)) = regions.get_index(index) else {
            panic!("section index {index} out of range ({len} sections)");
        };
        if section.expanded {
            self.ensmallen(regions, index, container)
        } else {
            self.embiggen(regions, index, container)
        }
    }

    /// Resize expanded section `index` to `requested` pixels and remember it
    /// as the section's ideal height.
    ///
    /// Growth comes from unoccupied space, then from sections after it
    /// (nearest first), then before it. Shrinking hands space to the nearest
    /// expanded section after it, else before it; without a receiver the
    /// section keeps its height. Collapsed sections only record the ideal
    /// height for their next expansion.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn resize_section(
        &self,
        regions: &RegionSet<SectionRegion>,
        index: usize,
        requested: u32,
        container: u32,
    ) -> RegionSet<SectionRegion> {
        let len = regions.len();
        assert!(index < len, "section index {index} out of range ({len} sections)");
        let expanded = regions.get_index(index).is_some_and(|(_, s)| s.expanded);
        let mut pass = self.pass(regions);
        let requested = requested.max(self.min_expanded_height);

        if expanded {
            let current = pass.heights[index];
            if requested > current {
                let mut need = requested - current;
                let slack = u32::try_from(u64::from(container).saturating_sub(pass.total()))
                    .unwrap_or(u32::MAX);
                let from_slack = slack.min(need);
                pass.heights[index] += from_slack;
                need -= from_slack;
                for donor in (index + 1..len).chain((0..index).rev()) {
                    if need == 0 {
                        break;
                    }
                    let taken = pass.spare(donor).min(need);
                    pass.heights[donor] -= taken;
                    pass.heights[index] += taken;
                    need -= taken;
                }
            } else if requested < current {
                let expanded_flags: Vec<bool> = regions.regions().map(|s| s.expanded).collect();
                let nearest = (index + 1..len)
                    .find(|&i| expanded_flags[i])
                    .or_else(|| (0..index).rev().find(|&i| expanded_flags[i]));
                match nearest {
                    Some(r) => {
                        pass.heights[r] += current - requested;
                        pass.heights[index] = requested;
                    }
                    None => debug!(index, "no expanded neighbour to absorb the shrink"),
                }
            }
        }

        self.commit(regions, &pass, |next| {
            if let Some(section) = next.region_mut(index) {
                section.ideal_height = requested;
            }
        })
    }

    /// Adapt to a new container height: growth goes to the last expanded
    /// section, shrinking takes from expanded sections last to first down to
    /// their floors.
    #[must_use]
    pub fn reflow(
        &self,
        regions: &RegionSet<SectionRegion>,
        container: u32,
    ) -> RegionSet<SectionRegion> {
        let mut pass = self.pass(regions);
        // Collapsed sections are always exactly one header tall.
        for (height, section) in pass.heights.iter_mut().zip(regions.regions()) {
            if !section.expanded {
                *height = self.header_height;
            }
        }
        let total = pass.total();
        let container_64 = u64::from(container);
        let expanded: Vec<usize> = regions
            .regions()
            .enumerate()
            .filter(|(_, s)| s.expanded)
            .map(|(i, _)| i)
            .collect();

        if total < container_64 {
            let grow = u32::try_from(container_64 - total).unwrap_or(u32::MAX);
            if let Some(&last) = expanded.last() {
                pass.heights[last] += grow;
            }
        } else if total > container_64 {
            let mut excess = u32::try_from(total - container_64).unwrap_or(u32::MAX);
            for &i in expanded.iter().rev() {
                if excess == 0 {
                    break;
                }
                let taken = pass.spare(i).min(excess);
                pass.heights[i] -= taken;
                excess -= taken;
            }
            if excess > 0 {
                warn!(excess, container, "accordion floors exceed the container");
            }
        }
        self.commit(regions, &pass, |_| {})
    }

    /// Remove a section and hand its height to the receiver chosen from the
    /// state before removal.
    #[must_use]
    pub fn remove_section(
        &self,
        regions: &RegionSet<SectionRegion>,
        id: &RegionId,
        container: u32,
    ) -> RegionSet<SectionRegion> {
        let Some(index) = regions.index_of(id) else {
            return regions.clone();
        };
        let flags: Vec<bool> = regions.regions().map(|s| s.expanded).collect();
        let mut pass = self.pass(regions);
        let freed = pass.heights[index];
        if let Some(r) = receiver(&flags, index) {
            pass.heights[r] += freed;
        }
        let mut next = self.commit(regions, &pass, |_| {});
        next.remove(id);
        // The removed section may have been holding up an overfull container.
        self.reflow(&next, container)
    }
}

impl RegionSolver for AccordionSolver {
    type Region = SectionRegion;

    fn mode(&self) -> LayoutMode {
        LayoutMode::Greedy
    }

    fn solve(&self, regions: &RegionSet<SectionRegion>, container: Size) -> Layout {
        let total = container.height;
        let mut offset = 0_u32;
        let mut entries = Vec::with_capacity(regions.len());
        for (id, section) in regions.iter() {
            let size = section.displayed_height;
            entries.push((id.clone(), Geometry::new(offset, size)));
            offset = offset.saturating_add(size);
        }
        let layout = Layout::from_entries(Axis::Vertical, total, entries);
        debug!(
            sections = layout.len(),
            total,
            unoccupied = layout.unoccupied(),
            "accordion solve"
        );
        layout
    }
}

/// Receiver for space freed at `index`: the last expanded section after it,
/// else the nearest expanded section before it.
fn receiver(expanded: &[bool], index: usize) -> Option<usize> {
    (index + 1..expanded.len())
        .rev()
        .find(|&i| expanded[i])
        .or_else(|| (0..index).rev().find(|&i| expanded[i]))
}
