#![forbid(unsafe_code)]

//! Proportional (split panel) solving and drag redistribution.
//!
//! Every panel owns a fractional `weight` of the container. Weights always sum
//! to one once the initial layout has run.
//!
//! # Rounding
//!
//! `size_i = round(weight_i * total)` clamped to what is left, and
//! `offset_i` is the sum of the sizes before it. The last panel is always
//! sized `total - offset_last`, so rounding error never produces a gap or an
//! overlap. With weights `[1, 1, 1]` and `total = 100` this yields sizes
//! `[33, 33, 34]` at offsets `[0, 33, 66]`.
//!
//! # Drag transfer
//!
//! Dragging the divider between `before` and `after` moves weight between the
//! two sides. The shrinking side gives up weight nearest the divider first and,
//! when cascading is enabled, keeps taking from panels further away once the
//! neighbour reaches its `min_weight`. The growing panel never exceeds its
//! `max_weight`. The transfer is zero-sum.

use serde::{Deserialize, Serialize};

use replay_core::geometry::{Axis, Geometry, Size};
use replay_core::logging::{debug, debug_span, trace, warn};

use crate::error::LayoutError;
use crate::region::{LayoutMode, PanelRegion, RegionId, RegionSet};
use crate::solver::{Layout, RegionSolver};

/// Tolerance for weight comparisons.
pub const WEIGHT_EPSILON: f64 = 1e-9;

/// Weight-based solver for split panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProportionalSolver {
    axis: Axis,
    cascade_contraction: bool,
}

/// Result of a drag transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    /// Registry after the transfer.
    pub regions: RegionSet<PanelRegion>,
    /// Signed weight actually moved from the before side to the after side
    /// (negative when the after side shrank).
    pub applied: f64,
    /// Weight requested but blocked by bounds.
    pub clamped: f64,
}

impl ProportionalSolver {
    #[must_use]
    pub const fn new(axis: Axis, cascade_contraction: bool) -> Self {
        Self {
            axis,
            cascade_contraction,
        }
    }

    #[must_use]
    pub const fn axis(&self) -> Axis {
        self.axis
    }

    #[must_use]
    pub const fn cascades(&self) -> bool {
        self.cascade_contraction
    }

    /// Initial layout: `weight_i = default_i / Σ default`, then clamped into
    /// each panel's bounds.
    #[must_use]
    pub fn normalize(&self, regions: &RegionSet<PanelRegion>) -> RegionSet<PanelRegion> {
        let total_default: f64 = regions.regions().map(|r| r.constraints.default_weight).sum();
        let raw: Vec<f64> = regions
            .regions()
            .map(|r| {
                if total_default > 0.0 {
                    r.constraints.default_weight / total_default
                } else {
                    0.0
                }
            })
            .collect();
        self.write_weights(regions, &raw)
    }

    /// Size a panel that registered after the initial layout.
    ///
    /// The newcomer receives `default / Σ default` over all panels; the
    /// existing panels shrink proportionally to make room.
    #[must_use]
    pub fn admit(&self, regions: &RegionSet<PanelRegion>, id: &RegionId) -> RegionSet<PanelRegion> {
        let Some(newcomer) = regions.get(id) else {
            return regions.clone();
        };
        let total_default: f64 = regions.regions().map(|r| r.constraints.default_weight).sum();
        if total_default <= 0.0 {
            return self.normalize(regions);
        }
        let share = newcomer.constraints.default_weight / total_default;
        let existing: f64 = regions
            .iter()
            .filter(|(other, _)| *other != id)
            .map(|(_, r)| r.weight)
            .sum();
        let raw: Vec<f64> = regions
            .iter()
            .map(|(other, r)| {
                if other == id {
                    share
                } else if existing > WEIGHT_EPSILON {
                    r.weight / existing * (1.0 - share)
                } else {
                    (1.0 - share) / (regions.len().saturating_sub(1).max(1) as f64)
                }
            })
            .collect();
        debug!(region = %id, share, "admitting panel after initial layout");
        self.write_weights(regions, &raw)
    }

    /// Re-spread weights after a panel was removed so they sum to one again.
    #[must_use]
    pub fn rebalance(&self, regions: &RegionSet<PanelRegion>) -> RegionSet<PanelRegion> {
        let total: f64 = regions.regions().map(|r| r.weight).sum();
        if total <= WEIGHT_EPSILON {
            return self.normalize(regions);
        }
        let raw: Vec<f64> = regions.regions().map(|r| r.weight / total).collect();
        self.write_weights(regions, &raw)
    }

    fn write_weights(&self, regions: &RegionSet<PanelRegion>, raw: &[f64]) -> RegionSet<PanelRegion> {
        let bounds: Vec<(f64, f64)> = regions
            .regions()
            .map(|r| (r.constraints.min_weight, r.constraints.max_weight))
            .collect();
        let clamped = clamp_weights(raw, &bounds);
        let mut next = regions.clone();
        for (region, weight) in next.regions_mut().zip(clamped) {
            region.weight = weight;
        }
        next.touch();
        next
    }

    /// Move `delta` of the container from the `before` side to the `after`
    /// side of a divider (negative `delta` moves it the other way).
    ///
    /// `before` must sit immediately before `after` in solve order.
    pub fn transfer(
        &self,
        regions: &RegionSet<PanelRegion>,
        before: &RegionId,
        after: &RegionId,
        delta: f64,
    ) -> Result<Transfer, LayoutError> {
        let (before_index, after_index) = adjacent_pair(regions, before, after)?;
        let _span = debug_span!("panel.transfer", %before, %after, delta).entered();

        let mut weights: Vec<f64> = regions.regions().map(|r| r.weight).collect();
        let bounds: Vec<(f64, f64)> = regions
            .regions()
            .map(|r| (r.constraints.min_weight, r.constraints.max_weight))
            .collect();

        if !delta.is_finite() || delta.abs() <= WEIGHT_EPSILON {
            return Ok(Transfer {
                regions: regions.clone(),
                applied: 0.0,
                clamped: 0.0,
            });
        }

        // Positive delta: the divider moved toward the start, the before side
        // contracts and `after` grows.
        let (chain, grower): (Vec<usize>, usize) = if delta > 0.0 {
            let chain = if self.cascade_contraction {
                (0..=before_index).rev().collect()
            } else {
                vec![before_index]
            };
            (chain, after_index)
        } else {
            let chain = if self.cascade_contraction {
                (after_index..weights.len()).collect()
            } else {
                vec![after_index]
            };
            (chain, before_index)
        };

        let requested = delta.abs();
        let grow_room = (bounds[grower].1 - weights[grower]).max(0.0);
        let available: f64 = chain
            .iter()
            .map(|&i| (weights[i] - bounds[i].0).max(0.0))
            .sum();
        let amount = requested.min(grow_room).min(available);

        let mut remaining = amount;
        for &i in &chain {
            if remaining <= WEIGHT_EPSILON {
                break;
            }
            let give = (weights[i] - bounds[i].0).max(0.0).min(remaining);
            if give > 0.0 {
                trace!(donor = i, give, "panel contracts");
                weights[i] -= give;
                remaining -= give;
            }
        }
        weights[grower] += amount - remaining;
        let moved = amount - remaining;
        let clamped = requested - moved;
        if clamped > WEIGHT_EPSILON {
            debug!(requested, moved, "drag transfer clamped by panel bounds");
        }

        let mut next = regions.clone();
        for (region, weight) in next.regions_mut().zip(weights) {
            region.weight = weight;
        }
        next.touch();

        Ok(Transfer {
            regions: next,
            applied: moved.copysign(delta),
            clamped,
        })
    }

    /// Apply a pointer position on the primary axis to the divider between
    /// `before` and `after`.
    ///
    /// The delta is `offset(after) / total - position / total` with the
    /// position snapped to whole pixels.
    pub fn drag_to(
        &self,
        regions: &RegionSet<PanelRegion>,
        container: Size,
        before: &RegionId,
        after: &RegionId,
        client_position: f64,
    ) -> Result<Transfer, LayoutError> {
        adjacent_pair(regions, before, after)?;
        let total = container.along(self.axis);
        if total == 0 || !client_position.is_finite() {
            return self.transfer(regions, before, after, 0.0);
        }
        let layout = self.solve(regions, container);
        let total = f64::from(total);
        let prev_offset = f64::from(layout.geometry(after).offset) / total;
        let next_offset = client_position.round().clamp(0.0, total) / total;
        self.transfer(regions, before, after, prev_offset - next_offset)
    }

    /// Shift the divider by a whole number of pixels (positive moves it
    /// toward the end of the container).
    pub fn nudge(
        &self,
        regions: &RegionSet<PanelRegion>,
        container: Size,
        before: &RegionId,
        after: &RegionId,
        pixels: i32,
    ) -> Result<Transfer, LayoutError> {
        let total = container.along(self.axis);
        if total == 0 {
            return self.transfer(regions, before, after, 0.0);
        }
        self.transfer(regions, before, after, -f64::from(pixels) / f64::from(total))
    }
}

impl RegionSolver for ProportionalSolver {
    type Region = PanelRegion;

    fn mode(&self) -> LayoutMode {
        LayoutMode::Proportional
    }

    fn solve(&self, regions: &RegionSet<PanelRegion>, container: Size) -> Layout {
        let total = container.along(self.axis);
        let count = regions.len();
        if count == 0 {
            return Layout::empty(self.axis, total);
        }
        if count == 1 {
            let entries = regions.ids().cloned().map(|id| (id, Geometry::new(0, total)));
            return Layout::from_entries(self.axis, total, entries);
        }

        let mut offset = 0_u32;
        let mut entries = Vec::with_capacity(count);
        for (index, (id, region)) in regions.iter().enumerate() {
            let remaining = total - offset;
            let size = if index + 1 == count {
                remaining
            } else {
                scaled_size(region.weight, total).min(remaining)
            };
            entries.push((id.clone(), Geometry::new(offset, size)));
            offset += size;
        }
        debug!(regions = count, total, "proportional solve");
        Layout::from_entries(self.axis, total, entries)
    }
}

fn scaled_size(weight: f64, total: u32) -> u32 {
    let value = (weight * f64::from(total)).round();
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    if value >= f64::from(total) {
        return total;
    }
    value as u32
}

fn adjacent_pair(
    regions: &RegionSet<PanelRegion>,
    before: &RegionId,
    after: &RegionId,
) -> Result<(usize, usize), LayoutError> {
    let before_index = regions
        .index_of(before)
        .ok_or_else(|| LayoutError::UnknownRegion { id: before.clone() })?;
    let after_index = regions
        .index_of(after)
        .ok_or_else(|| LayoutError::UnknownRegion { id: after.clone() })?;
    if before_index + 1 != after_index {
        return Err(LayoutError::HandleNotAdjacent {
            before: before.clone(),
            after: after.clone(),
        });
    }
    Ok((before_index, after_index))
}

/// Check that `before` immediately precedes `after`.
pub fn validate_adjacent(
    regions: &RegionSet<PanelRegion>,
    before: &RegionId,
    after: &RegionId,
) -> Result<(), LayoutError> {
    adjacent_pair(regions, before, after).map(|_| ())
}

/// Clamp raw shares into `(min, max)` bounds while keeping their sum at one.
///
/// Excess or deficit created by clamping is spread over the panels that
/// still have room, in proportion to their share. Infeasible bound sets
/// (`Σ min > 1` or `Σ max < 1`) are resolved by scaling the binding bounds
/// so they sum to one.
#[must_use]
pub fn clamp_weights(raw: &[f64], bounds: &[(f64, f64)]) -> Vec<f64> {
    debug_assert_eq!(raw.len(), bounds.len());
    if raw.is_empty() {
        return Vec::new();
    }
    let min_sum: f64 = bounds.iter().map(|b| b.0).sum();
    let max_sum: f64 = bounds.iter().map(|b| b.1).sum();
    if min_sum > 1.0 + WEIGHT_EPSILON {
        warn!(min_sum, "panel minimum weights exceed the container, scaling down");
        return bounds.iter().map(|b| b.0 / min_sum).collect();
    }
    if max_sum < 1.0 - WEIGHT_EPSILON {
        warn!(max_sum, "panel maximum weights cannot fill the container, scaling up");
        return bounds.iter().map(|b| b.1 / max_sum).collect();
    }

    let mut weights: Vec<f64> = raw
        .iter()
        .zip(bounds)
        .map(|(&w, &(min, max))| {
            let w = if w.is_finite() { w } else { 0.0 };
            w.clamp(min, max)
        })
        .collect();

    for _ in 0..=weights.len() {
        let residual = 1.0 - weights.iter().sum::<f64>();
        if residual.abs() <= WEIGHT_EPSILON {
            break;
        }
        let room: Vec<f64> = weights
            .iter()
            .zip(bounds)
            .map(|(&w, &(min, max))| if residual > 0.0 { max - w } else { w - min }.max(0.0))
            .collect();
        let basis: f64 = weights
            .iter()
            .zip(&room)
            .filter(|(_, r)| **r > WEIGHT_EPSILON)
            .map(|(w, _)| *w)
            .sum();
        let room_total: f64 = room.iter().sum();
        if room_total <= WEIGHT_EPSILON {
            break;
        }
        for (w, r) in weights.iter_mut().zip(&room) {
            if *r <= WEIGHT_EPSILON {
                continue;
            }
            let portion = if basis > WEIGHT_EPSILON {
                residual.abs() * *w / basis
            } else {
                residual.abs() * *r / room_total
            };
            let step = portion.min(*r);
            if residual > 0.0 {
                *w += step;
            } else {
                *w -= step;
            }
        }
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::PanelConstraints;

    fn id(raw: &str) -> RegionId {
        RegionId::new(raw)
    }

    fn panels(defaults: &[(&str, PanelConstraints)]) -> RegionSet<PanelRegion> {
        let mut set = RegionSet::new();
        for (name, constraints) in defaults {
            set.upsert(id(name), PanelRegion::new(*constraints));
        }
        set
    }

    fn equal_panels(names: &[&str]) -> RegionSet<PanelRegion> {
        let entries: Vec<(&str, PanelConstraints)> = names
            .iter()
            .map(|name| (*name, PanelConstraints::default()))
            .collect();
        panels(&entries)
    }

    fn solver() -> ProportionalSolver {
        ProportionalSolver::new(Axis::Horizontal, true)
    }

    fn weight_sum(set: &RegionSet<PanelRegion>) -> f64 {
        set.regions().map(PanelRegion::weight).sum()
    }

    #[test]
    fn three_equal_panels_absorb_rounding_in_last() {
        let solver = solver();
        let set = solver.normalize(&equal_panels(&["a", "b", "c"]));
        let layout = solver.solve(&set, Size::new(100, 40));
        assert_eq!(layout.sizes(), vec![33, 33, 34]);
        assert_eq!(layout.offsets(), vec![0, 33, 66]);
        assert_eq!(layout.occupied(), 100);
    }

    #[test]
    fn single_panel_fills_container_regardless_of_weight() {
        let solver = solver();
        let mut set = RegionSet::new();
        set.upsert(
            id("only"),
            PanelRegion::with_weight(PanelConstraints::weighted(0.1), 0.1),
        );
        let layout = solver.solve(&set, Size::new(321, 10));
        assert_eq!(layout.geometry(&id("only")), Geometry::new(0, 321));
    }

    #[test]
    fn vertical_axis_uses_height() {
        let solver = ProportionalSolver::new(Axis::Vertical, true);
        let set = solver.normalize(&equal_panels(&["top", "bottom"]));
        let layout = solver.solve(&set, Size::new(10, 300));
        assert_eq!(layout.sizes(), vec![150, 150]);
    }

    #[test]
    fn normalize_respects_bounds() {
        let solver = solver();
        let set = panels(&[
            ("a", PanelConstraints::weighted(1.0).bounded(0.0, 0.2)),
            ("b", PanelConstraints::weighted(1.0)),
            ("c", PanelConstraints::weighted(1.0)),
        ]);
        let set = solver.normalize(&set);
        let weights: Vec<f64> = set.regions().map(PanelRegion::weight).collect();
        assert!((weights[0] - 0.2).abs() < 1e-9);
        assert!((weights[1] - 0.4).abs() < 1e-9);
        assert!((weights[2] - 0.4).abs() < 1e-9);
    }

    #[test]
    fn clamp_scales_infeasible_minimums() {
        let weights = clamp_weights(&[0.5, 0.5], &[(0.8, 1.0), (0.4, 1.0)]);
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!((weights[0] - 0.8 / 1.2).abs() < 1e-9);
    }

    #[test]
    fn clamp_raises_to_minimum() {
        let weights = clamp_weights(&[0.05, 0.95], &[(0.25, 1.0), (0.0, 1.0)]);
        assert!((weights[0] - 0.25).abs() < 1e-9);
        assert!((weights[1] - 0.75).abs() < 1e-9);
    }

    #[test]
    fn drag_moves_weight_between_neighbours_only() {
        let solver = solver();
        let set = solver.normalize(&equal_panels(&["a", "b", "c", "d"]));
        let container = Size::new(400, 50);

        let moved = solver
            .drag_to(&set, container, &id("b"), &id("c"), 230.0)
            .expect("adjacent handle");
        let layout = solver.solve(&moved.regions, container);
        assert_eq!(layout.sizes(), vec![100, 130, 70, 100]);
        assert!((weight_sum(&moved.regions) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn drag_toward_start_shrinks_before_side() {
        let solver = solver();
        let set = solver.normalize(&equal_panels(&["a", "b"]));
        let container = Size::new(200, 50);
        let moved = solver
            .drag_to(&set, container, &id("a"), &id("b"), 40.0)
            .expect("adjacent handle");
        let layout = solver.solve(&moved.regions, container);
        assert_eq!(layout.sizes(), vec![40, 160]);
        assert!(moved.applied > 0.0);
    }

    #[test]
    fn contraction_cascades_to_earlier_panels() {
        let solver = solver();
        let set = panels(&[
            ("a", PanelConstraints::weighted(1.0).bounded(0.1, 1.0)),
            ("b", PanelConstraints::weighted(1.0).bounded(0.2, 1.0)),
            ("c", PanelConstraints::weighted(2.0)),
        ]);
        let set = solver.normalize(&set);
        let container = Size::new(1000, 10);

        // b can only give 50px before hitting its 200px minimum; the rest
        // comes out of a.
        let moved = solver
            .drag_to(&set, container, &id("b"), &id("c"), 300.0)
            .expect("adjacent handle");
        let layout = solver.solve(&moved.regions, container);
        assert_eq!(layout.sizes(), vec![100, 200, 700]);
        assert!(moved.clamped < 1e-9);
    }

    #[test]
    fn contraction_stops_at_minimum_without_cascade() {
        let solver = ProportionalSolver::new(Axis::Horizontal, false);
        let set = panels(&[
            ("a", PanelConstraints::weighted(1.0)),
            ("b", PanelConstraints::weighted(1.0).bounded(0.2, 1.0)),
            ("c", PanelConstraints::weighted(2.0)),
        ]);
        let set = solver.normalize(&set);
        let container = Size::new(1000, 10);
        let moved = solver
            .drag_to(&set, container, &id("b"), &id("c"), 300.0)
            .expect("adjacent handle");
        let layout = solver.solve(&moved.regions, container);
        assert_eq!(layout.sizes(), vec![250, 200, 550]);
        assert!((moved.clamped - 0.15).abs() < 1e-9);
    }

    #[test]
    fn growth_is_capped_by_max_weight() {
        let solver = solver();
        let set = panels(&[
            ("a", PanelConstraints::weighted(1.0)),
            ("b", PanelConstraints::weighted(1.0).bounded(0.0, 0.6)),
        ]);
        let set = solver.normalize(&set);
        let container = Size::new(100, 10);
        let moved = solver
            .drag_to(&set, container, &id("a"), &id("b"), 10.0)
            .expect("adjacent handle");
        let layout = solver.solve(&moved.regions, container);
        assert_eq!(layout.sizes(), vec![40, 60]);
    }

    #[test]
    fn expansion_toward_end_cascades_to_later_panels() {
        let solver = solver();
        let set = panels(&[
            ("a", PanelConstraints::weighted(1.0)),
            ("b", PanelConstraints::weighted(1.0).bounded(0.2, 1.0)),
            ("c", PanelConstraints::weighted(1.0)),
            ("d", PanelConstraints::weighted(1.0)),
        ]);
        let set = solver.normalize(&set);
        let container = Size::new(400, 10);
        let moved = solver
            .drag_to(&set, container, &id("a"), &id("b"), 200.0)
            .expect("adjacent handle");
        let layout = solver.solve(&moved.regions, container);
        assert_eq!(layout.sizes(), vec![200, 80, 20, 100]);
    }

    #[test]
    fn non_adjacent_handle_is_rejected() {
        let solver = solver();
        let set = solver.normalize(&equal_panels(&["a", "b", "c"]));
        let err = solver
            .transfer(&set, &id("a"), &id("c"), 0.1)
            .expect_err("a and c are not neighbours");
        assert!(matches!(err, LayoutError::HandleNotAdjacent { .. }));

        let err = solver
            .transfer(&set, &id("c"), &id("b"), 0.1)
            .expect_err("reversed order");
        assert!(matches!(err, LayoutError::HandleNotAdjacent { .. }));

        let err = solver
            .transfer(&set, &id("a"), &id("zzz"), 0.1)
            .expect_err("unknown id");
        assert_eq!(err, LayoutError::UnknownRegion { id: id("zzz") });
    }

    #[test]
    fn admit_gives_newcomer_its_default_share() {
        let solver = solver();
        let set = solver.normalize(&equal_panels(&["a", "b", "c"]));
        let mut grown = set.clone();
        grown.upsert(id("d"), PanelRegion::new(PanelConstraints::weighted(1.0)));
        let grown = solver.admit(&grown, &id("d"));
        let layout = solver.solve(&grown, Size::new(400, 10));
        assert_eq!(layout.sizes(), vec![100, 100, 100, 100]);
    }

    #[test]
    fn rebalance_after_removal_fills_container() {
        let solver = solver();
        let mut set = solver.normalize(&equal_panels(&["a", "b", "c", "d"]));
        set.remove(&id("b"));
        let set = solver.rebalance(&set);
        assert!((weight_sum(&set) - 1.0).abs() < 1e-9);
        let layout = solver.solve(&set, Size::new(300, 10));
        assert_eq!(layout.sizes(), vec![100, 100, 100]);
    }

    #[test]
    fn nudge_moves_divider_by_pixels() {
        let solver = solver();
        let set = solver.normalize(&equal_panels(&["a", "b"]));
        let container = Size::new(200, 10);
        let moved = solver
            .nudge(&set, container, &id("a"), &id("b"), 10)
            .expect("adjacent handle");
        let layout = solver.solve(&moved.regions, container);
        assert_eq!(layout.sizes(), vec![110, 90]);
    }

    #[test]
    fn zero_sized_container_yields_zero_sizes() {
        let solver = solver();
        let set = solver.normalize(&equal_panels(&["a", "b"]));
        let layout = solver.solve(&set, Size::new(0, 10));
        assert_eq!(layout.sizes(), vec![0, 0]);
    }
}
