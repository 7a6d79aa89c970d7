//! Benchmarks for the region solvers.
//!
//! Run with: cargo bench -p replay-layout

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use replay_core::geometry::{Axis, Size};
use replay_layout::{
    AccordionSolver, PanelConstraints, PanelRegion, ProportionalSolver, RegionId, RegionSet,
    RegionSolver, SectionRegion,
};
use std::hint::black_box;

/// `n` panels with mixed default weights and light bounds.
fn make_panels(n: usize) -> RegionSet<PanelRegion> {
    let mut set = RegionSet::new();
    for i in 0..n {
        let constraints = PanelConstraints::weighted(1.0 + (i % 3) as f64).bounded(0.01, 0.9);
        set.upsert(RegionId::new(format!("panel-{i}")), PanelRegion::new(constraints));
    }
    set
}

fn make_sections(n: usize) -> RegionSet<SectionRegion> {
    let mut set = RegionSet::new();
    for i in 0..n {
        set.upsert(
            RegionId::new(format!("section-{i}")),
            SectionRegion::new(i % 2 == 0, 0),
        );
    }
    set
}

fn bench_proportional_solve(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/proportional_solve");
    let solver = ProportionalSolver::new(Axis::Horizontal, true);
    let container = Size::new(1920, 1080);

    for n in [2, 4, 8, 16, 64] {
        let set = solver.normalize(&make_panels(n));
        group.bench_with_input(BenchmarkId::new("solve", n), &set, |b, set| {
            b.iter(|| black_box(solver.solve(set, container)))
        });
    }

    group.finish();
}

fn bench_proportional_drag(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/proportional_drag");
    let solver = ProportionalSolver::new(Axis::Horizontal, true);
    let container = Size::new(1920, 1080);

    for n in [4, 16, 64] {
        let set = solver.normalize(&make_panels(n));
        let before = RegionId::new(format!("panel-{}", n - 2));
        let after = RegionId::new(format!("panel-{}", n - 1));
        group.bench_with_input(BenchmarkId::new("cascade_to_start", n), &set, |b, set| {
            b.iter(|| black_box(solver.drag_to(set, container, &before, &after, 1800.0)))
        });
    }

    group.finish();
}

fn bench_accordion_toggle(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/accordion_toggle");
    let solver = AccordionSolver::default();

    for n in [3, 8, 32] {
        let container = (n as u32) * 200;
        let set = solver.initial_layout(&make_sections(n), container);
        group.bench_with_input(BenchmarkId::new("expand_collapse", n), &set, |b, set| {
            b.iter(|| {
                let expanded = solver.toggle(set, 1, container);
                black_box(solver.toggle(&expanded, 1, container))
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_proportional_solve,
    bench_proportional_drag,
    bench_accordion_toggle
);
criterion_main!(benches);
