#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use replay_core::geometry::{Axis, Size};
use replay_layout::{LayoutConfig, LayoutEngine, PanelConstraints, RegionId, RegionSpec};

#[derive(Debug, Arbitrary)]
enum Op {
    Drag { handle: u8, position: u16 },
    Nudge { handle: u8, pixels: i8 },
    Resize { width: u16 },
    Remove { panel: u8 },
    Add { weight: u8, min: u8 },
}

#[derive(Debug, Arbitrary)]
struct Input {
    vertical: bool,
    cascade: bool,
    width: u16,
    panels: Vec<(u8, u8)>,
    ops: Vec<Op>,
}

fn constraints(weight: u8, min: u8) -> PanelConstraints {
    // weight 1..=256, min 0..=0.1
    PanelConstraints::weighted(f64::from(weight) + 1.0).bounded(f64::from(min % 11) / 100.0, 1.0)
}

fuzz_target!(|input: Input| {
    let axis = if input.vertical { Axis::Vertical } else { Axis::Horizontal };
    let config = LayoutConfig::default().with_cascade_contraction(input.cascade);
    let engine = LayoutEngine::split_panels(axis, config);
    let mut guards = Vec::new();
    let mut next = 0usize;
    for (weight, min) in input.panels.iter().take(8) {
        let spec = RegionSpec::Panel(constraints(*weight, *min));
        if let Ok(guard) = engine.register_region(format!("p{next}"), spec) {
            guards.push(guard);
        }
        next += 1;
    }
    let mut total = u32::from(input.width);
    engine.measure_container(Size::new(total, total));

    for op in input.ops.into_iter().take(64) {
        let ids: Vec<RegionId> = engine.region_ids();
        match op {
            Op::Drag { handle, position } if ids.len() > 1 => {
                let i = usize::from(handle) % (ids.len() - 1);
                let _ = engine.on_drag_delta(&ids[i], &ids[i + 1], f64::from(position));
            }
            Op::Nudge { handle, pixels } if ids.len() > 1 => {
                let i = usize::from(handle) % (ids.len() - 1);
                if let Ok(h) = engine.register_resize_handle(ids[i].clone(), ids[i + 1].clone()) {
                    let _ = h.nudge(i32::from(pixels));
                }
            }
            Op::Resize { width } => {
                total = u32::from(width);
                engine.measure_container(Size::new(total, total));
            }
            Op::Remove { panel } if !guards.is_empty() => {
                let i = usize::from(panel) % guards.len();
                drop(guards.remove(i));
            }
            Op::Add { weight, min } if guards.len() < 12 => {
                let spec = RegionSpec::Panel(constraints(weight, min));
                if let Ok(guard) = engine.register_region(format!("p{next}"), spec) {
                    guards.push(guard);
                }
                next += 1;
            }
            _ => {}
        }

        if engine.is_ready() && !engine.is_empty() {
            let layout = engine.layout();
            assert_eq!(layout.occupied(), u64::from(total), "panels must fill the container");
            let weight_sum: f64 = engine
                .region_ids()
                .iter()
                .filter_map(|id| engine.panel(id))
                .map(|p| p.weight())
                .sum();
            assert!((weight_sum - 1.0).abs() < 1e-6, "weights drifted: {weight_sum}");
        }
    }
});
