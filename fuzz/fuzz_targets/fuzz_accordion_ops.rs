#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use replay_core::geometry::Size;
use replay_layout::{LayoutConfig, LayoutEngine, RegionSpec};

#[derive(Debug, Arbitrary)]
enum Op {
    Toggle { section: u8 },
    ResizeSection { section: u8, height: u16 },
    Resize { extra: u16 },
    Remove { section: u8 },
    Add { expanded: bool },
}

#[derive(Debug, Arbitrary)]
struct Input {
    sections: Vec<bool>,
    extra: u16,
    ops: Vec<Op>,
}

const HEADER: u32 = 25;
const FLOOR: u32 = 150;
const MAX_SECTIONS: usize = 10;

fuzz_target!(|input: Input| {
    let engine = LayoutEngine::accordion(LayoutConfig::default());
    let mut guards = Vec::new();
    let mut next = 0usize;
    for expanded in input.sections.iter().take(MAX_SECTIONS) {
        if let Ok(guard) = engine.register_region(format!("s{next}"), RegionSpec::section(*expanded)) {
            guards.push(guard);
        }
        next += 1;
    }
    // Always large enough to hold every floor.
    let mut height = FLOOR * MAX_SECTIONS as u32 + u32::from(input.extra);
    engine.measure_container(Size::new(300, height));

    for op in input.ops.into_iter().take(64) {
        let ids = engine.region_ids();
        match op {
            Op::Toggle { section } if !ids.is_empty() => {
                let id = &ids[usize::from(section) % ids.len()];
                let _ = engine.on_toggle(id);
            }
            Op::ResizeSection { section, height: requested } if !ids.is_empty() => {
                let id = &ids[usize::from(section) % ids.len()];
                let _ = engine.resize_section(id, u32::from(requested));
            }
            Op::Resize { extra } => {
                height = FLOOR * MAX_SECTIONS as u32 + u32::from(extra);
                engine.measure_container(Size::new(300, height));
            }
            Op::Remove { section } if !guards.is_empty() => {
                let i = usize::from(section) % guards.len();
                drop(guards.remove(i));
            }
            Op::Add { expanded } if guards.len() < MAX_SECTIONS => {
                if let Ok(guard) = engine.register_region(format!("s{next}"), RegionSpec::section(expanded)) {
                    guards.push(guard);
                }
                next += 1;
            }
            _ => {}
        }

        if !engine.is_ready() {
            continue;
        }
        let layout = engine.layout();
        let sections: Vec<_> = engine
            .region_ids()
            .iter()
            .filter_map(|id| engine.section(id))
            .collect();
        let any_expanded = sections.iter().any(|s| s.expanded);
        if any_expanded {
            assert_eq!(layout.occupied(), u64::from(height), "sections must fill the container");
        } else {
            assert!(layout.occupied() <= u64::from(height));
        }
        for section in &sections {
            if section.expanded {
                assert!(section.displayed_height >= FLOOR, "expanded below floor");
            } else {
                assert_eq!(section.displayed_height, HEADER, "collapsed must be a header");
            }
        }
    }
});
