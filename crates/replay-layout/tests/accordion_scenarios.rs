//! End-to-end accordion scenarios driven through the engine.

use replay_core::geometry::{Dimension, Size};
use replay_layout::{LayoutConfig, LayoutEngine, LayoutError, RegionId, RegionRegistration, RegionSpec};

fn id(raw: &str) -> RegionId {
    RegionId::new(raw)
}

fn accordion(states: &[(&str, bool)], height: u32) -> (LayoutEngine, Vec<RegionRegistration>) {
    let engine =
        LayoutEngine::accordion(LayoutConfig::default().with_expected_regions(states.len()));
    let guards = states
        .iter()
        .map(|(name, expanded)| {
            engine
                .register_region(*name, RegionSpec::section(*expanded))
                .expect("section registers")
        })
        .collect();
    engine.measure_container(Size::new(320, height));
    (engine, guards)
}

#[test]
fn pinned_three_section_scenario() {
    let (engine, _guards) = accordion(
        &[("scopes", false), ("call-stack", false), ("breakpoints", false)],
        600,
    );
    assert!(engine.is_ready());
    assert_eq!(engine.layout().sizes(), vec![25, 25, 25]);

    engine.on_toggle(&id("scopes")).expect("known section");
    assert_eq!(engine.layout().sizes(), vec![550, 25, 25]);

    // The open section drops to its floor and the new one fills the rest.
    engine.on_toggle(&id("call-stack")).expect("known section");
    assert_eq!(engine.layout().sizes(), vec![150, 425, 25]);
    assert_eq!(engine.layout().offsets(), vec![0, 150, 575]);

    engine.on_toggle(&id("call-stack")).expect("known section");
    assert_eq!(engine.layout().sizes(), vec![550, 25, 25]);
}

#[test]
fn toggle_round_trip_restores_siblings() {
    let (engine, _guards) = accordion(&[("a", true), ("b", false), ("c", true)], 700);
    let before = engine.layout().sizes();
    assert_eq!(before.iter().sum::<u32>(), 700);

    engine.toggle_collapsed(1);
    assert_eq!(engine.layout().sizes().iter().sum::<u32>(), 700);
    engine.toggle_collapsed(1);
    assert_eq!(engine.layout().sizes(), before);
}

#[test]
fn initial_layout_splits_between_expanded_sections() {
    let (engine, _guards) = accordion(&[("a", true), ("b", false), ("c", true)], 601);
    assert_eq!(engine.layout().sizes(), vec![288, 25, 288]);
}

#[test]
fn collapsing_last_expanded_leaves_trailing_space() {
    let (engine, _guards) = accordion(&[("a", true), ("b", false)], 400);
    engine.on_toggle(&id("a")).expect("known section");
    let layout = engine.layout();
    assert_eq!(layout.sizes(), vec![25, 25]);
    assert_eq!(layout.unoccupied(), 350);
}

#[test]
fn container_shrink_takes_from_last_expanded_first() {
    let (engine, _guards) = accordion(&[("a", true), ("b", true), ("c", false)], 600);
    assert_eq!(engine.layout().sizes(), vec![287, 288, 25]);

    engine.update_container_size(Size::new(320, 450));
    assert_eq!(engine.layout().sizes(), vec![275, 150, 25]);

    engine.update_container_size(Size::new(320, 800));
    assert_eq!(engine.layout().sizes(), vec![275, 500, 25]);
}

#[test]
fn resize_section_records_ideal_height() {
    let (engine, _guards) = accordion(&[("a", true), ("b", true)], 600);
    engine.resize_section(&id("a"), 200).expect("known section");
    assert_eq!(engine.layout().sizes(), vec![200, 400]);
    assert_eq!(engine.section(&id("a")).map(|s| s.ideal_height), Some(200));

    // Collapse and re-expand: the ideal height is the target again.
    engine.on_toggle(&id("a")).expect("known section");
    engine.on_toggle(&id("a")).expect("known section");
    assert_eq!(engine.geometry(&id("a")).size, 200);
}

#[test]
fn late_section_joins_through_donor_path() {
    let (engine, mut guards) = accordion(&[("a", true), ("b", false)], 600);
    assert_eq!(engine.layout().sizes(), vec![575, 25]);

    guards.push(
        engine
            .register_region("c", RegionSpec::section(false))
            .expect("section registers"),
    );
    assert_eq!(engine.layout().sizes(), vec![550, 25, 25]);

    guards.push(
        engine
            .register_region("d", RegionSpec::section(true))
            .expect("section registers"),
    );
    assert_eq!(engine.layout().sizes(), vec![150, 25, 25, 400]);
    assert_eq!(engine.layout().occupied(), 600);
}

#[test]
fn dropping_a_guard_hands_space_to_receiver() {
    let (engine, mut guards) = accordion(&[("a", true), ("b", true), ("c", false)], 600);
    assert_eq!(engine.layout().sizes(), vec![287, 288, 25]);
    drop(guards.remove(1));
    assert_eq!(engine.region_ids(), vec![id("a"), id("c")]);
    assert_eq!(engine.layout().sizes(), vec![575, 25]);
}

#[test]
fn reregistration_toggles_in_place() {
    let (engine, _guards) = accordion(&[("a", true), ("b", false)], 600);
    let _again = engine
        .register_region("b", RegionSpec::section(true))
        .expect("section registers");
    assert_eq!(engine.region_ids(), vec![id("a"), id("b")]);
    assert_eq!(engine.layout().sizes(), vec![150, 450]);
}

#[test]
fn section_style_is_vertical() {
    let (engine, _guards) = accordion(&[("a", true), ("b", false)], 600);
    let style = engine.style_for_region(&id("b"));
    assert_eq!(style.top, Dimension::Px(575));
    assert_eq!(style.height, Dimension::Px(25));
    assert_eq!(style.width, Dimension::Full);
}

#[test]
fn toggle_unknown_or_wrong_mode_is_an_error() {
    let (engine, _guards) = accordion(&[("a", true)], 600);
    assert_eq!(
        engine.on_toggle(&id("missing")),
        Err(LayoutError::UnknownRegion { id: id("missing") })
    );
    assert!(matches!(
        engine.register_resize_handle("a", "b"),
        Err(LayoutError::ModeMismatch { .. })
    ));
}

#[test]
#[should_panic(expected = "out of range")]
fn toggle_collapsed_out_of_range_panics() {
    let (engine, _guards) = accordion(&[("a", true)], 600);
    engine.toggle_collapsed(5);
}
