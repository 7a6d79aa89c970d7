#![forbid(unsafe_code)]

//! Region layout engine for Replay DevTools.
//!
//! Two strategies solve the same one-dimensional problem of handing a
//! container's length to an ordered list of regions:
//!
//! - **Proportional** ([`proportional`]): split panels own a fractional
//!   weight; pointer drags on a divider move weight between its neighbours,
//!   cascading further out once a neighbour hits its bound.
//! - **Greedy** ([`accordion`]): stacked sections are collapsed to a header
//!   or expanded; expanding borrows space from donors and collapsing repays
//!   it or hands it to a receiver.
//!
//! [`LayoutEngine`] owns one registry, defers the first solve until the
//! container is measured and the expected regions are registered, and
//! notifies subscribers whenever the solved [`Layout`] changes.
//!
//! ```rust,ignore
//! use replay_layout::{LayoutConfig, LayoutEngine, RegionSpec};
//! use replay_core::{Axis, Size};
//!
//! let engine = LayoutEngine::split_panels(Axis::Horizontal, LayoutConfig::default());
//! let _sources = engine.register_region("sources", RegionSpec::panel(1.0))?;
//! let _editor = engine.register_region("editor", RegionSpec::panel(2.0))?;
//! engine.measure_container(Size::new(900, 600));
//! let handle = engine.register_resize_handle("sources", "editor")?;
//! handle.drag_to(250.0)?;
//! ```

pub mod accordion;
pub mod config;
pub mod debug;
pub mod engine;
pub mod error;
mod notify;
pub mod proportional;
pub mod region;
pub mod resize;
pub mod solver;

pub use accordion::AccordionSolver;
pub use config::{LayoutConfig, LayoutConfigError};
pub use engine::{LayoutEngine, RegionRegistration};
pub use error::LayoutError;
pub use notify::Subscription;
pub use proportional::{ProportionalSolver, Transfer};
pub use region::{
    LayoutMode, LoanLedger, PanelConstraints, PanelRegion, RegionId, RegionSet, RegionSpec,
    SectionRegion,
};
pub use resize::{HandleId, ResizeHandle};
pub use solver::{Layout, RegionSolver, Strategy};
