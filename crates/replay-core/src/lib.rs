#![forbid(unsafe_code)]

//! Core: geometry primitives and logging bootstrap.
//!
//! # Role in the workspace
//! `replay-core` holds the value types shared between the layout engine and
//! whatever renders it: container [`Size`](geometry::Size), per-region
//! [`Geometry`](geometry::Geometry), and the absolute-position
//! [`RegionStyle`](geometry::RegionStyle) handed to the view layer.

pub mod geometry;
pub mod logging;

pub use geometry::{Axis, Dimension, Geometry, RegionStyle, Size};
