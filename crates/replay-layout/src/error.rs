#![forbid(unsafe_code)]

//! Errors reported by the layout engine.

use std::fmt;

use crate::region::{LayoutMode, RegionId};
use crate::resize::HandleId;

/// Configuration and interaction errors.
///
/// Programmer errors (out-of-range section indices handed to the solver
/// functions) panic instead of surfacing here.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// The id is not registered.
    UnknownRegion { id: RegionId },
    /// A resize handle must join two regions that sit next to each other.
    HandleNotAdjacent { before: RegionId, after: RegionId },
    /// The region kind does not match the engine's solving strategy.
    ModeMismatch {
        id: RegionId,
        expected: LayoutMode,
        found: LayoutMode,
    },
    /// Weight bounds are out of range or contradict each other.
    InvalidWeights {
        id: RegionId,
        default_weight: f64,
        min_weight: f64,
        max_weight: f64,
    },
    /// The handle has been unregistered.
    UnknownHandle { handle: HandleId },
    /// The handle exists but is disabled.
    HandleDisabled { handle: HandleId },
    /// The engine behind a handle or registration guard was dropped.
    EngineDropped,
    /// The first solve has not happened yet (container unmeasured or
    /// expected regions missing).
    NotReady,
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRegion { id } => write!(f, "region {id} is not registered"),
            Self::HandleNotAdjacent { before, after } => write!(
                f,
                "resize handle regions {before} and {after} are not adjacent in solve order"
            ),
            Self::ModeMismatch {
                id,
                expected,
                found,
            } => write!(
                f,
                "region {id} is a {found} region but the engine solves {expected} layouts"
            ),
            Self::InvalidWeights {
                id,
                default_weight,
                min_weight,
                max_weight,
            } => write!(
                f,
                "region {id} has invalid weights (default={default_weight}, min={min_weight}, max={max_weight})"
            ),
            Self::UnknownHandle { handle } => write!(f, "resize handle {handle} is not registered"),
            Self::HandleDisabled { handle } => write!(f, "resize handle {handle} is disabled"),
            Self::EngineDropped => f.write_str("layout engine has been dropped"),
            Self::NotReady => f.write_str("layout engine has not computed its initial layout"),
        }
    }
}

impl std::error::Error for LayoutError {}
