#![forbid(unsafe_code)]

//! Resize handles between adjacent split panels.
//!
//! A [`ResizeHandle`] pairs two adjacent panels and lives exactly as long as
//! the guard does: dropping it unregisters the handle and detaches any drag
//! session it owns. At most one drag session is active per engine; beginning
//! a drag on another handle cancels the previous session first.

use std::fmt;

use replay_core::logging::debug;

use crate::engine::{LayoutEngine, WeakEngine};
use crate::error::LayoutError;
use crate::region::RegionId;

/// Engine-local identifier of a resize handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl HandleId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Registered handle state kept by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HandleEntry {
    pub(crate) before: RegionId,
    pub(crate) after: RegionId,
    pub(crate) enabled: bool,
}

/// The drag in progress on one handle.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DragSession {
    pub(crate) handle: HandleId,
    pub(crate) moves: u32,
    /// Net weight moved toward the after side so far.
    pub(crate) applied: f64,
}

impl DragSession {
    pub(crate) const fn new(handle: HandleId) -> Self {
        Self {
            handle,
            moves: 0,
            applied: 0.0,
        }
    }

    pub(crate) fn record(&mut self, applied: f64) {
        self.moves = self.moves.saturating_add(1);
        self.applied += applied;
    }

    pub(crate) fn finish(self, reason: &'static str) {
        debug!(
            handle = %self.handle,
            moves = self.moves,
            applied = self.applied,
            reason,
            "drag session ended"
        );
    }
}

/// Live divider between two adjacent panels.
///
/// Obtained from [`LayoutEngine::register_resize_handle`]. Every method
/// fails with [`LayoutError::EngineDropped`] once the engine is gone.
#[derive(Debug)]
pub struct ResizeHandle {
    id: HandleId,
    before: RegionId,
    after: RegionId,
    engine: WeakEngine,
}

impl ResizeHandle {
    pub(crate) fn new(id: HandleId, before: RegionId, after: RegionId, engine: WeakEngine) -> Self {
        Self {
            id,
            before,
            after,
            engine,
        }
    }

    #[must_use]
    pub const fn id(&self) -> HandleId {
        self.id
    }

    #[must_use]
    pub fn before(&self) -> &RegionId {
        &self.before
    }

    #[must_use]
    pub fn after(&self) -> &RegionId {
        &self.after
    }

    fn engine(&self) -> Result<LayoutEngine, LayoutError> {
        self.engine.upgrade().ok_or(LayoutError::EngineDropped)
    }

    /// Start a drag session, cancelling any other session on the engine.
    pub fn begin_drag(&self) -> Result<(), LayoutError> {
        self.engine()?.begin_drag(self.id)
    }

    /// Move the divider to `client_position` on the primary axis.
    ///
    /// Starts a session implicitly when none is active for this handle.
    /// Returns the signed weight actually moved.
    pub fn drag_to(&self, client_position: f64) -> Result<f64, LayoutError> {
        self.engine()?.drag_handle(self.id, client_position)
    }

    /// End this handle's drag session, if it has one.
    pub fn end_drag(&self) {
        if let Some(engine) = self.engine.upgrade() {
            engine.end_drag(self.id);
        }
    }

    /// Whether this handle owns the engine's active drag session.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.engine
            .upgrade()
            .is_some_and(|engine| engine.active_drag() == Some(self.id))
    }

    /// Enable or disable the handle. Disabling detaches an active session.
    pub fn set_enabled(&self, enabled: bool) -> Result<(), LayoutError> {
        self.engine()?.set_handle_enabled(self.id, enabled)
    }

    /// Move the divider by whole pixels (positive moves it toward the end).
    pub fn nudge(&self, pixels: i32) -> Result<f64, LayoutError> {
        self.engine()?.nudge_handle(self.id, pixels)
    }
}

impl Drop for ResizeHandle {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.upgrade() {
            engine.release_handle(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_id_display() {
        assert_eq!(HandleId::new(7).to_string(), "#7");
        assert_eq!(HandleId::new(7).get(), 7);
    }

    #[test]
    fn session_accumulates_moves() {
        let mut session = DragSession::new(HandleId::new(1));
        session.record(0.1);
        session.record(-0.04);
        assert_eq!(session.moves, 2);
        assert!((session.applied - 0.06).abs() < 1e-12);
    }
}
