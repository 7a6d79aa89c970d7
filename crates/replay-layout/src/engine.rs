#![forbid(unsafe_code)]

//! The layout engine: registry owner, solve scheduler, and change notifier.
//!
//! # Design
//!
//! [`LayoutEngine`] wraps its state in shared, reference-counted storage
//! (`Rc<RefCell<..>>`). Cloning an engine creates a new handle to the same
//! state. Registration guards and resize handles hold weak references, so
//! they never keep an engine alive.
//!
//! # Lifecycle
//!
//! 1. Regions register (typically on mount) and the container is measured.
//! 2. Once the container is known and `expected_regions` regions are
//!    registered, the initial layout runs. This barrier fires once.
//! 3. Afterwards every registry change, container resize, drag, and toggle
//!    re-solves immediately, and listeners see the new [`Layout`] if it
//!    changed.
//!
//! # Failure Modes
//!
//! - **Drag before ready**: returns [`LayoutError::NotReady`].
//! - **Out-of-range section index**: [`LayoutEngine::toggle_collapsed`]
//!   panics; use [`LayoutEngine::on_toggle`] with an id for fallible toggles.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use web_time::Instant;

use replay_core::geometry::{Axis, Geometry, RegionStyle, Size};
use replay_core::logging::{debug, debug_span};

use crate::config::LayoutConfig;
use crate::debug::{LayoutDebugger, LayoutRecord};
use crate::error::LayoutError;
use crate::notify::{self, Listeners, Subscription};
use crate::proportional::validate_adjacent;
use crate::region::{LayoutMode, PanelRegion, RegionId, RegionSet, RegionSpec, SectionRegion};
use crate::resize::{DragSession, HandleEntry, HandleId, ResizeHandle};
use crate::solver::{Layout, Strategy};

pub(crate) struct EngineInner {
    config: LayoutConfig,
    strategy: Strategy,
    container: Option<Size>,
    ready: bool,
    layout: Layout,
    /// Latest registration token per id; only the matching guard may
    /// unregister.
    tokens: FxHashMap<RegionId, u64>,
    next_token: u64,
    handles: FxHashMap<HandleId, HandleEntry>,
    next_handle: u64,
    session: Option<DragSession>,
    listeners: Listeners,
    debugger: Option<Arc<LayoutDebugger>>,
}

struct Pending {
    callbacks: Vec<Rc<dyn Fn(&Layout)>>,
    layout: Layout,
}

impl EngineInner {
    fn axis(&self) -> Axis {
        match &self.strategy {
            Strategy::Proportional { solver, .. } => solver.axis(),
            Strategy::Greedy { .. } => Axis::Vertical,
        }
    }

    fn container_total(&self) -> u32 {
        self.container.map_or(0, |c| c.along(self.axis()))
    }

    fn container_height(&self) -> u32 {
        self.container.map_or(0, |c| c.height)
    }

    fn try_ready(&mut self) {
        if self.ready {
            return;
        }
        let Some(container) = self.container else {
            return;
        };
        let expected = self.config.expected_regions.unwrap_or(1);
        if self.strategy.len() < expected {
            return;
        }
        self.ready = true;
        match &mut self.strategy {
            Strategy::Proportional { solver, regions } => *regions = solver.normalize(regions),
            Strategy::Greedy { solver, regions } => {
                *regions = solver.initial_layout(regions, container.height);
            }
        }
        debug!(
            regions = self.strategy.len(),
            expected,
            mode = %self.strategy.mode(),
            "initial layout"
        );
    }

    /// Re-solve and report listeners to call if the layout changed.
    ///
    /// Listeners stay silent until the initial layout has run.
    fn refresh(&mut self, reason: &'static str) -> Option<Pending> {
        let (true, Some(container)) = (self.ready, self.container) else {
            self.layout = Layout::empty(self.axis(), self.container_total());
            return None;
        };
        let start = Instant::now();
        let next = self.strategy.solve(container);
        if let Some(debugger) = self.debugger.as_ref().filter(|d| d.enabled()) {
            debugger.record(LayoutRecord::from_layout(
                reason,
                self.strategy.mode(),
                &next,
                Some(start.elapsed()),
            ));
        }
        if next == self.layout {
            return None;
        }
        self.layout = next;
        let callbacks = self.listeners.live();
        if callbacks.is_empty() {
            return None;
        }
        Some(Pending {
            callbacks,
            layout: self.layout.clone(),
        })
    }

    fn register(&mut self, id: &RegionId, spec: RegionSpec) -> Result<u64, LayoutError> {
        let expected = self.strategy.mode();
        let ready = self.ready;
        let container = self.container_height();
        match (&mut self.strategy, spec) {
            (Strategy::Proportional { solver, regions }, RegionSpec::Panel(constraints)) => {
                constraints.validate(id)?;
                if let Some(existing) = regions.get(id) {
                    let weight = existing.weight;
                    regions.upsert(id.clone(), PanelRegion::with_weight(constraints, weight));
                    if ready {
                        *regions = solver.rebalance(regions);
                    }
                } else {
                    regions.upsert(id.clone(), PanelRegion::new(constraints));
                    if ready {
                        *regions = solver.admit(regions, id);
                    }
                }
            }
            (
                Strategy::Greedy { solver, regions },
                RegionSpec::Section {
                    expanded,
                    ideal_height,
                },
            ) => {
                if let Some(index) = regions.index_of(id) {
                    if ideal_height > 0 {
                        if let Some(section) = regions.region_mut(index) {
                            section.ideal_height = ideal_height;
                        }
                        regions.touch();
                    }
                    let was_expanded = regions.get(id).is_some_and(|s| s.expanded);
                    if was_expanded != expanded {
                        if ready {
                            *regions = solver.toggle(regions, index, container);
                        } else {
                            if let Some(section) = regions.region_mut(index) {
                                section.expanded = expanded;
                            }
                            regions.touch();
                        }
                    }
                } else if ready {
                    // Join collapsed, make room for the header, then expand
                    // through the normal donor path.
                    let mut section = SectionRegion::new(false, ideal_height);
                    section.displayed_height = solver.header_height();
                    regions.upsert(id.clone(), section);
                    *regions = solver.reflow(regions, container);
                    if let Some(index) = regions.index_of(id).filter(|_| expanded) {
                        *regions = solver.embiggen(regions, index, container);
                    }
                } else {
                    regions.upsert(id.clone(), SectionRegion::new(expanded, ideal_height));
                }
            }
            (_, spec) => {
                return Err(LayoutError::ModeMismatch {
                    id: id.clone(),
                    expected,
                    found: spec.mode(),
                });
            }
        }
        self.next_token += 1;
        let token = self.next_token;
        self.tokens.insert(id.clone(), token);
        debug!(region = %id, token, "region registered");
        self.try_ready();
        Ok(token)
    }

    fn unregister(&mut self, id: &RegionId) -> bool {
        self.tokens.remove(id);
        let involved = self
            .session
            .as_ref()
            .and_then(|s| self.handles.get(&s.handle))
            .is_some_and(|h| &h.before == id || &h.after == id);
        if involved {
            if let Some(session) = self.session.take() {
                session.finish("region removed");
            }
        }

        let ready = self.ready;
        let container = self.container_height();
        let removed = match &mut self.strategy {
            Strategy::Proportional { solver, regions } => {
                let removed = regions.remove(id).is_some();
                if removed && ready && !regions.is_empty() {
                    *regions = solver.rebalance(regions);
                }
                removed
            }
            Strategy::Greedy { solver, regions } => {
                let removed = regions.contains(id);
                if removed && ready {
                    *regions = solver.remove_section(regions, id, container);
                } else if removed {
                    regions.remove(id);
                }
                removed
            }
        };
        if removed {
            debug!(region = %id, "region unregistered");
        }
        removed
    }

    fn resize_container(&mut self, size: Size) {
        if self.container == Some(size) {
            return;
        }
        self.container = Some(size);
        if !self.ready {
            self.try_ready();
            return;
        }
        if let Strategy::Greedy { solver, regions } = &mut self.strategy {
            *regions = solver.reflow(regions, size.height);
        }
    }

    fn drag(
        &mut self,
        before: &RegionId,
        after: &RegionId,
        client_position: f64,
    ) -> Result<f64, LayoutError> {
        let found = self.strategy.mode();
        let Strategy::Proportional { solver, regions } = &mut self.strategy else {
            return Err(LayoutError::ModeMismatch {
                id: before.clone(),
                expected: LayoutMode::Proportional,
                found,
            });
        };
        let (true, Some(container)) = (self.ready, self.container) else {
            return Err(LayoutError::NotReady);
        };
        let transfer = solver.drag_to(regions, container, before, after, client_position)?;
        *regions = transfer.regions;
        Ok(transfer.applied)
    }

    fn nudge(&mut self, before: &RegionId, after: &RegionId, pixels: i32) -> Result<f64, LayoutError> {
        let found = self.strategy.mode();
        let Strategy::Proportional { solver, regions } = &mut self.strategy else {
            return Err(LayoutError::ModeMismatch {
                id: before.clone(),
                expected: LayoutMode::Proportional,
                found,
            });
        };
        let (true, Some(container)) = (self.ready, self.container) else {
            return Err(LayoutError::NotReady);
        };
        let transfer = solver.nudge(regions, container, before, after, pixels)?;
        *regions = transfer.regions;
        Ok(transfer.applied)
    }

    fn add_handle(&mut self, before: &RegionId, after: &RegionId) -> Result<HandleId, LayoutError> {
        let Strategy::Proportional { regions, .. } = &self.strategy else {
            return Err(LayoutError::ModeMismatch {
                id: before.clone(),
                expected: LayoutMode::Proportional,
                found: LayoutMode::Greedy,
            });
        };
        validate_adjacent(regions, before, after)?;
        self.next_handle += 1;
        let handle = HandleId::new(self.next_handle);
        self.handles.insert(
            handle,
            HandleEntry {
                before: before.clone(),
                after: after.clone(),
                enabled: true,
            },
        );
        debug!(%handle, %before, %after, "resize handle registered");
        Ok(handle)
    }

    fn live_handle(&self, handle: HandleId) -> Result<HandleEntry, LayoutError> {
        let entry = self
            .handles
            .get(&handle)
            .ok_or(LayoutError::UnknownHandle { handle })?;
        if !entry.enabled {
            return Err(LayoutError::HandleDisabled { handle });
        }
        Ok(entry.clone())
    }

    fn begin_session(&mut self, handle: HandleId) -> Result<(), LayoutError> {
        self.live_handle(handle)?;
        if self.session.as_ref().is_some_and(|s| s.handle == handle) {
            return Ok(());
        }
        if let Some(previous) = self.session.take() {
            previous.finish("superseded");
        }
        debug!(%handle, "drag session started");
        self.session = Some(DragSession::new(handle));
        Ok(())
    }

    fn end_session(&mut self, handle: HandleId, reason: &'static str) {
        if self.session.as_ref().is_some_and(|s| s.handle == handle) {
            if let Some(session) = self.session.take() {
                session.finish(reason);
            }
        }
    }

    fn section_index(&self, id: &RegionId) -> Result<usize, LayoutError> {
        match &self.strategy {
            Strategy::Greedy { regions, .. } => regions
                .index_of(id)
                .ok_or_else(|| LayoutError::UnknownRegion { id: id.clone() }),
            Strategy::Proportional { .. } => Err(LayoutError::ModeMismatch {
                id: id.clone(),
                expected: LayoutMode::Greedy,
                found: LayoutMode::Proportional,
            }),
        }
    }

    fn toggle(&mut self, index: usize) {
        let ready = self.ready;
        let container = self.container_height();
        let Strategy::Greedy { solver, regions } = &mut self.strategy else {
            panic!("section toggles require an accordion engine");
        };
        let len = regions.len();
        assert!(index < len, "section index {index} out of range ({len} sections)");
        if ready {
            *regions = solver.toggle(regions, index, container);
        } else {
            if let Some(section) = regions.region_mut(index) {
                section.expanded = !section.expanded;
            }
            regions.touch();
        }
    }

    fn resize_section(&mut self, index: usize, height: u32) {
        let ready = self.ready;
        let container = self.container_height();
        if let Strategy::Greedy { solver, regions } = &mut self.strategy {
            if ready {
                *regions = solver.resize_section(regions, index, height, container);
            } else {
                if let Some(section) = regions.region_mut(index) {
                    section.ideal_height = height;
                }
                regions.touch();
            }
        }
    }
}

/// Shared handle to one layout engine.
///
/// Each engine is an explicit instance with one solving strategy fixed at
/// construction.
#[derive(Clone)]
pub struct LayoutEngine {
    inner: Rc<RefCell<EngineInner>>,
}

impl std::fmt::Debug for LayoutEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("LayoutEngine")
            .field("mode", &inner.strategy.mode())
            .field("regions", &inner.strategy.len())
            .field("container", &inner.container)
            .field("ready", &inner.ready)
            .field("handles", &inner.handles.len())
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl LayoutEngine {
    /// Engine for proportional split panels laid out along `axis`.
    #[must_use]
    pub fn split_panels(axis: Axis, config: LayoutConfig) -> Self {
        let solver = config.proportional_solver(axis);
        Self::with_strategy(
            Strategy::Proportional {
                solver,
                regions: RegionSet::new(),
            },
            config,
        )
    }

    /// Engine for vertically stacked accordion sections.
    #[must_use]
    pub fn accordion(config: LayoutConfig) -> Self {
        let solver = config.accordion_solver();
        Self::with_strategy(
            Strategy::Greedy {
                solver,
                regions: RegionSet::new(),
            },
            config,
        )
    }

    fn with_strategy(strategy: Strategy, config: LayoutConfig) -> Self {
        let axis = match &strategy {
            Strategy::Proportional { solver, .. } => solver.axis(),
            Strategy::Greedy { .. } => Axis::Vertical,
        };
        Self {
            inner: Rc::new(RefCell::new(EngineInner {
                config,
                strategy,
                container: None,
                ready: false,
                layout: Layout::empty(axis, 0),
                tokens: FxHashMap::default(),
                next_token: 0,
                handles: FxHashMap::default(),
                next_handle: 0,
                session: None,
                listeners: Listeners::default(),
                debugger: None,
            })),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakEngine {
        WeakEngine(Rc::downgrade(&self.inner))
    }

    /// Run a mutation, re-solve, and notify listeners once the borrow is
    /// released.
    fn update<T>(&self, reason: &'static str, f: impl FnOnce(&mut EngineInner) -> T) -> T {
        let (out, pending) = {
            let mut inner = self.inner.borrow_mut();
            let _span = debug_span!("layout.update", reason).entered();
            let out = f(&mut *inner);
            let pending = inner.refresh(reason);
            (out, pending)
        };
        if let Some(pending) = pending {
            notify::deliver(&pending.callbacks, &pending.layout);
        }
        out
    }

    /// Register a region, or update it in place if `id` is already known.
    ///
    /// The returned guard unregisters the region when dropped. When the same
    /// id is registered again, only the newest guard unregisters it.
    pub fn register_region(
        &self,
        id: impl Into<RegionId>,
        spec: RegionSpec,
    ) -> Result<RegionRegistration, LayoutError> {
        let id = id.into();
        let token = self.update("register", |inner| inner.register(&id, spec))?;
        Ok(RegionRegistration {
            id,
            token,
            engine: self.downgrade(),
        })
    }

    /// Remove a region; the others reflow immediately. Returns whether it
    /// was registered.
    pub fn unregister_region(&self, id: &RegionId) -> bool {
        self.update("unregister", |inner| inner.unregister(id))
    }

    fn release_registration(&self, id: &RegionId, token: u64) {
        self.update("unregister", |inner| {
            if inner.tokens.get(id) == Some(&token) {
                inner.unregister(id);
            }
        });
    }

    /// Container measurement from the rendering layer.
    pub fn measure_container(&self, size: Size) {
        self.update("container", |inner| inner.resize_container(size));
    }

    /// Store the latest container size and re-solve.
    pub fn update_container_size(&self, size: Size) {
        self.measure_container(size);
    }

    /// Listen for layout changes. Dropping the guard unsubscribes.
    pub fn subscribe(&self, listener: impl Fn(&Layout) + 'static) -> Subscription {
        self.inner.borrow_mut().listeners.subscribe(listener)
    }

    /// Attach a solve debugger.
    pub fn set_debugger(&self, debugger: Arc<LayoutDebugger>) {
        self.inner.borrow_mut().debugger = Some(debugger);
    }

    /// Latest solved layout (empty until ready).
    #[must_use]
    pub fn layout(&self) -> Layout {
        self.inner.borrow().layout.clone()
    }

    /// Geometry of `id`; zero until ready or for unknown ids.
    #[must_use]
    pub fn geometry(&self, id: &RegionId) -> Geometry {
        self.inner.borrow().layout.geometry(id)
    }

    #[must_use]
    pub fn style_for_region(&self, id: &RegionId) -> RegionStyle {
        self.inner.borrow().layout.style_for_region(id)
    }

    /// Whether the initial layout has run.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.inner.borrow().ready
    }

    #[must_use]
    pub fn mode(&self) -> LayoutMode {
        self.inner.borrow().strategy.mode()
    }

    #[must_use]
    pub fn axis(&self) -> Axis {
        self.inner.borrow().axis()
    }

    #[must_use]
    pub fn config(&self) -> LayoutConfig {
        self.inner.borrow().config.clone()
    }

    #[must_use]
    pub fn container(&self) -> Option<Size> {
        self.inner.borrow().container
    }

    /// Number of registered regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().strategy.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registry generation; changes on every mutation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.borrow().strategy.generation()
    }

    /// Ids in solve order.
    #[must_use]
    pub fn region_ids(&self) -> Vec<RegionId> {
        match &self.inner.borrow().strategy {
            Strategy::Proportional { regions, .. } => regions.ids().cloned().collect(),
            Strategy::Greedy { regions, .. } => regions.ids().cloned().collect(),
        }
    }

    /// Live state of a split panel.
    #[must_use]
    pub fn panel(&self, id: &RegionId) -> Option<PanelRegion> {
        match &self.inner.borrow().strategy {
            Strategy::Proportional { regions, .. } => regions.get(id).copied(),
            Strategy::Greedy { .. } => None,
        }
    }

    /// Live state of an accordion section.
    #[must_use]
    pub fn section(&self, id: &RegionId) -> Option<SectionRegion> {
        match &self.inner.borrow().strategy {
            Strategy::Greedy { regions, .. } => regions.get(id).cloned(),
            Strategy::Proportional { .. } => None,
        }
    }

    /// Create a handle for the divider between two adjacent panels.
    pub fn register_resize_handle(
        &self,
        before: impl Into<RegionId>,
        after: impl Into<RegionId>,
    ) -> Result<ResizeHandle, LayoutError> {
        let before = before.into();
        let after = after.into();
        let handle = self.inner.borrow_mut().add_handle(&before, &after)?;
        Ok(ResizeHandle::new(handle, before, after, self.downgrade()))
    }

    /// Apply a pointer position to the divider between `before` and `after`
    /// without a handle. Returns the signed weight moved.
    pub fn on_drag_delta(
        &self,
        before: &RegionId,
        after: &RegionId,
        client_position: f64,
    ) -> Result<f64, LayoutError> {
        self.update("drag", |inner| inner.drag(before, after, client_position))
    }

    /// Handle currently dragging, if any.
    #[must_use]
    pub fn active_drag(&self) -> Option<HandleId> {
        self.inner.borrow().session.as_ref().map(|s| s.handle)
    }

    pub(crate) fn begin_drag(&self, handle: HandleId) -> Result<(), LayoutError> {
        self.inner.borrow_mut().begin_session(handle)
    }

    pub(crate) fn drag_handle(&self, handle: HandleId, client_position: f64) -> Result<f64, LayoutError> {
        self.update("drag", |inner| {
            let entry = inner.live_handle(handle)?;
            if !inner.ready {
                return Err(LayoutError::NotReady);
            }
            inner.begin_session(handle)?;
            let applied = inner.drag(&entry.before, &entry.after, client_position)?;
            if let Some(session) = inner.session.as_mut() {
                session.record(applied);
            }
            Ok(applied)
        })
    }

    pub(crate) fn nudge_handle(&self, handle: HandleId, pixels: i32) -> Result<f64, LayoutError> {
        self.update("nudge", |inner| {
            let entry = inner.live_handle(handle)?;
            inner.nudge(&entry.before, &entry.after, pixels)
        })
    }

    pub(crate) fn end_drag(&self, handle: HandleId) {
        self.inner.borrow_mut().end_session(handle, "ended");
    }

    pub(crate) fn set_handle_enabled(&self, handle: HandleId, enabled: bool) -> Result<(), LayoutError> {
        let mut inner = self.inner.borrow_mut();
        let entry = inner
            .handles
            .get_mut(&handle)
            .ok_or(LayoutError::UnknownHandle { handle })?;
        entry.enabled = enabled;
        if !enabled {
            inner.end_session(handle, "disabled");
        }
        Ok(())
    }

    pub(crate) fn release_handle(&self, handle: HandleId) {
        let mut inner = self.inner.borrow_mut();
        inner.end_session(handle, "handle dropped");
        if inner.handles.remove(&handle).is_some() {
            debug!(%handle, "resize handle released");
        }
    }

    /// Toggle the section with `id` between collapsed and expanded.
    ///
    /// Before the initial layout this only flips the declared state.
    pub fn on_toggle(&self, id: &RegionId) -> Result<(), LayoutError> {
        self.update("toggle", |inner| {
            let index = inner.section_index(id)?;
            inner.toggle(index);
            Ok(())
        })
    }

    /// Toggle the section at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range or the engine is not an accordion.
    pub fn toggle_collapsed(&self, index: usize) {
        self.update("toggle", |inner| inner.toggle(index));
    }

    /// Request an explicit height for a section. Collapsed sections keep the
    /// height for their next expansion.
    pub fn resize_section(&self, id: &RegionId, height: u32) -> Result<(), LayoutError> {
        self.update("resize_section", |inner| {
            let index = inner.section_index(id)?;
            inner.resize_section(index, height);
            Ok(())
        })
    }
}

/// Weak reference held by guards and handles.
#[derive(Debug, Clone)]
pub(crate) struct WeakEngine(Weak<RefCell<EngineInner>>);

impl WeakEngine {
    pub(crate) fn upgrade(&self) -> Option<LayoutEngine> {
        self.0.upgrade().map(|inner| LayoutEngine { inner })
    }
}

/// RAII guard for a registered region.
///
/// Dropping the guard unregisters the region unless a newer registration of
/// the same id has taken over.
#[derive(Debug)]
#[must_use = "dropping the registration unregisters the region"]
pub struct RegionRegistration {
    id: RegionId,
    token: u64,
    engine: WeakEngine,
}

impl RegionRegistration {
    #[must_use]
    pub fn id(&self) -> &RegionId {
        &self.id
    }
}

impl Drop for RegionRegistration {
    fn drop(&mut self) {
        if let Some(engine) = self.engine.upgrade() {
            engine.release_registration(&self.id, self.token);
        }
    }
}
