#![forbid(unsafe_code)]

//! Solve-pass debugging utilities.
//!
//! Provides introspection into region solving:
//! - Recording of every solve pass an engine performs
//! - Detection of overflow/underflow conditions
//! - Export as JSON lines
//!
//! Recording is a no-op unless explicitly enabled at runtime.
//!
//! # Usage
//!
//! ```ignore
//! use replay_layout::debug::LayoutDebugger;
//!
//! let debugger = LayoutDebugger::new();
//! debugger.set_enabled(true);
//! engine.set_debugger(Arc::clone(&debugger));
//!
//! // ... drag, toggle ...
//!
//! for record in debugger.snapshot() {
//!     if record.has_underflow() {
//!         eprintln!("{}", record.summary());
//!     }
//! }
//! ```

use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;

use crate::region::{LayoutMode, RegionId};
use crate::solver::Layout;

/// A record of a single solve pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutRecord {
    /// What triggered the pass (`"drag"`, `"toggle"`, ...).
    pub name: String,
    pub mode: LayoutMode,
    pub ids: Vec<RegionId>,
    pub sizes: Vec<u32>,
    pub offsets: Vec<u32>,
    /// Container length on the primary axis.
    pub total: u32,
    pub unoccupied: u32,
    /// Time taken to solve, in microseconds (if measured).
    pub solve_time_us: Option<u64>,
}

impl LayoutRecord {
    /// Create an empty record.
    pub fn new(name: impl Into<String>, mode: LayoutMode) -> Self {
        Self {
            name: name.into(),
            mode,
            ids: Vec::new(),
            sizes: Vec::new(),
            offsets: Vec::new(),
            total: 0,
            unoccupied: 0,
            solve_time_us: None,
        }
    }

    /// Capture a solved layout.
    pub fn from_layout(
        name: impl Into<String>,
        mode: LayoutMode,
        layout: &Layout,
        solve_time: Option<Duration>,
    ) -> Self {
        Self {
            name: name.into(),
            mode,
            ids: layout.iter().map(|(id, _)| id.clone()).collect(),
            sizes: layout.sizes(),
            offsets: layout.offsets(),
            total: layout.total(),
            unoccupied: layout.unoccupied(),
            solve_time_us: solve_time.map(|t| u64::try_from(t.as_micros()).unwrap_or(u64::MAX)),
        }
    }

    fn occupied(&self) -> u64 {
        self.sizes.iter().map(|s| u64::from(*s)).sum()
    }

    /// Regions occupy more than the container.
    pub fn has_overflow(&self) -> bool {
        self.occupied() > u64::from(self.total)
    }

    /// Trailing space is left over.
    pub fn has_underflow(&self) -> bool {
        self.occupied() < u64::from(self.total)
    }

    /// Percentage of the container in use.
    pub fn utilization(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.occupied() as f32 / self.total as f32).min(1.0) * 100.0
    }

    /// Generate a human-readable summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "{} ({}):", self.name, self.mode);
        let _ = writeln!(s, "  Total: {}", self.total);
        for (i, ((id, size), offset)) in self
            .ids
            .iter()
            .zip(&self.sizes)
            .zip(&self.offsets)
            .enumerate()
        {
            let _ = writeln!(s, "  [{i}] {id} -> {size} @ {offset}");
        }
        let _ = writeln!(s, "  Utilization: {:.1}%", self.utilization());
        if self.has_overflow() {
            let _ = writeln!(s, "  OVERFLOW");
        }
        if self.has_underflow() {
            let _ = writeln!(s, "  UNDERFLOW ({} unoccupied)", self.unoccupied);
        }
        if let Some(us) = self.solve_time_us {
            let _ = writeln!(s, "  Solve time: {us}us");
        }
        s
    }
}

/// Solve-pass debugger.
///
/// Thread-safe via internal synchronization; one debugger may be shared by
/// several engines.
#[derive(Debug)]
pub struct LayoutDebugger {
    enabled: AtomicBool,
    records: Mutex<Vec<LayoutRecord>>,
}

impl LayoutDebugger {
    /// Create a new debugger wrapped in Arc (disabled by default).
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            enabled: AtomicBool::new(false),
            records: Mutex::new(Vec::new()),
        })
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Clear all recorded data.
    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }

    /// Record a solve pass. Ignored while disabled.
    pub fn record(&self, record: LayoutRecord) {
        if !self.enabled() {
            return;
        }
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }

    /// Get a snapshot of all records.
    pub fn snapshot(&self) -> Vec<LayoutRecord> {
        self.records
            .lock()
            .ok()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn overflows(&self) -> Vec<LayoutRecord> {
        self.snapshot()
            .into_iter()
            .filter(LayoutRecord::has_overflow)
            .collect()
    }

    pub fn underflows(&self) -> Vec<LayoutRecord> {
        self.snapshot()
            .into_iter()
            .filter(LayoutRecord::has_underflow)
            .collect()
    }

    /// Generate a summary report of all recorded passes.
    pub fn report(&self) -> String {
        let records = self.snapshot();

        let mut s = String::new();
        let _ = writeln!(s, "=== Layout Debug Report ({} passes) ===", records.len());

        let overflows: Vec<_> = records.iter().filter(|r| r.has_overflow()).collect();
        let underflows: Vec<_> = records.iter().filter(|r| r.has_underflow()).collect();

        if !overflows.is_empty() {
            let _ = writeln!(s, "\n{} passes have OVERFLOW:", overflows.len());
            for r in &overflows {
                let _ = writeln!(s, "  - {}", r.name);
            }
        }

        if !underflows.is_empty() {
            let _ = writeln!(s, "\n{} passes have UNDERFLOW:", underflows.len());
            for r in &underflows {
                let _ = writeln!(s, "  - {} ({:.1}% utilization)", r.name, r.utilization());
            }
        }

        let _ = writeln!(s, "\n--- Passes ---");
        for record in &records {
            let _ = write!(s, "\n{}", record.summary());
        }
        s
    }

    /// Export every record as one JSON object per line.
    pub fn export_jsonl(&self) -> String {
        let mut s = String::new();
        for record in self.snapshot() {
            if let Ok(line) = serde_json::to_string(&record) {
                let _ = writeln!(s, "{line}");
            }
        }
        s
    }
}
