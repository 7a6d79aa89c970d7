#![forbid(unsafe_code)]

//! Policy-as-data configuration for the layout engine.
//!
//! All tunables live in one [`LayoutConfig`] that can be loaded from TOML or
//! JSON at startup. Missing keys fall back to the defaults.
//!
//! ```toml
//! # replay-layout.toml
//! header_height = 25
//! min_expanded_height = 150
//! cascade_contraction = true
//! expected_regions = 3
//! ```
//!
//! ```rust,ignore
//! let config = LayoutConfig::from_toml_file("replay-layout.toml")?;
//! let config = LayoutConfig::from_json_str(json)?;
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::accordion::{AccordionSolver, DEFAULT_HEADER_HEIGHT, DEFAULT_MIN_EXPANDED_HEIGHT};
use crate::proportional::ProportionalSolver;
use replay_core::geometry::Axis;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Height of a collapsed accordion section, in pixels. Default: 25.
    pub header_height: u32,
    /// Smallest height of an expanded accordion section. Default: 150.
    pub min_expanded_height: u32,
    /// Let a drag keep contracting panels beyond the divider's neighbour once
    /// it reaches its minimum. Default: true.
    pub cascade_contraction: bool,
    /// Number of regions to wait for before the first solve. `None` solves
    /// as soon as the container is measured and one region is registered.
    pub expected_regions: Option<usize>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            header_height: DEFAULT_HEADER_HEIGHT,
            min_expanded_height: DEFAULT_MIN_EXPANDED_HEIGHT,
            cascade_contraction: true,
            expected_regions: None,
        }
    }
}

impl LayoutConfig {
    /// Load from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, LayoutConfigError> {
        toml::from_str(s).map_err(LayoutConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, LayoutConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(LayoutConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, LayoutConfigError> {
        serde_json::from_str(s).map_err(LayoutConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LayoutConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(LayoutConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Builder: wait for `count` regions before the first solve.
    #[must_use]
    pub const fn with_expected_regions(mut self, count: usize) -> Self {
        self.expected_regions = Some(count);
        self
    }

    /// Builder: enable or disable cascading contraction.
    #[must_use]
    pub const fn with_cascade_contraction(mut self, enabled: bool) -> Self {
        self.cascade_contraction = enabled;
        self
    }

    /// Validate every parameter.
    ///
    /// Returns a list of problems. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.header_height == 0 {
            errors.push("header_height must be > 0".into());
        }

        if self.min_expanded_height < self.header_height {
            errors.push(format!(
                "min_expanded_height must be >= header_height ({}), got {}",
                self.header_height, self.min_expanded_height
            ));
        }

        if self.expected_regions == Some(0) {
            errors.push("expected_regions must be > 0 when set".into());
        }

        errors
    }

    /// Accordion solver for these settings.
    #[must_use]
    pub fn accordion_solver(&self) -> AccordionSolver {
        AccordionSolver::new(self.header_height, self.min_expanded_height)
    }

    /// Split-panel solver for these settings along `axis`.
    #[must_use]
    pub fn proportional_solver(&self, axis: Axis) -> ProportionalSolver {
        ProportionalSolver::new(axis, self.cascade_contraction)
    }

    /// Active settings as a single JSON line.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

/// Errors that can occur when loading a layout configuration.
#[derive(Debug)]
pub enum LayoutConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
}

impl std::fmt::Display for LayoutConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
        }
    }
}

impl std::error::Error for LayoutConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
        }
    }
}
