#![forbid(unsafe_code)]

//! Geometric primitives.
//!
//! All lengths are whole CSS pixels. Regions are laid out along a single
//! primary [`Axis`]; the cross axis always spans the full container.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Primary layout axis of a region group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Regions are placed left to right.
    #[default]
    Horizontal,
    /// Regions are stacked top to bottom.
    Vertical,
}

impl Axis {
    /// The other axis.
    #[inline]
    #[must_use]
    pub const fn cross(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }
}

/// Measured container dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Length along `axis`.
    #[inline]
    pub const fn along(self, axis: Axis) -> u32 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }

    /// Check if either dimension is zero.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Position and extent of one region along the primary axis.
///
/// The default value (`offset 0, size 0`) is what unknown regions resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Geometry {
    /// Distance from the container start edge.
    pub offset: u32,
    /// Extent along the primary axis.
    pub size: u32,
}

impl Geometry {
    /// Create a new geometry.
    #[inline]
    pub const fn new(offset: u32, size: u32) -> Self {
        Self { offset, size }
    }

    /// End edge (exclusive).
    #[inline]
    pub const fn end(self) -> u32 {
        self.offset.saturating_add(self.size)
    }

    /// Check if the region occupies no space.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.size == 0
    }
}

/// A single style dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Absolute pixel value.
    Px(u32),
    /// Fill the whole cross axis (`100%`).
    Full,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(px) => write!(f, "{px}px"),
            Self::Full => f.write_str("100%"),
        }
    }
}

/// Absolute-position style for a region, consumed by the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionStyle {
    pub left: Dimension,
    pub top: Dimension,
    pub width: Dimension,
    pub height: Dimension,
}

impl RegionStyle {
    /// Build the style for `geometry` laid out along `axis`.
    ///
    /// The primary axis gets the pixel offset/size, the cross axis spans 100%.
    #[must_use]
    pub const fn from_geometry(axis: Axis, geometry: Geometry) -> Self {
        match axis {
            Axis::Horizontal => Self {
                left: Dimension::Px(geometry.offset),
                top: Dimension::Px(0),
                width: Dimension::Px(geometry.size),
                height: Dimension::Full,
            },
            Axis::Vertical => Self {
                left: Dimension::Px(0),
                top: Dimension::Px(geometry.offset),
                width: Dimension::Full,
                height: Dimension::Px(geometry.size),
            },
        }
    }

    /// Render as an inline CSS declaration list.
    #[must_use]
    pub fn to_css(&self) -> String {
        format!(
            "position: absolute; left: {}; top: {}; width: {}; height: {};",
            self.left, self.top, self.width, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_along_axis() {
        let size = Size::new(800, 600);
        assert_eq!(size.along(Axis::Horizontal), 800);
        assert_eq!(size.along(Axis::Vertical), 600);
        assert!(!size.is_empty());
        assert!(Size::new(0, 10).is_empty());
    }

    #[test]
    fn cross_axis_flips() {
        assert_eq!(Axis::Horizontal.cross(), Axis::Vertical);
        assert_eq!(Axis::Vertical.cross(), Axis::Horizontal);
    }

    #[test]
    fn geometry_end_saturates() {
        assert_eq!(Geometry::new(10, 5).end(), 15);
        assert_eq!(Geometry::new(u32::MAX, 5).end(), u32::MAX);
        assert!(Geometry::default().is_empty());
    }

    #[test]
    fn horizontal_style_spans_full_height() {
        let style = RegionStyle::from_geometry(Axis::Horizontal, Geometry::new(33, 34));
        assert_eq!(style.left, Dimension::Px(33));
        assert_eq!(style.width, Dimension::Px(34));
        assert_eq!(style.height, Dimension::Full);
        assert_eq!(
            style.to_css(),
            "position: absolute; left: 33px; top: 0px; width: 34px; height: 100%;"
        );
    }

    #[test]
    fn vertical_style_spans_full_width() {
        let style = RegionStyle::from_geometry(Axis::Vertical, Geometry::new(25, 550));
        assert_eq!(style.top, Dimension::Px(25));
        assert_eq!(style.height, Dimension::Px(550));
        assert_eq!(style.width, Dimension::Full);
    }

    #[test]
    fn axis_serializes_snake_case() {
        let json = serde_json::to_string(&Axis::Vertical).expect("serialize axis");
        assert_eq!(json, "\"vertical\"");
    }
}
