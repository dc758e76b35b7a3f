//! Coordinate normalization between device pixels and the logical canvas.
//!
//! Every peer renders the canvas at its own width, but every path that leaves
//! this crate is expressed in a fixed logical space [`CANONICAL_WIDTH`] units
//! wide. `Viewport` captures the ratio between the two for one peer and is the
//! only place that ratio is computed.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

use crate::consts::{CANONICAL_WIDTH, CANVAS_RATIO};

/// A point in either device or logical space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Point) -> Point {
        Point { x: (self.x + other.x) / 2.0, y: (self.y + other.y) / 2.0 }
    }

    /// Largest per-axis offset between `self` and `other`.
    #[must_use]
    pub fn axis_distance(self, other: Point) -> f64 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

/// Error returned by [`Viewport::fit`].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ViewportError {
    /// The host reported a width that cannot produce a usable scale.
    #[error("invalid viewport width: {0}")]
    InvalidWidth(f64),
}

/// Render surface size for one peer and its ratio to the logical canvas.
///
/// `scale` is `actual_width / CANONICAL_WIDTH` and is always finite and
/// strictly positive; [`Viewport::fit`] refuses anything else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub actual_width: f64,
    pub actual_height: f64,
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { actual_width: CANONICAL_WIDTH, actual_height: CANONICAL_WIDTH * CANVAS_RATIO, scale: 1.0 }
    }
}

impl Viewport {
    /// Size the render surface for the width the host has available.
    ///
    /// The surface never grows past the logical canvas; narrower hosts get a
    /// proportionally smaller surface with the same aspect ratio.
    ///
    /// # Errors
    ///
    /// Returns [`ViewportError::InvalidWidth`] when `available_width` is zero,
    /// negative, or not finite.
    pub fn fit(available_width: f64) -> Result<Self, ViewportError> {
        if !available_width.is_finite() || available_width <= 0.0 {
            return Err(ViewportError::InvalidWidth(available_width));
        }
        let actual_width = available_width.min(CANONICAL_WIDTH);
        let actual_height = (available_width * CANVAS_RATIO).min(CANONICAL_WIDTH * CANVAS_RATIO);
        Ok(Self { actual_width, actual_height, scale: actual_width / CANONICAL_WIDTH })
    }

    /// Convert a device-pixel point to logical coordinates.
    #[must_use]
    pub fn to_logical(&self, device: Point) -> Point {
        to_logical(device, self.scale)
    }

    /// Convert a logical point to device pixels for local rendering.
    #[must_use]
    pub fn to_device(&self, logical: Point) -> Point {
        to_device(logical, self.scale)
    }

    /// Convert a device-pixel distance to logical units.
    #[must_use]
    pub fn to_logical_distance(&self, device_dist: f64) -> f64 {
        device_dist / self.scale
    }
}

/// Scale a device point into logical space. `scale` must come from a [`Viewport`].
#[must_use]
pub fn to_logical(device: Point, scale: f64) -> Point {
    Point { x: device.x / scale, y: device.y / scale }
}

/// Scale a logical point into device space. `scale` must come from a [`Viewport`].
#[must_use]
pub fn to_device(logical: Point, scale: f64) -> Point {
    Point { x: logical.x * scale, y: logical.y * scale }
}
