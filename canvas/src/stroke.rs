//! Stroke capture: brush presets and the jitter-gated point recorder.
//!
//! A `StrokeRecorder` lives for one gesture (pointer-down to pointer-up). It
//! keeps only samples that moved far enough from the last kept sample, which
//! bounds both the size of the committed path and the size of every preview
//! message without visibly changing the stroke.

#[cfg(test)]
#[path = "stroke_test.rs"]
mod stroke_test;

use serde::{Deserialize, Serialize};

use crate::viewport::Point;

/// Brush size presets offered to the drawer, in logical units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrokeSize {
    Small,
    #[default]
    Normal,
    Large,
    XLarge,
}

impl StrokeSize {
    /// Every preset, thinnest first.
    pub const ALL: [StrokeSize; 4] = [Self::Small, Self::Normal, Self::Large, Self::XLarge];

    /// Stroke width of the preset.
    #[must_use]
    pub fn width(self) -> f64 {
        match self {
            Self::Small => 3.0,
            Self::Normal => 7.0,
            Self::Large => 10.0,
            Self::XLarge => 15.0,
        }
    }
}

/// Accumulates the points of one gesture.
#[derive(Debug, Clone, Default)]
pub struct StrokeRecorder {
    points: Vec<Point>,
    threshold: f64,
    active: bool,
}

impl StrokeRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new gesture, discarding anything left from the previous one.
    ///
    /// `threshold` is in the same units as the points that will be sampled.
    pub fn start(&mut self, threshold: f64) {
        self.points.clear();
        self.threshold = threshold.max(0.0);
        self.active = true;
    }

    /// Offer a pointer sample. Returns whether it was kept.
    ///
    /// The first sample of a gesture is always kept. Later samples are kept
    /// only when they are further than the threshold from the last kept point
    /// along at least one axis. Samples offered outside a gesture are ignored.
    pub fn sample(&mut self, p: Point) -> bool {
        if !self.active {
            return false;
        }
        if let Some(last) = self.points.last() {
            if last.axis_distance(p) <= self.threshold {
                return false;
            }
        }
        self.points.push(p);
        true
    }

    /// End the gesture and hand back the kept points.
    pub fn finish(&mut self) -> Vec<Point> {
        self.active = false;
        std::mem::take(&mut self.points)
    }

    /// Drop the gesture without producing points.
    pub fn abort(&mut self) {
        self.active = false;
        self.points.clear();
    }

    /// Whether a gesture is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Points kept so far in the current gesture.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }
}
