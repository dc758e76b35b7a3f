//! Shared numeric constants for the canvas crate.

// ── Coordinate space ────────────────────────────────────────────

/// Width of the logical canvas. Every path on the wire is expressed in these units.
pub const CANONICAL_WIDTH: f64 = 1000.0;

/// Height-to-width ratio of the drawing surface.
pub const CANVAS_RATIO: f64 = 0.6;

// ── Capture ─────────────────────────────────────────────────────

/// Minimum pointer travel, in device pixels, before a sample is kept.
pub const JITTER_THRESHOLD_PX: f64 = 2.0;

/// Length of the synthetic segment emitted for a tap with no drag, in logical units.
pub const DOT_SEGMENT_LEN: f64 = 1.0;

// ── Preview ─────────────────────────────────────────────────────

/// Cadence of in-progress preview messages, in milliseconds.
pub const PREVIEW_INTERVAL_MS: f64 = 500.0;

// ── Style ───────────────────────────────────────────────────────

/// Stroke colour used when neither the host nor the payload supplies one.
pub const DEFAULT_STROKE_COLOR: &str = "#ff0000";

/// Fill colour of the ink layer after a reset.
pub const BACKGROUND_COLOR: &str = "#FFFFFF";

/// Miter limit applied to every stroke.
pub const STROKE_MITER_LIMIT: f64 = 10.0;
