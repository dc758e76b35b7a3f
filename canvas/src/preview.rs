//! Live previews of in-progress strokes.
//!
//! The drawer side re-sends the whole gesture so far on a fixed cadence
//! ([`PreviewBroadcaster`]); every message is self-sufficient, so a lost
//! preview is healed by the next one. The observer side keeps one
//! [`RemotePreview`] per drawing peer and reveals newly arrived points
//! progressively over one cadence period so the stroke appears to be drawn
//! rather than jumping in 500 ms chunks.
//!
//! Timing is host-driven: nothing here owns a clock. Callers pass `now_ms`
//! (e.g. `performance.now()`) into every time-dependent call.

#[cfg(test)]
#[path = "preview_test.rs"]
mod preview_test;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_STROKE_COLOR;
use crate::viewport::Point;

/// Snapshot of an in-progress gesture, in logical coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewPath {
    #[serde(default = "default_stroke_color")]
    pub stroke_color: String,
    pub stroke_width: f64,
    pub points: Vec<Point>,
}

fn default_stroke_color() -> String {
    DEFAULT_STROKE_COLOR.to_owned()
}

impl PreviewPath {
    #[must_use]
    pub fn new(stroke_color: &str, stroke_width: f64, points: Vec<Point>) -> Self {
        Self { stroke_color: stroke_color.to_owned(), stroke_width, points }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// =============================================================
// ScheduledTask
// =============================================================

/// A repeating deadline with an explicit cancelled state.
///
/// `next_due_ms == None` means cancelled; a cancelled task never fires again
/// until re-armed. When the host falls behind, missed periods are skipped
/// rather than fired back to back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledTask {
    interval_ms: f64,
    next_due_ms: Option<f64>,
}

impl ScheduledTask {
    /// Create a cancelled task. Intervals below 1 ms are clamped to 1 ms.
    #[must_use]
    pub fn new(interval_ms: f64) -> Self {
        Self { interval_ms: interval_ms.max(1.0), next_due_ms: None }
    }

    /// Start (or restart) the task; it first fires one interval after `now_ms`.
    pub fn arm(&mut self, now_ms: f64) {
        self.next_due_ms = Some(now_ms + self.interval_ms);
    }

    pub fn cancel(&mut self) {
        self.next_due_ms = None;
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.next_due_ms.is_some()
    }

    #[must_use]
    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Returns true at most once per elapsed period.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        let Some(due) = self.next_due_ms else {
            return false;
        };
        if now_ms < due {
            return false;
        }
        let missed = ((now_ms - due) / self.interval_ms).floor();
        self.next_due_ms = Some(due + (missed + 1.0) * self.interval_ms);
        true
    }
}

// =============================================================
// PreviewBroadcaster
// =============================================================

/// Drawer-side preview cadence for the active gesture.
#[derive(Debug, Clone)]
pub struct PreviewBroadcaster {
    task: ScheduledTask,
    /// Whether observers have seen a preview of the current gesture.
    sent: bool,
}

impl PreviewBroadcaster {
    #[must_use]
    pub fn new(interval_ms: f64) -> Self {
        Self { task: ScheduledTask::new(interval_ms), sent: false }
    }

    /// Arm the cadence at gesture start.
    pub fn arm(&mut self, now_ms: f64) {
        self.task.arm(now_ms);
        self.sent = false;
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.task.is_armed()
    }

    /// Produce the preview to send if a period has elapsed and there is
    /// something to show.
    pub fn poll(&mut self, now_ms: f64, points: &[Point], stroke_color: &str, stroke_width: f64) -> Option<PreviewPath> {
        if !self.task.poll(now_ms) || points.is_empty() {
            return None;
        }
        self.sent = true;
        Some(PreviewPath::new(stroke_color, stroke_width, points.to_vec()))
    }

    /// Cancel the cadence at gesture end and return the final local snapshot.
    ///
    /// The snapshot is never sent as a preview; the commit that follows is
    /// the authoritative message for the finished stroke.
    pub fn finish(&mut self, points: &[Point], stroke_color: &str, stroke_width: f64) -> PreviewPath {
        self.task.cancel();
        self.sent = false;
        PreviewPath::new(stroke_color, stroke_width, points.to_vec())
    }

    /// Cancel without producing a snapshot (aborted gesture).
    ///
    /// Returns the empty preview observers need to erase what they were
    /// shown, or `None` when nothing was ever sent for this gesture.
    pub fn cancel(&mut self, stroke_color: &str, stroke_width: f64) -> Option<PreviewPath> {
        self.task.cancel();
        std::mem::take(&mut self.sent).then(|| PreviewPath::new(stroke_color, stroke_width, Vec::new()))
    }
}

// =============================================================
// Remote playback
// =============================================================

/// Progressive reveal of the points `from..to` over `duration_ms`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewPlayback {
    from: usize,
    to: usize,
    started_ms: f64,
    duration_ms: f64,
}

impl PreviewPlayback {
    #[must_use]
    pub fn new(from: usize, to: usize, started_ms: f64, duration_ms: f64) -> Self {
        Self { from: from.min(to), to, started_ms, duration_ms }
    }

    /// Number of points that should be visible at `now_ms`.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn visible_len(&self, now_ms: f64) -> usize {
        if self.duration_ms <= 0.0 {
            return self.to;
        }
        let elapsed = (now_ms - self.started_ms).max(0.0);
        if elapsed >= self.duration_ms {
            return self.to;
        }
        let span = (self.to - self.from) as f64;
        let revealed = (span * elapsed / self.duration_ms).floor() as usize;
        (self.from + revealed).min(self.to)
    }

    #[must_use]
    pub fn is_finished(&self, now_ms: f64) -> bool {
        self.visible_len(now_ms) >= self.to
    }

    /// Jump to the end immediately.
    pub fn snap(&mut self) {
        self.from = self.to;
        self.duration_ms = 0.0;
    }
}

/// The latest preview received from one remote peer.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePreview {
    pub path: PreviewPath,
    pub gesture: Option<u64>,
    playback: PreviewPlayback,
    /// Visible length at the last repaint request.
    painted_len: usize,
}

impl RemotePreview {
    /// Build the state for a freshly received preview.
    ///
    /// When it continues the gesture of `previous`, the points already shown
    /// stay visible and only the new tail is animated; a different gesture
    /// starts from nothing.
    #[must_use]
    pub fn receive(
        previous: Option<&RemotePreview>,
        path: PreviewPath,
        gesture: Option<u64>,
        now_ms: f64,
        duration_ms: f64,
    ) -> Self {
        let shown = previous
            .filter(|prev| prev.gesture == gesture && prev.path.points.len() <= path.points.len())
            .map_or(0, |prev| prev.path.points.len());
        let playback = PreviewPlayback::new(shown, path.points.len(), now_ms, duration_ms);
        let painted_len = playback.visible_len(now_ms);
        Self { path, gesture, playback, painted_len }
    }

    /// Points that should be drawn at `now_ms`.
    #[must_use]
    pub fn visible_points(&self, now_ms: f64) -> &[Point] {
        let len = self.playback.visible_len(now_ms).min(self.path.points.len());
        &self.path.points[..len]
    }

    #[must_use]
    pub fn is_animating(&self, now_ms: f64) -> bool {
        !self.playback.is_finished(now_ms)
    }

    /// Whether the host must repaint at `now_ms`: true while the reveal is
    /// running, and once more on the first call that sees it complete.
    pub fn take_repaint(&mut self, now_ms: f64) -> bool {
        let len = self.playback.visible_len(now_ms);
        let grew = len != self.painted_len;
        self.painted_len = len;
        grew || self.is_animating(now_ms)
    }

    /// Stop animating and show the whole preview.
    pub fn snap(&mut self) {
        self.playback.snap();
        self.painted_len = self.path.points.len();
    }
}
