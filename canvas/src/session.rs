//! Drawing session: local capture, peer reconciliation, render bookkeeping.
//!
//! [`SessionCore`] is the whole protocol without a browser. Pointer input,
//! timer ticks and inbound payloads are fed in through `&mut self` calls and
//! every call returns the [`Action`]s the host must carry out (send a message,
//! schedule a repaint). [`Engine`] binds a core to two canvas elements.
//!
//! Convergence rules between peers:
//!
//! - commits append in the order they are received;
//! - a `draw_replace_state` overwrites the whole log, last one wins;
//! - undo and clear are never replayed remotely, the initiator broadcasts the
//!   resulting log instead.

use std::collections::HashMap;

use log::{debug, warn};
use serde_json::Value;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::consts::{DEFAULT_STROKE_COLOR, JITTER_THRESHOLD_PX, PREVIEW_INTERVAL_MS};
use crate::history::CanvasLog;
use crate::message::{DrawMessage, MessageError};
use crate::path::{self, VectorPath};
use crate::preview::{PreviewBroadcaster, PreviewPath, RemotePreview};
use crate::render;
use crate::stroke::{StrokeRecorder, StrokeSize};
use crate::viewport::{Point, Viewport, ViewportError};

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

/// Actions returned to the host for processing.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Send to every other peer in the session.
    Emit(DrawMessage),
    /// Send to every peer, the sender included.
    Broadcast(DrawMessage),
    /// Send to one peer.
    Direct { to: String, message: DrawMessage },
    RenderNeeded,
}

/// Tunables for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Jitter threshold in device pixels.
    pub jitter_threshold_px: f64,
    pub preview_interval_ms: f64,
    pub stroke_color: String,
    pub stroke_size: StrokeSize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            jitter_threshold_px: JITTER_THRESHOLD_PX,
            preview_interval_ms: PREVIEW_INTERVAL_MS,
            stroke_color: DEFAULT_STROKE_COLOR.to_owned(),
            stroke_size: StrokeSize::default(),
        }
    }
}

/// Where the local gesture slot is.
///
/// `Committed` lasts from pointer-up until the host has painted the new
/// stroke onto the ink layer ([`SessionCore::mark_rendered`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Previewing { gesture: u64 },
    Committed { gesture: u64 },
}

/// Session state that does not depend on the canvas elements.
///
/// Separated from [`Engine`] so it can be tested without WASM/browser
/// dependencies.
#[derive(Debug)]
pub struct SessionCore {
    config: SessionConfig,
    local_peer: String,
    viewport: Viewport,
    interactive: bool,
    stroke_color: String,
    stroke_size: StrokeSize,
    phase: GesturePhase,
    recorder: StrokeRecorder,
    broadcaster: PreviewBroadcaster,
    next_gesture: u64,
    log: CanvasLog,
    previews: HashMap<String, RemotePreview>,
    committed_gestures: HashMap<String, u64>,
    rendered_count: usize,
    surface_reset: bool,
}

impl SessionCore {
    /// Create a session for `local_peer` with the canonical 1000-wide viewport.
    #[must_use]
    pub fn new(local_peer: impl Into<String>, config: SessionConfig) -> Self {
        Self {
            local_peer: local_peer.into(),
            viewport: Viewport::default(),
            interactive: false,
            stroke_color: config.stroke_color.clone(),
            stroke_size: config.stroke_size,
            phase: GesturePhase::Idle,
            recorder: StrokeRecorder::new(),
            broadcaster: PreviewBroadcaster::new(config.preview_interval_ms),
            next_gesture: 1,
            log: CanvasLog::new(),
            previews: HashMap::new(),
            committed_gestures: HashMap::new(),
            rendered_count: 0,
            surface_reset: true,
            config,
        }
    }

    // --- Local input ---

    /// Start a gesture at a device-space point. Ignored unless interactive.
    pub fn pointer_down(&mut self, device_pt: Point, now_ms: f64) -> Vec<Action> {
        if !self.interactive {
            return Vec::new();
        }
        let mut actions = Vec::new();
        if let GesturePhase::Previewing { gesture } = self.phase {
            debug!("session: pointer down during gesture {gesture}; restarting");
            actions.extend(self.abort_gesture());
        }
        let gesture = self.next_gesture;
        self.next_gesture += 1;

        let threshold = self.viewport.to_logical_distance(self.config.jitter_threshold_px);
        self.recorder.start(threshold);
        self.recorder.sample(self.viewport.to_logical(device_pt));
        self.broadcaster.arm(now_ms);
        self.phase = GesturePhase::Previewing { gesture };
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Offer a pointer sample to the active gesture.
    pub fn pointer_move(&mut self, device_pt: Point, now_ms: f64) -> Vec<Action> {
        if !matches!(self.phase, GesturePhase::Previewing { .. }) {
            return Vec::new();
        }
        let kept = self.recorder.sample(self.viewport.to_logical(device_pt));
        let mut actions: Vec<Action> = self.poll_preview(now_ms).into_iter().collect();
        if kept {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    /// Finish the active gesture: encode, append and emit the commit.
    pub fn pointer_up(&mut self, device_pt: Point, _now_ms: f64) -> Vec<Action> {
        let GesturePhase::Previewing { gesture } = self.phase else {
            return Vec::new();
        };
        self.recorder.sample(self.viewport.to_logical(device_pt));
        let points = self.recorder.finish();
        let snapshot = self.broadcaster.finish(&points, &self.stroke_color, self.stroke_size.width());
        let committed = path::encode(&snapshot.points, &snapshot.stroke_color, snapshot.stroke_width);

        self.log.append(committed.clone());
        self.phase = GesturePhase::Committed { gesture };
        vec![
            Action::Emit(DrawMessage::Draw { points: committed, gesture: Some(gesture) }),
            Action::RenderNeeded,
        ]
    }

    /// Advance timers: preview cadence and remote playback.
    pub fn tick(&mut self, now_ms: f64) -> Vec<Action> {
        let mut actions: Vec<Action> = self.poll_preview(now_ms).into_iter().collect();
        let mut repaint = false;
        for preview in self.previews.values_mut() {
            repaint |= preview.take_repaint(now_ms);
        }
        if repaint {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    fn poll_preview(&mut self, now_ms: f64) -> Option<Action> {
        let GesturePhase::Previewing { gesture } = self.phase else {
            return None;
        };
        let path = self
            .broadcaster
            .poll(now_ms, self.recorder.points(), &self.stroke_color, self.stroke_size.width())?;
        Some(Action::Emit(DrawMessage::Preview { path, gesture: Some(gesture) }))
    }

    /// Drop the active gesture. Observers that were shown a preview of it get
    /// an empty one for the same gesture.
    fn abort_gesture(&mut self) -> Option<Action> {
        let GesturePhase::Previewing { gesture } = self.phase else {
            return None;
        };
        self.recorder.abort();
        self.phase = GesturePhase::Idle;
        let cleared = self.broadcaster.cancel(&self.stroke_color, self.stroke_size.width())?;
        Some(Action::Emit(DrawMessage::Preview { path: cleared, gesture: Some(gesture) }))
    }

    // --- History ---

    /// Remove the last committed stroke and broadcast the resulting log.
    pub fn undo(&mut self) -> Vec<Action> {
        if !self.log.undo_last() {
            return Vec::new();
        }
        self.request_surface_reset();
        vec![Action::Broadcast(self.replace_message()), Action::RenderNeeded]
    }

    /// Drop every committed stroke and broadcast the empty log.
    pub fn clear(&mut self) -> Vec<Action> {
        if self.log.is_empty() {
            return Vec::new();
        }
        self.log.clear();
        self.request_surface_reset();
        vec![Action::Broadcast(self.replace_message()), Action::RenderNeeded]
    }

    fn replace_message(&self) -> DrawMessage {
        DrawMessage::DrawReplaceState { points: self.log.paths().to_vec() }
    }

    fn request_surface_reset(&mut self) {
        self.rendered_count = 0;
        self.surface_reset = true;
    }

    // --- Inbound ---

    /// Handle a raw payload received from `sender`.
    ///
    /// Payloads for other parts of the game are ignored; malformed draw
    /// payloads are logged and dropped.
    pub fn apply(&mut self, sender: &str, payload: &Value, now_ms: f64) -> Vec<Action> {
        match DrawMessage::from_value(payload) {
            Ok(message) => self.apply_message(sender, message, now_ms),
            Err(err @ MessageError::Unhandled(_)) => {
                debug!("session: ignoring payload from {sender}: {err}");
                Vec::new()
            }
            Err(err) => {
                warn!("session: dropping payload from {sender}: {err}");
                Vec::new()
            }
        }
    }

    /// Handle a decoded message received from `sender`.
    pub fn apply_message(&mut self, sender: &str, message: DrawMessage, now_ms: f64) -> Vec<Action> {
        if sender == self.local_peer {
            debug!("session: ignoring echoed {}", message.kind());
            return Vec::new();
        }
        match message {
            DrawMessage::Preview { path, gesture } => self.apply_preview(sender, path, gesture, now_ms),
            DrawMessage::Draw { points, gesture } => self.apply_draw(sender, points, gesture),
            DrawMessage::DrawReplaceState { points } => self.apply_replace(points),
        }
    }

    fn apply_preview(&mut self, sender: &str, path: PreviewPath, gesture: Option<u64>, now_ms: f64) -> Vec<Action> {
        if let (Some(gesture), Some(&committed)) = (gesture, self.committed_gestures.get(sender)) {
            if gesture <= committed {
                debug!("session: stale preview from {sender} for committed gesture {gesture}");
                return Vec::new();
            }
        }
        let next = RemotePreview::receive(
            self.previews.get(sender),
            path,
            gesture,
            now_ms,
            self.config.preview_interval_ms,
        );
        self.previews.insert(sender.to_owned(), next);
        vec![Action::RenderNeeded]
    }

    fn apply_draw(&mut self, sender: &str, points: VectorPath, gesture: Option<u64>) -> Vec<Action> {
        self.log.append(points);
        self.previews.remove(sender);
        if let Some(gesture) = gesture {
            let last = self.committed_gestures.entry(sender.to_owned()).or_insert(gesture);
            *last = (*last).max(gesture);
        }
        vec![Action::RenderNeeded]
    }

    fn apply_replace(&mut self, points: Vec<VectorPath>) -> Vec<Action> {
        self.log.replace_all(points);
        self.previews.clear();
        self.request_surface_reset();
        vec![Action::RenderNeeded]
    }

    // --- Roster ---

    /// A peer entered the session. The drawer brings it up to date.
    pub fn peer_joined(&mut self, peer: &str) -> Vec<Action> {
        if peer == self.local_peer || !self.interactive || self.log.is_empty() {
            return Vec::new();
        }
        vec![Action::Direct { to: peer.to_owned(), message: self.replace_message() }]
    }

    /// A peer left; its unfinished preview goes with it.
    pub fn peer_left(&mut self, peer: &str) -> Vec<Action> {
        self.committed_gestures.remove(peer);
        if self.previews.remove(peer).is_some() {
            vec![Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    // --- Settings ---

    /// Refit the surface to `available_width` device pixels.
    ///
    /// A change of size cancels remote playback and forces the whole log to
    /// be painted again at the new scale.
    ///
    /// # Errors
    ///
    /// Returns [`ViewportError`] for a width that is zero, negative or not finite.
    pub fn set_viewport(&mut self, available_width: f64) -> Result<Vec<Action>, ViewportError> {
        let viewport = Viewport::fit(available_width)?;
        if viewport == self.viewport {
            return Ok(Vec::new());
        }
        self.viewport = viewport;
        for preview in self.previews.values_mut() {
            preview.snap();
        }
        self.request_surface_reset();
        Ok(vec![Action::RenderNeeded])
    }

    /// Allow or forbid local drawing. Forbidding it mid-gesture drops the gesture.
    pub fn set_interactive(&mut self, interactive: bool) -> Vec<Action> {
        self.interactive = interactive;
        if !interactive && matches!(self.phase, GesturePhase::Previewing { .. }) {
            let mut actions: Vec<Action> = self.abort_gesture().into_iter().collect();
            actions.push(Action::RenderNeeded);
            return actions;
        }
        Vec::new()
    }

    pub fn set_color(&mut self, color: &str) {
        color.clone_into(&mut self.stroke_color);
    }

    pub fn set_stroke_size(&mut self, size: StrokeSize) {
        self.stroke_size = size;
    }

    // --- Render bookkeeping ---

    /// Committed strokes not yet painted on the ink layer.
    #[must_use]
    pub fn unrendered(&self) -> &[VectorPath] {
        self.log.paths_from(self.rendered_count)
    }

    /// Record that every committed stroke is now on the ink layer.
    pub fn mark_rendered(&mut self) {
        self.rendered_count = self.log.len();
        if let GesturePhase::Committed { .. } = self.phase {
            self.phase = GesturePhase::Idle;
        }
    }

    /// Returns `true` once after the ink layer has to be wiped and repainted.
    pub fn take_surface_reset(&mut self) -> bool {
        std::mem::take(&mut self.surface_reset)
    }

    /// The local in-progress stroke, if a gesture is active.
    #[must_use]
    pub fn local_stroke(&self) -> Option<PreviewPath> {
        match self.phase {
            GesturePhase::Previewing { .. } if !self.recorder.points().is_empty() => Some(PreviewPath::new(
                &self.stroke_color,
                self.stroke_size.width(),
                self.recorder.points().to_vec(),
            )),
            _ => None,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn log(&self) -> &CanvasLog {
        &self.log
    }

    #[must_use]
    pub fn preview(&self, peer: &str) -> Option<&RemotePreview> {
        self.previews.get(peer)
    }

    pub fn previews(&self) -> impl Iterator<Item = (&str, &RemotePreview)> {
        self.previews.iter().map(|(peer, preview)| (peer.as_str(), preview))
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    #[must_use]
    pub fn rendered_count(&self) -> usize {
        self.rendered_count
    }

    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    #[must_use]
    pub fn stroke_color(&self) -> &str {
        &self.stroke_color
    }

    #[must_use]
    pub fn stroke_size(&self) -> StrokeSize {
        self.stroke_size
    }

    #[must_use]
    pub fn local_peer(&self) -> &str {
        &self.local_peer
    }
}

/// The browser-side session. Wraps [`SessionCore`] and owns the ink and
/// overlay canvas elements.
pub struct Engine {
    ink: HtmlCanvasElement,
    overlay: HtmlCanvasElement,
    pub core: SessionCore,
}

impl Engine {
    /// Bind a session to its canvases and size them to `available_width`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewportError`] if `available_width` is unusable.
    pub fn new(
        ink: HtmlCanvasElement,
        overlay: HtmlCanvasElement,
        local_peer: impl Into<String>,
        config: SessionConfig,
        available_width: f64,
    ) -> Result<Self, ViewportError> {
        let mut engine = Self { ink, overlay, core: SessionCore::new(local_peer, config) };
        engine.set_viewport(available_width)?;
        Ok(engine)
    }

    // --- Delegated input ---

    pub fn pointer_down(&mut self, device_pt: Point, now_ms: f64) -> Vec<Action> {
        self.core.pointer_down(device_pt, now_ms)
    }

    pub fn pointer_move(&mut self, device_pt: Point, now_ms: f64) -> Vec<Action> {
        self.core.pointer_move(device_pt, now_ms)
    }

    pub fn pointer_up(&mut self, device_pt: Point, now_ms: f64) -> Vec<Action> {
        self.core.pointer_up(device_pt, now_ms)
    }

    pub fn tick(&mut self, now_ms: f64) -> Vec<Action> {
        self.core.tick(now_ms)
    }

    pub fn apply(&mut self, sender: &str, payload: &Value, now_ms: f64) -> Vec<Action> {
        self.core.apply(sender, payload, now_ms)
    }

    pub fn undo(&mut self) -> Vec<Action> {
        self.core.undo()
    }

    pub fn clear(&mut self) -> Vec<Action> {
        self.core.clear()
    }

    // --- Viewport ---

    /// Refit the session and resize both canvases to the new surface.
    ///
    /// # Errors
    ///
    /// Returns [`ViewportError`] if `available_width` is unusable.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, available_width: f64) -> Result<Vec<Action>, ViewportError> {
        let actions = self.core.set_viewport(available_width)?;
        let viewport = self.core.viewport();
        let (width, height) = (viewport.actual_width.round() as u32, viewport.actual_height.round() as u32);
        for canvas in [&self.ink, &self.overlay] {
            canvas.set_width(width);
            canvas.set_height(height);
        }
        Ok(actions)
    }

    // --- Render ---

    /// Paint pending ink and redraw the overlay.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a canvas has no 2D context or a `Canvas2D` call fails.
    pub fn render(&mut self, now_ms: f64) -> Result<(), JsValue> {
        let ink = context_2d(&self.ink)?;
        let overlay = context_2d(&self.overlay)?;
        let viewport = self.core.viewport();

        if self.core.take_surface_reset() {
            render::reset_surface(&ink, viewport)?;
        }
        render::draw_paths(&ink, self.core.unrendered(), viewport)?;
        self.core.mark_rendered();

        let local = self.core.local_stroke();
        let previews = self.core.previews().map(|(_, preview)| preview);
        render::draw_overlay(&overlay, viewport, local.as_ref(), previews, now_ms)
    }
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("missing 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(JsValue::from)
}
