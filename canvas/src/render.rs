//! Rendering: paints committed ink and live previews onto 2D contexts.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It receives read-only views of session state and produces pixels; it does
//! not mutate any application state.
//!
//! Everything is drawn in logical coordinates under a `scale` transform, so
//! the same path string lands on the same relative spot at every viewport
//! width and stroke widths scale with it.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::session::Engine::render`]) handles the result.

use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, Path2d};

use crate::consts::{BACKGROUND_COLOR, STROKE_MITER_LIMIT};
use crate::path::{self, VectorPath};
use crate::preview::{PreviewPath, RemotePreview};
use crate::viewport::Viewport;

/// Wipe the ink layer back to the background colour.
///
/// # Errors
///
/// Returns `Err` if the transform cannot be reset.
pub fn reset_surface(ctx: &CanvasRenderingContext2d, viewport: Viewport) -> Result<(), JsValue> {
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    ctx.set_fill_style_str(BACKGROUND_COLOR);
    ctx.fill_rect(0.0, 0.0, viewport.actual_width, viewport.actual_height);
    Ok(())
}

/// Paint committed paths on top of whatever the ink layer already shows.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails.
pub fn draw_paths(ctx: &CanvasRenderingContext2d, paths: &[VectorPath], viewport: Viewport) -> Result<(), JsValue> {
    if paths.is_empty() {
        return Ok(());
    }
    ctx.save();
    apply_scale(ctx, viewport)?;
    for vp in paths {
        stroke_path_data(ctx, &vp.path_data, &vp.stroke_color, vp.stroke_width)?;
    }
    ctx.restore();
    Ok(())
}

/// Redraw the overlay: the local stroke in progress and every remote preview
/// at its current playback position.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails.
pub fn draw_overlay<'a>(
    ctx: &CanvasRenderingContext2d,
    viewport: Viewport,
    local: Option<&PreviewPath>,
    previews: impl Iterator<Item = &'a RemotePreview>,
    now_ms: f64,
) -> Result<(), JsValue> {
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, viewport.actual_width, viewport.actual_height);

    ctx.save();
    apply_scale(ctx, viewport)?;
    for preview in previews {
        let visible = preview.visible_points(now_ms);
        if visible.is_empty() {
            continue;
        }
        let vp = path::encode(visible, &preview.path.stroke_color, preview.path.stroke_width);
        stroke_path_data(ctx, &vp.path_data, &vp.stroke_color, vp.stroke_width)?;
    }
    if let Some(local) = local {
        let vp = path::encode(&local.points, &local.stroke_color, local.stroke_width);
        stroke_path_data(ctx, &vp.path_data, &vp.stroke_color, vp.stroke_width)?;
    }
    ctx.restore();
    Ok(())
}

// =============================================================
// Helpers
// =============================================================

fn apply_scale(ctx: &CanvasRenderingContext2d, viewport: Viewport) -> Result<(), JsValue> {
    ctx.set_transform(viewport.scale, 0.0, 0.0, viewport.scale, 0.0, 0.0)
}

fn stroke_path_data(ctx: &CanvasRenderingContext2d, path_data: &str, color: &str, width: f64) -> Result<(), JsValue> {
    let shape = Path2d::new_with_path_string(path_data)?;
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(width);
    ctx.set_line_cap("round");
    ctx.set_line_join("round");
    ctx.set_miter_limit(STROKE_MITER_LIMIT);
    ctx.stroke_with_path(&shape);
    Ok(())
}
