//! Canvas geometry: draw rectangles, fitting, and handle placement.
//!
//! Both the compositor and the gesture controller derive geometry from
//! these functions every tick; nothing here is cached, so what is drawn
//! and what is hit-tested can never disagree.

use serde::{Deserialize, Serialize};

use crate::layer::Layer;
use crate::transform::Transform;

/// Canonical working resolution: 9:16 portrait canvas.
pub const CANVAS_WIDTH: u32 = 1080;
pub const CANVAS_HEIGHT: u32 = 1920;

/// Length of an edge handle along its edge, in canvas pixels.
///
/// Handles have fixed on-canvas dimensions regardless of the draw
/// rectangle size so they remain touch-sized.
pub const HANDLE_LENGTH: f64 = 120.0;
/// Thickness of an edge handle across its edge, in canvas pixels.
pub const HANDLE_THICKNESS: f64 = 44.0;

/// Canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH,
            height: CANVAS_HEIGHT,
        }
    }
}

/// Axis-aligned rectangle in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Build a rect from its center point and dimensions.
    pub fn centered_at(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            x: cx - w / 2.0,
            y: cy - h / 2.0,
            w,
            h,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }
}

/// What a single-touch press on the selected layer grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrabTarget {
    /// Inside the draw rectangle: translate the layer.
    Move,
    /// Top edge handle: crop from the top.
    Top,
    /// Bottom edge handle: crop from the bottom.
    Bottom,
    /// Left edge handle: crop from the left.
    Left,
    /// Right edge handle: crop from the right.
    Right,
}

/// The source rectangle left after applying the four crop percentages,
/// in source pixel coordinates.
pub fn source_crop_rect(layer: &Layer) -> Rect {
    crop_rect_in(
        &layer.transform,
        layer.natural_width as f64,
        layer.natural_height as f64,
    )
}

/// Crop percentages applied to an arbitrary source pixel size. The
/// compositor uses this against the dimensions of the frame actually
/// delivered, which for assets equals the layer's natural size.
pub fn crop_rect_in(t: &Transform, src_w: f64, src_h: f64) -> Rect {
    Rect {
        x: src_w * t.crop_left / 100.0,
        y: src_h * t.crop_top / 100.0,
        w: src_w * t.visible_x_fraction(),
        h: src_h * t.visible_y_fraction(),
    }
}

/// Base (uncropped) draw dimensions in canvas pixels.
///
/// Scale is defined against the uncropped aspect ratio; cropping shrinks
/// the draw rectangle proportionally but never changes the base, so crop
/// edits do not disturb the anchor math used for scaling.
pub fn base_draw_size(layer: &Layer, canvas: CanvasSize) -> (f64, f64) {
    let base_w = canvas.width as f64 * layer.transform.scale / 100.0;
    let base_h = base_w * layer.aspect();
    (base_w, base_h)
}

/// Cropped draw dimensions in canvas pixels.
pub fn draw_size(layer: &Layer, canvas: CanvasSize) -> (f64, f64) {
    let (base_w, base_h) = base_draw_size(layer, canvas);
    let t = &layer.transform;
    (base_w * t.visible_x_fraction(), base_h * t.visible_y_fraction())
}

/// The destination rectangle for a layer in its normal presentation:
/// cropped draw size centered at the stored `(x%, y%)` position.
pub fn draw_rect(layer: &Layer, canvas: CanvasSize) -> Rect {
    let (w, h) = draw_size(layer, canvas);
    let cx = layer.transform.x / 100.0 * canvas.width as f64;
    let cy = layer.transform.y / 100.0 * canvas.height as f64;
    Rect::centered_at(cx, cy, w, h)
}

/// The destination rectangle for the selected layer in full-frame mode:
/// the cropped source contain-fitted into the canvas, centered. Stored
/// position is ignored.
pub fn full_frame_rect(layer: &Layer, canvas: CanvasSize) -> Rect {
    let src = source_crop_rect(layer);
    contain_fit(src.w, src.h, canvas)
}

/// The destination rectangle the compositor would use for this layer.
pub fn presentation_rect(layer: &Layer, canvas: CanvasSize, full_frame: bool) -> Rect {
    if full_frame {
        full_frame_rect(layer, canvas)
    } else {
        draw_rect(layer, canvas)
    }
}

/// Scale-to-fill with center-cropping overflow: the result covers the
/// whole canvas, overhanging on the longer source axis.
pub fn cover_fit(src_w: f64, src_h: f64, canvas: CanvasSize) -> Rect {
    let cw = canvas.width as f64;
    let ch = canvas.height as f64;
    let scale = (cw / src_w).max(ch / src_h);
    let w = src_w * scale;
    let h = src_h * scale;
    Rect::centered_at(cw / 2.0, ch / 2.0, w, h)
}

/// Scale-to-fit preserving aspect ratio, letterboxed and centered.
pub fn contain_fit(src_w: f64, src_h: f64, canvas: CanvasSize) -> Rect {
    let cw = canvas.width as f64;
    let ch = canvas.height as f64;
    let scale = (cw / src_w).min(ch / src_h);
    let w = src_w * scale;
    let h = src_h * scale;
    Rect::centered_at(cw / 2.0, ch / 2.0, w, h)
}

/// Fixed-size handle rectangles on the four edge midpoints of a draw
/// rectangle, in the order top, bottom, left, right.
pub fn handle_rects(rect: Rect) -> [Rect; 4] {
    let (cx, cy) = rect.center();
    [
        Rect::centered_at(cx, rect.y, HANDLE_LENGTH, HANDLE_THICKNESS),
        Rect::centered_at(cx, rect.bottom(), HANDLE_LENGTH, HANDLE_THICKNESS),
        Rect::centered_at(rect.x, cy, HANDLE_THICKNESS, HANDLE_LENGTH),
        Rect::centered_at(rect.right(), cy, HANDLE_THICKNESS, HANDLE_LENGTH),
    ]
}

/// Hit-test a canvas-space point against a layer's draw rectangle.
///
/// Handles win over the inside-rect move test; a miss on everything
/// grabs nothing.
pub fn hit_test(rect: Rect, px: f64, py: f64) -> Option<GrabTarget> {
    let [top, bottom, left, right] = handle_rects(rect);
    if top.contains(px, py) {
        Some(GrabTarget::Top)
    } else if bottom.contains(px, py) {
        Some(GrabTarget::Bottom)
    } else if left.contains(px, py) {
        Some(GrabTarget::Left)
    } else if right.contains(px, py) {
        Some(GrabTarget::Right)
    } else if rect.contains(px, py) {
        Some(GrabTarget::Move)
    } else {
        None
    }
}

/// Apply a one-edge crop delta and re-derive the center so the opposite
/// edge stays visually fixed on canvas.
///
/// `delta_pct` is the crop change in percent of the base draw dimension
/// on the dragged axis (positive = more crop). The anchoring is solved
/// with the new crop value, and crop + position land in one transform.
pub fn crop_with_anchor(
    layer: &Layer,
    canvas: CanvasSize,
    target: GrabTarget,
    delta_pct: f64,
) -> Transform {
    let t = layer.transform;
    let (base_w, base_h) = base_draw_size(layer, canvas);
    let rect = draw_rect(layer, canvas);
    let cw = canvas.width as f64;
    let ch = canvas.height as f64;

    match target {
        GrabTarget::Left => {
            let next = t.with_crop_left(t.crop_left + delta_pct);
            let new_w = base_w * next.visible_x_fraction();
            // Right edge stays put; new center backs off by half the new width.
            let cx = rect.right() - new_w / 2.0;
            next.with_position(cx / cw * 100.0, next.y)
        }
        GrabTarget::Right => {
            let next = t.with_crop_right(t.crop_right + delta_pct);
            let new_w = base_w * next.visible_x_fraction();
            let cx = rect.x + new_w / 2.0;
            next.with_position(cx / cw * 100.0, next.y)
        }
        GrabTarget::Top => {
            let next = t.with_crop_top(t.crop_top + delta_pct);
            let new_h = base_h * next.visible_y_fraction();
            let cy = rect.bottom() - new_h / 2.0;
            next.with_position(next.x, cy / ch * 100.0)
        }
        GrabTarget::Bottom => {
            let next = t.with_crop_bottom(t.crop_bottom + delta_pct);
            let new_h = base_h * next.visible_y_fraction();
            let cy = rect.y + new_h / 2.0;
            next.with_position(next.x, cy / ch * 100.0)
        }
        GrabTarget::Move => t,
    }
}
