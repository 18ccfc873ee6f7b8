//! Layer placement and crop parameters.
//!
//! All fields are percentages. Position is relative to the canvas,
//! scale to the canvas width, crops to the source dimensions. The type
//! is a plain `Copy` value: edits build a new value and clamp it, so
//! gesture code can feed unbounded deltas without validation of its own.

use serde::{Deserialize, Serialize};

/// Minimum layer scale (percent of canvas width).
pub const SCALE_MIN: f64 = 10.0;
/// Maximum layer scale (percent of canvas width).
pub const SCALE_MAX: f64 = 200.0;
/// Maximum crop per edge (percent of the source dimension).
pub const CROP_MAX: f64 = 90.0;
/// Maximum combined crop for a pair of opposing edges (percent).
///
/// Opposing crops must leave a visible strip on each axis, so every
/// clamp output satisfies `crop_left + crop_right <= CROP_SUM_MAX`
/// (and the same for top/bottom).
pub const CROP_SUM_MAX: f64 = 99.0;

/// How a layer's source rectangle maps onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Center X as percent of canvas width `[0, 100]`.
    pub x: f64,
    /// Center Y as percent of canvas height `[0, 100]`.
    pub y: f64,
    /// Layer width as percent of canvas width `[10, 200]`.
    pub scale: f64,
    /// Percent trimmed from the top source edge `[0, 90]`.
    pub crop_top: f64,
    /// Percent trimmed from the bottom source edge `[0, 90]`.
    pub crop_bottom: f64,
    /// Percent trimmed from the left source edge `[0, 90]`.
    pub crop_left: f64,
    /// Percent trimmed from the right source edge `[0, 90]`.
    pub crop_right: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 50.0,
            y: 50.0,
            scale: 100.0,
            crop_top: 0.0,
            crop_bottom: 0.0,
            crop_left: 0.0,
            crop_right: 0.0,
        }
    }
}

impl Transform {
    /// Return a copy with every field clamped into its valid range.
    ///
    /// Never fails: out-of-range input is silently clamped, not rejected.
    /// When opposing crops together exceed [`CROP_SUM_MAX`], the right
    /// and bottom edges yield; the `with_crop_*` setters cap the edited
    /// edge instead.
    pub fn clamped(self) -> Self {
        let crop_top = self.crop_top.clamp(0.0, CROP_MAX);
        let crop_bottom = self
            .crop_bottom
            .clamp(0.0, CROP_MAX.min(CROP_SUM_MAX - crop_top));
        let crop_left = self.crop_left.clamp(0.0, CROP_MAX);
        let crop_right = self
            .crop_right
            .clamp(0.0, CROP_MAX.min(CROP_SUM_MAX - crop_left));
        Self {
            x: self.x.clamp(0.0, 100.0),
            y: self.y.clamp(0.0, 100.0),
            scale: self.scale.clamp(SCALE_MIN, SCALE_MAX),
            crop_top,
            crop_bottom,
            crop_left,
            crop_right,
        }
    }

    /// Copy with a new center position, clamped.
    pub fn with_position(self, x: f64, y: f64) -> Self {
        Self { x, y, ..self }.clamped()
    }

    /// Copy with a new scale, clamped.
    pub fn with_scale(self, scale: f64) -> Self {
        Self { scale, ..self }.clamped()
    }

    /// Copy with one crop edge replaced, clamped. The edited edge gives
    /// way when the pair would exceed [`CROP_SUM_MAX`].
    pub fn with_crop_top(self, crop_top: f64) -> Self {
        let crop_top = crop_top.min(CROP_SUM_MAX - self.crop_bottom.clamp(0.0, CROP_MAX));
        Self { crop_top, ..self }.clamped()
    }

    pub fn with_crop_bottom(self, crop_bottom: f64) -> Self {
        Self {
            crop_bottom,
            ..self
        }
        .clamped()
    }

    pub fn with_crop_left(self, crop_left: f64) -> Self {
        let crop_left = crop_left.min(CROP_SUM_MAX - self.crop_right.clamp(0.0, CROP_MAX));
        Self { crop_left, ..self }.clamped()
    }

    pub fn with_crop_right(self, crop_right: f64) -> Self {
        Self { crop_right, ..self }.clamped()
    }

    /// Fraction of the source width that survives the horizontal crops.
    pub fn visible_x_fraction(&self) -> f64 {
        1.0 - (self.crop_left + self.crop_right) / 100.0
    }

    /// Fraction of the source height that survives the vertical crops.
    pub fn visible_y_fraction(&self) -> f64 {
        1.0 - (self.crop_top + self.crop_bottom) / 100.0
    }

    /// Whether any crop edge is non-zero.
    pub fn is_cropped(&self) -> bool {
        self.crop_top > 0.0
            || self.crop_bottom > 0.0
            || self.crop_left > 0.0
            || self.crop_right > 0.0
    }
}
