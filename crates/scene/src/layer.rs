//! Layers: one importable asset plus its transform.

use serde::{Deserialize, Serialize};

use crate::transform::Transform;

/// Stable identity for a layer. Re-importing an asset produces a new id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LayerId(pub u64);

/// What kind of media the layer's source is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Image,
    Video,
}

/// One imported asset and its placement on the canvas.
///
/// `natural_width`/`natural_height` are the intrinsic source pixel
/// dimensions, fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: LayerId,
    pub kind: LayerKind,
    pub natural_width: u32,
    pub natural_height: u32,
    pub transform: Transform,
}

impl Layer {
    /// Create a layer with the default (centered, uncropped) transform.
    pub fn new(id: LayerId, kind: LayerKind, natural_width: u32, natural_height: u32) -> Self {
        Self {
            id,
            kind,
            natural_width: natural_width.max(1),
            natural_height: natural_height.max(1),
            transform: Transform::default(),
        }
    }

    /// Intrinsic height/width ratio of the uncropped source.
    pub fn aspect(&self) -> f64 {
        self.natural_height as f64 / self.natural_width as f64
    }

    /// Replace the transform with an already-clamped copy.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform.clamped();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_layer_defaults() {
        let layer = Layer::new(LayerId(1), LayerKind::Image, 1000, 500);
        assert_eq!(layer.transform, Transform::default());
        assert!((layer.aspect() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn zero_dimensions_are_pinned_to_one() {
        let layer = Layer::new(LayerId(2), LayerKind::Video, 0, 0);
        assert_eq!(layer.natural_width, 1);
        assert_eq!(layer.natural_height, 1);
    }

    #[test]
    fn layer_json_roundtrip() {
        let layer = Layer::new(LayerId(7), LayerKind::Video, 1920, 1080);
        let json = serde_json::to_string(&layer).unwrap();
        let parsed: Layer = serde_json::from_str(&json).unwrap();
        assert_eq!(layer, parsed);
        assert!(json.contains("\"kind\":\"video\""));
    }

    #[test]
    fn set_transform_clamps() {
        let mut layer = Layer::new(LayerId(3), LayerKind::Image, 100, 100);
        layer.set_transform(Transform {
            scale: 1000.0,
            ..Transform::default()
        });
        assert_eq!(layer.transform.scale, crate::transform::SCALE_MAX);
    }
}
