//! The composite frame state: which layers are visible, which is
//! selected, and the presentation flags read by the compositor each tick.

use serde::{Deserialize, Serialize};

use crate::layer::{Layer, LayerId, LayerKind};

/// How many images may be visible at once.
pub const MAX_VISIBLE_IMAGES: usize = 2;
/// How many videos may be visible at once.
pub const MAX_VISIBLE_VIDEOS: usize = 1;

/// Process-wide composite frame state.
///
/// The compositor re-reads this on every tick; nothing derived from it
/// is cached across ticks, so an edit applied between two ticks is
/// always visible on the next one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stage {
    layers: Vec<Layer>,
    /// Visible layer ids in insertion order.
    visible: Vec<LayerId>,
    /// At most one selected layer.
    selected: Option<LayerId>,
    /// Full-frame presentation override for the selected layer.
    pub full_frame: bool,
    /// Editing lock; gestures and the selection overlay are suppressed.
    pub locked: bool,
    /// Whether the live camera background is toggled on.
    pub camera_active: bool,
    next_id: u64,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Import a new layer, make it visible and selected.
    ///
    /// Visibility policy: at most [`MAX_VISIBLE_VIDEOS`] video and
    /// [`MAX_VISIBLE_IMAGES`] images. Importing past the limit evicts
    /// the oldest visible layer of the same kind.
    pub fn import(&mut self, kind: LayerKind, natural_width: u32, natural_height: u32) -> LayerId {
        self.next_id += 1;
        let id = LayerId(self.next_id);
        self.layers
            .push(Layer::new(id, kind, natural_width, natural_height));

        let limit = match kind {
            LayerKind::Image => MAX_VISIBLE_IMAGES,
            LayerKind::Video => MAX_VISIBLE_VIDEOS,
        };
        while self.visible_count_of(kind) >= limit {
            let oldest = self
                .visible
                .iter()
                .copied()
                .find(|vid| self.layer(*vid).map(|l| l.kind) == Some(kind));
            match oldest {
                Some(evict) => self.hide(evict),
                None => break,
            }
        }

        self.visible.push(id);
        self.selected = Some(id);
        tracing::debug!(?id, ?kind, natural_width, natural_height, "Layer imported");
        id
    }

    /// Remove a layer entirely. Clears visibility and selection for it.
    pub fn delete(&mut self, id: LayerId) {
        self.layers.retain(|l| l.id != id);
        self.hide(id);
        if self.selected == Some(id) {
            self.selected = None;
        }
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Visible layer ids in insertion order.
    pub fn visible(&self) -> &[LayerId] {
        &self.visible
    }

    pub fn is_visible(&self, id: LayerId) -> bool {
        self.visible.contains(&id)
    }

    pub fn selected(&self) -> Option<LayerId> {
        self.selected
    }

    /// The selected layer, if it exists and is visible.
    pub fn selected_layer(&self) -> Option<&Layer> {
        let id = self.selected?;
        if !self.is_visible(id) {
            return None;
        }
        self.layer(id)
    }

    /// Select a visible layer; selecting a hidden or unknown id clears
    /// the selection.
    pub fn select(&mut self, id: Option<LayerId>) {
        self.selected = id.filter(|id| self.is_visible(*id));
    }

    fn hide(&mut self, id: LayerId) {
        self.visible.retain(|vid| *vid != id);
    }

    fn visible_count_of(&self, kind: LayerKind) -> usize {
        self.visible
            .iter()
            .filter(|vid| self.layer(**vid).map(|l| l.kind) == Some(kind))
            .count()
    }

    /// Rendering order for the compositor: every visible non-selected
    /// layer in insertion order, then the selected layer last so its
    /// overlay is topmost. A stable partition, not a sort.
    pub fn render_order(&self) -> Vec<LayerId> {
        let mut order: Vec<LayerId> = self
            .visible
            .iter()
            .copied()
            .filter(|id| Some(*id) != self.selected)
            .collect();
        if let Some(sel) = self.selected {
            if self.is_visible(sel) {
                order.push(sel);
            }
        }
        order
    }
}
