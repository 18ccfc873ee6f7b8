//! The per-tick composite algorithm.
//!
//! Every tick: clear, camera background (cover-fitted), visible layers
//! in render order, selection overlay last. All geometry is recomputed
//! from the stage on every call; nothing persists across ticks except
//! the target surface, so an edit applied between two ticks is always
//! visible on the next one.

use std::collections::HashMap;

use layercast_scene::{
    cover_fit, crop_rect_in, handle_rects, presentation_rect, CanvasSize, LayerId, Rect, Stage,
};

use crate::source::LiveSource;
use crate::surface::{Surface, SurfaceFrame};

/// Highlight color for the selection border and handles.
pub const SELECTION_COLOR: [u8; 4] = [255, 196, 0, 255];
/// Selection border thickness in canvas pixels.
pub const BORDER_THICKNESS: f64 = 6.0;

/// The live sources the compositor reads each tick: at most one camera
/// background plus one source per visible layer.
#[derive(Default)]
pub struct SourceSet {
    camera: Option<Box<dyn LiveSource>>,
    layers: HashMap<LayerId, Box<dyn LiveSource>>,
}

impl SourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the camera background source.
    pub fn attach_camera(&mut self, source: Box<dyn LiveSource>) {
        self.camera = Some(source);
    }

    /// Remove and return the camera source. Dropping the returned
    /// handle releases the hardware.
    pub fn detach_camera(&mut self) -> Option<Box<dyn LiveSource>> {
        self.camera.take()
    }

    pub fn attach_layer(&mut self, id: LayerId, source: Box<dyn LiveSource>) {
        self.layers.insert(id, source);
    }

    /// Remove a layer's source, e.g. when the asset is deleted.
    pub fn detach_layer(&mut self, id: LayerId) -> Option<Box<dyn LiveSource>> {
        self.layers.remove(&id)
    }

    fn camera_mut(&mut self) -> Option<&mut (dyn LiveSource + 'static)> {
        self.camera.as_deref_mut()
    }

    fn layer_mut(&mut self, id: LayerId) -> Option<&mut (dyn LiveSource + 'static)> {
        self.layers.get_mut(&id).map(|s| s.as_mut())
    }
}

/// Renders the composite frame state onto a fixed-resolution surface.
pub struct Compositor {
    canvas: CanvasSize,
    surface: Surface,
}

impl Compositor {
    pub fn new(canvas: CanvasSize) -> Self {
        Self {
            canvas,
            surface: Surface::new(canvas.width, canvas.height),
        }
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Composite one frame and publish a snapshot of it.
    ///
    /// Sources that are not ready this tick are skipped silently and
    /// reappear once frames arrive.
    pub fn render(&mut self, stage: &Stage, sources: &mut SourceSet) -> SurfaceFrame {
        self.surface.clear();

        if stage.camera_active {
            if let Some(camera) = sources.camera_mut() {
                if let Some(frame) = camera.poll_frame() {
                    let src = Rect::new(0.0, 0.0, frame.width as f64, frame.height as f64);
                    let dst = cover_fit(frame.width as f64, frame.height as f64, self.canvas);
                    self.surface.blit(&frame, src, dst);
                }
            }
        }

        for id in stage.render_order() {
            let Some(layer) = stage.layer(id) else {
                continue;
            };
            let Some(source) = sources.layer_mut(id) else {
                continue;
            };
            let Some(frame) = source.poll_frame() else {
                continue;
            };

            let selected = stage.selected() == Some(id);
            let full_frame = selected && stage.full_frame;
            let src = crop_rect_in(&layer.transform, frame.width as f64, frame.height as f64);
            let dst = presentation_rect(layer, self.canvas, full_frame);
            self.surface.blit(&frame, src, dst);

            if selected && !stage.full_frame && !stage.locked {
                self.surface
                    .stroke_rect(dst, BORDER_THICKNESS, SELECTION_COLOR);
                for handle in handle_rects(dst) {
                    self.surface.fill_rect(handle, SELECTION_COLOR);
                }
            }
        }

        self.surface.publish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ImageAssetSource, SourceFrame};
    use layercast_scene::{draw_rect, LayerKind, Transform};

    /// A source that never becomes ready.
    struct NeverReady;

    impl LiveSource for NeverReady {
        fn poll_frame(&mut self) -> Option<SourceFrame> {
            None
        }
        fn natural_size(&self) -> Option<(u32, u32)> {
            None
        }
        fn name(&self) -> &str {
            "never-ready"
        }
    }

    fn solid(name: &str, width: u32, height: u32, color: [u8; 4]) -> Box<ImageAssetSource> {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width * height {
            data.extend_from_slice(&color);
        }
        Box::new(ImageAssetSource::from_rgba(name, width, height, data))
    }

    fn canvas() -> CanvasSize {
        CanvasSize::default()
    }

    #[test]
    fn empty_stage_renders_black() {
        let mut compositor = Compositor::new(canvas());
        let frame = compositor.render(&Stage::new(), &mut SourceSet::new());
        assert_eq!(frame.seq, 1);
        assert_eq!(compositor.surface().pixel(540, 960), [0, 0, 0, 255]);
    }

    #[test]
    fn camera_cover_fills_the_whole_canvas() {
        let mut stage = Stage::new();
        stage.camera_active = true;
        let mut sources = SourceSet::new();
        // Landscape source on the portrait canvas: cover must fill with
        // no letterboxing.
        sources.attach_camera(solid("cam", 1920, 1080, [0, 200, 0, 255]));

        let mut compositor = Compositor::new(canvas());
        compositor.render(&stage, &mut sources);
        assert_eq!(compositor.surface().pixel(0, 0), [0, 200, 0, 255]);
        assert_eq!(compositor.surface().pixel(1079, 1919), [0, 200, 0, 255]);
        assert_eq!(compositor.surface().pixel(540, 960), [0, 200, 0, 255]);
    }

    #[test]
    fn inactive_camera_is_not_drawn() {
        let mut stage = Stage::new();
        stage.camera_active = false;
        let mut sources = SourceSet::new();
        sources.attach_camera(solid("cam", 1920, 1080, [0, 200, 0, 255]));

        let mut compositor = Compositor::new(canvas());
        compositor.render(&stage, &mut sources);
        assert_eq!(compositor.surface().pixel(540, 960), [0, 0, 0, 255]);
    }

    #[test]
    fn not_ready_source_is_skipped_for_the_tick() {
        let mut stage = Stage::new();
        let id = stage.import(LayerKind::Image, 100, 100);
        stage.select(None);
        let mut sources = SourceSet::new();
        sources.attach_layer(id, Box::new(NeverReady));

        let mut compositor = Compositor::new(canvas());
        compositor.render(&stage, &mut sources);
        assert_eq!(compositor.surface().pixel(540, 960), [0, 0, 0, 255]);
    }

    #[test]
    fn selected_layer_is_drawn_topmost() {
        let mut stage = Stage::new();
        let red = stage.import(LayerKind::Image, 1000, 1000);
        let blue = stage.import(LayerKind::Image, 1000, 1000);
        let mut sources = SourceSet::new();
        sources.attach_layer(red, solid("red", 1000, 1000, [255, 0, 0, 255]));
        sources.attach_layer(blue, solid("blue", 1000, 1000, [0, 0, 255, 255]));

        let mut compositor = Compositor::new(canvas());

        // blue was imported last and is selected: it wins the center.
        compositor.render(&stage, &mut sources);
        assert_eq!(compositor.surface().pixel(540, 960), [0, 0, 255, 255]);

        // Selecting red reorders: red now drawn last.
        stage.select(Some(red));
        compositor.render(&stage, &mut sources);
        assert_eq!(compositor.surface().pixel(540, 960), [255, 0, 0, 255]);
    }

    #[test]
    fn selection_overlay_draws_border_and_handles() {
        let mut stage = Stage::new();
        let id = stage.import(LayerKind::Image, 1000, 1000);
        stage
            .layer_mut(id)
            .unwrap()
            .set_transform(Transform::default().with_scale(50.0));
        let mut sources = SourceSet::new();
        sources.attach_layer(id, solid("red", 1000, 1000, [255, 0, 0, 255]));

        let mut compositor = Compositor::new(canvas());
        compositor.render(&stage, &mut sources);

        let rect = draw_rect(stage.layer(id).unwrap(), canvas());
        // Border band just inside the draw rect.
        let bx = (rect.x + 2.0) as u32;
        let by = (rect.y + rect.h / 4.0) as u32;
        assert_eq!(compositor.surface().pixel(bx, by), SELECTION_COLOR);
        // Top-edge handle midpoint.
        let (cx, _) = rect.center();
        assert_eq!(
            compositor.surface().pixel(cx as u32, rect.y as u32),
            SELECTION_COLOR
        );
        // Layer fill still visible in the middle.
        assert_eq!(compositor.surface().pixel(540, 960), [255, 0, 0, 255]);
    }

    #[test]
    fn locked_stage_suppresses_overlay() {
        let mut stage = Stage::new();
        let id = stage.import(LayerKind::Image, 1000, 1000);
        stage
            .layer_mut(id)
            .unwrap()
            .set_transform(Transform::default().with_scale(50.0));
        stage.locked = true;
        let mut sources = SourceSet::new();
        sources.attach_layer(id, solid("red", 1000, 1000, [255, 0, 0, 255]));

        let mut compositor = Compositor::new(canvas());
        compositor.render(&stage, &mut sources);

        let rect = draw_rect(stage.layer(id).unwrap(), canvas());
        let bx = (rect.x + 2.0) as u32;
        let by = (rect.y + rect.h / 4.0) as u32;
        assert_eq!(compositor.surface().pixel(bx, by), [255, 0, 0, 255]);
    }

    #[test]
    fn full_frame_contain_fits_and_suppresses_overlay() {
        let mut stage = Stage::new();
        let id = stage.import(LayerKind::Image, 1000, 1000);
        stage
            .layer_mut(id)
            .unwrap()
            .set_transform(Transform::default().with_scale(50.0).with_position(10.0, 10.0));
        stage.full_frame = true;
        let mut sources = SourceSet::new();
        sources.attach_layer(id, solid("red", 1000, 1000, [255, 0, 0, 255]));

        let mut compositor = Compositor::new(canvas());
        compositor.render(&stage, &mut sources);

        // Contain-fit of a square source: full canvas width, centered
        // vertically, position ignored.
        assert_eq!(compositor.surface().pixel(540, 960), [255, 0, 0, 255]);
        assert_eq!(compositor.surface().pixel(5, 960), [255, 0, 0, 255]);
        assert_eq!(compositor.surface().pixel(540, 100), [0, 0, 0, 255]);
        // No overlay in full-frame mode: edge of the fitted rect keeps
        // the layer color.
        assert_eq!(compositor.surface().pixel(540, 421), [255, 0, 0, 255]);
    }

    #[test]
    fn cropped_layer_samples_the_cropped_region() {
        // Left half red, right half blue; crop the left 50% and the
        // remaining draw should be all blue.
        let mut data = Vec::with_capacity(100 * 100 * 4);
        for _y in 0..100 {
            for x in 0..100 {
                if x < 50 {
                    data.extend_from_slice(&[255, 0, 0, 255]);
                } else {
                    data.extend_from_slice(&[0, 0, 255, 255]);
                }
            }
        }
        let mut stage = Stage::new();
        let id = stage.import(LayerKind::Image, 100, 100);
        stage.layer_mut(id).unwrap().set_transform(
            Transform::default().with_scale(50.0).with_crop_left(50.0),
        );
        stage.select(None);
        let mut sources = SourceSet::new();
        sources.attach_layer(
            id,
            Box::new(ImageAssetSource::from_rgba("split", 100, 100, data)),
        );

        let mut compositor = Compositor::new(canvas());
        compositor.render(&stage, &mut sources);

        let rect = draw_rect(stage.layer(id).unwrap(), canvas());
        let (cx, cy) = rect.center();
        assert_eq!(
            compositor.surface().pixel(cx as u32, cy as u32),
            [0, 0, 255, 255]
        );
        assert_eq!(
            compositor.surface().pixel((rect.x + 5.0) as u32, cy as u32),
            [0, 0, 255, 255]
        );
    }
}
