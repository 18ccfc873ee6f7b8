//! The continuous fixed-rate render loop.
//!
//! Owns the compositor and the source set for the lifetime of the loop
//! and republishes every composited frame on a watch channel, so the
//! display consumer and the capture pipeline each see the latest frame
//! without backpressure on the renderer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use layercast_common::{LayercastError, LayercastResult};
use layercast_scene::{CanvasSize, Stage};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::compositor::{Compositor, SourceSet};
use crate::surface::SurfaceFrame;

/// Handle to a running render loop. Dropping it without calling
/// [`RenderLoopHandle::join`] leaves the loop running detached.
pub struct RenderLoopHandle {
    stop: Arc<AtomicBool>,
    frames: watch::Receiver<SurfaceFrame>,
    task: JoinHandle<SourceSet>,
}

impl RenderLoopHandle {
    /// A receiver that always holds the most recently composited frame.
    pub fn frames(&self) -> watch::Receiver<SurfaceFrame> {
        self.frames.clone()
    }

    /// Request the loop to stop after the current tick.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Stop the loop and get the source set back, so sources can be
    /// reattached to a new loop or released.
    pub async fn join(self) -> LayercastResult<SourceSet> {
        self.stop.store(true, Ordering::SeqCst);
        self.task
            .await
            .map_err(|e| LayercastError::compositor(format!("render loop task failed: {e}")))
    }
}

/// Spawn the render loop at `fps` ticks per second.
///
/// Each tick takes a snapshot of the shared stage, composites it against
/// the current source frames and publishes the result. Ticks the runtime
/// could not schedule in time are skipped rather than bursted.
pub fn spawn_render_loop(
    stage: Arc<Mutex<Stage>>,
    mut sources: SourceSet,
    canvas: CanvasSize,
    fps: u32,
) -> RenderLoopHandle {
    let fps = fps.max(1);
    let stop = Arc::new(AtomicBool::new(false));
    let (tx, frames) = watch::channel(SurfaceFrame::black(canvas.width, canvas.height));

    let stop_flag = Arc::clone(&stop);
    let task = tokio::spawn(async move {
        let mut compositor = Compositor::new(canvas);
        let mut interval = tokio::time::interval(Duration::from_nanos(1_000_000_000 / fps as u64));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(fps, width = canvas.width, height = canvas.height, "render loop started");

        while !stop_flag.load(Ordering::SeqCst) {
            interval.tick().await;
            if stop_flag.load(Ordering::SeqCst) {
                break;
            }
            // Snapshot under the lock, composite outside it.
            let snapshot = match stage.lock() {
                Ok(guard) => guard.clone(),
                Err(_) => break,
            };
            let frame = compositor.render(&snapshot, &mut sources);
            // Send fails only when every receiver is gone; keep
            // rendering anyway so a late subscriber picks up.
            let _ = tx.send(frame);
        }

        debug!("render loop stopped");
        sources
    });

    RenderLoopHandle { stop, frames, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ImageAssetSource;
    use layercast_scene::LayerKind;

    fn solid_source(width: u32, height: u32, color: [u8; 4]) -> Box<ImageAssetSource> {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width * height {
            data.extend_from_slice(&color);
        }
        Box::new(ImageAssetSource::from_rgba("solid", width, height, data))
    }

    #[tokio::test]
    async fn loop_publishes_frames_and_returns_sources() {
        let mut stage = Stage::new();
        let id = stage.import(LayerKind::Image, 100, 100);
        stage.select(None);
        let stage = Arc::new(Mutex::new(stage));

        let mut sources = SourceSet::new();
        sources.attach_layer(id, solid_source(100, 100, [255, 0, 0, 255]));

        let canvas = CanvasSize::default();
        let handle = spawn_render_loop(Arc::clone(&stage), sources, canvas, 120);

        let mut frames = handle.frames();
        // Seed frame is seq 0; wait for a real composite.
        frames
            .wait_for(|f| f.seq >= 1)
            .await
            .map(|_| ())
            .unwrap();

        let frame = frames.borrow().clone();
        assert_eq!(frame.width, canvas.width);
        // Center of the canvas is inside the default layer rect.
        let i = (960 * canvas.width as usize + 540) * 4;
        assert_eq!(&frame.data[i..i + 4], &[255, 0, 0, 255]);

        let mut sources = handle.join().await.unwrap();
        assert!(sources.detach_layer(id).is_some());
    }

    #[tokio::test]
    async fn stage_edits_show_up_in_later_frames() {
        let mut initial = Stage::new();
        let id = initial.import(LayerKind::Image, 100, 100);
        initial.select(None);
        let stage = Arc::new(Mutex::new(initial));

        let mut sources = SourceSet::new();
        sources.attach_layer(id, solid_source(100, 100, [0, 0, 255, 255]));

        let canvas = CanvasSize::default();
        let handle = spawn_render_loop(Arc::clone(&stage), sources, canvas, 120);
        let mut frames = handle.frames();
        frames.wait_for(|f| f.seq >= 1).await.map(|_| ()).unwrap();

        // Hide the layer; subsequent frames must be black at center.
        let seen = frames.borrow().seq;
        stage.lock().unwrap().delete(id);
        frames.wait_for(|f| f.seq > seen + 1).await.map(|_| ()).unwrap();

        let frame = frames.borrow().clone();
        let i = (960 * canvas.width as usize + 540) * 4;
        assert_eq!(&frame.data[i..i + 4], &[0, 0, 0, 255]);

        handle.join().await.unwrap();
    }
}
