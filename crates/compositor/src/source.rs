//! Live pixel sources: camera, video asset, still image.
//!
//! Every source answers `poll_frame` with the freshest frame it has, or
//! `None` while it is not yet ready (stream not negotiated, file still
//! decoding). The compositor skips a not-ready source for that tick
//! only; it reappears once frames arrive. Hardware-backed sources have
//! an explicit acquire/release lifecycle with idempotent release.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;

use layercast_common::error::{LayercastError, LayercastResult};

/// One RGBA frame from a live source.
#[derive(Debug, Clone)]
pub struct SourceFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 rows.
    pub data: Arc<Vec<u8>>,
}

impl SourceFrame {
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * 4);
        Self {
            width,
            height,
            data: Arc::new(data),
        }
    }
}

/// A continuously changing pixel source consumed by the compositor.
pub trait LiveSource: Send {
    /// The freshest frame, or `None` while the source is not ready.
    fn poll_frame(&mut self) -> Option<SourceFrame>;

    /// Intrinsic source dimensions, if known yet.
    fn natural_size(&self) -> Option<(u32, u32)>;

    /// Source name for logging.
    fn name(&self) -> &str;
}

fn init_gstreamer() -> LayercastResult<()> {
    static GST_INIT: OnceLock<Result<(), String>> = OnceLock::new();
    let init_res = GST_INIT.get_or_init(|| gst::init().map_err(|e| e.to_string()));
    match init_res {
        Ok(()) => Ok(()),
        Err(e) => Err(LayercastError::compositor(format!(
            "Failed to initialize GStreamer: {e}"
        ))),
    }
}

/// Pull the next decoded sample out of an appsink without blocking.
fn pull_rgba_frame(appsink: &gst_app::AppSink) -> Option<SourceFrame> {
    let sample = appsink.try_pull_sample(gst::ClockTime::ZERO)?;
    let caps = sample.caps()?;
    let s = caps.structure(0)?;
    let width = s.get::<i32>("width").ok()? as u32;
    let height = s.get::<i32>("height").ok()? as u32;
    let buffer = sample.buffer()?;
    let map = buffer.map_readable().ok()?;
    let expected = width as usize * height as usize * 4;
    if map.size() < expected {
        tracing::warn!(width, height, size = map.size(), "Short RGBA buffer; dropping");
        return None;
    }
    Some(SourceFrame::from_rgba(
        width,
        height,
        map.as_slice()[..expected].to_vec(),
    ))
}

/// The live camera background.
///
/// A process-wide singleton by convention: exactly one handle exists and
/// its lifecycle follows the camera toggle, not any layer. `release` is
/// idempotent and stops the hardware immediately.
pub struct CameraSource {
    pipeline: Option<gst::Pipeline>,
    appsink: Option<gst_app::AppSink>,
    last_frame: Option<SourceFrame>,
}

impl CameraSource {
    /// Create an unacquired camera handle.
    pub fn new() -> Self {
        Self {
            pipeline: None,
            appsink: None,
            last_frame: None,
        }
    }

    /// Open the camera device and start streaming.
    ///
    /// Failure is a capability failure (`LayercastError::Hardware`);
    /// the caller reverts the camera toggle and compositing continues
    /// without a background.
    pub fn acquire(&mut self) -> LayercastResult<()> {
        if self.pipeline.is_some() {
            return Ok(());
        }
        init_gstreamer()?;

        // drop=true keeps only the newest frames; the compositor always
        // wants "now", never a backlog.
        let launch = "v4l2src ! videoconvert ! videoscale ! video/x-raw,format=RGBA ! \
                      appsink name=sink max-buffers=2 drop=true sync=false";
        let element = gst::parse::launch(launch)
            .map_err(|e| LayercastError::hardware(format!("Failed to build camera pipeline: {e}")))?;
        let pipeline = element
            .dynamic_cast::<gst::Pipeline>()
            .map_err(|_| LayercastError::hardware("Camera launch did not produce a pipeline"))?;
        let appsink = pipeline
            .by_name("sink")
            .and_then(|e| e.dynamic_cast::<gst_app::AppSink>().ok())
            .ok_or_else(|| LayercastError::hardware("Camera pipeline is missing its appsink"))?;

        pipeline.set_state(gst::State::Playing).map_err(|e| {
            LayercastError::hardware(format!("Failed to start camera (denied or absent): {e:?}"))
        })?;

        tracing::info!("Camera acquired");
        self.pipeline = Some(pipeline);
        self.appsink = Some(appsink);
        Ok(())
    }

    /// Stop the camera and free the hardware. Safe to call repeatedly;
    /// releasing an unacquired camera is a no-op.
    pub fn release(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            if let Err(e) = pipeline.set_state(gst::State::Null) {
                tracing::warn!(error = ?e, "Failed to stop camera pipeline");
            }
            tracing::info!("Camera released");
        }
        self.appsink = None;
        self.last_frame = None;
    }

    pub fn is_acquired(&self) -> bool {
        self.pipeline.is_some()
    }
}

impl Default for CameraSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.release();
    }
}

impl LiveSource for CameraSource {
    fn poll_frame(&mut self) -> Option<SourceFrame> {
        let appsink = self.appsink.as_ref()?;
        if let Some(frame) = pull_rgba_frame(appsink) {
            self.last_frame = Some(frame);
        }
        // Between camera samples the previous frame is still current.
        self.last_frame.clone()
    }

    fn natural_size(&self) -> Option<(u32, u32)> {
        self.last_frame.as_ref().map(|f| (f.width, f.height))
    }

    fn name(&self) -> &str {
        "camera"
    }
}

/// A decoded video asset playing on a layer.
#[derive(Debug)]
pub struct VideoAssetSource {
    uri: String,
    pipeline: Option<gst::Pipeline>,
    appsink: Option<gst_app::AppSink>,
    last_frame: Option<SourceFrame>,
}

impl VideoAssetSource {
    /// Open a local video file and start decoding. Frames are not
    /// available until the decoder has negotiated; until then
    /// `poll_frame` returns `None` and the layer is skipped.
    pub fn open(path: &Path) -> LayercastResult<Self> {
        if !path.exists() {
            return Err(LayercastError::FileNotFound {
                path: PathBuf::from(path),
            });
        }
        init_gstreamer()?;

        let uri = gst::glib::filename_to_uri(path, None)
            .map_err(|e| LayercastError::compositor(format!("Bad video path: {e}")))?
            .to_string();

        let launch = format!(
            "uridecodebin uri=\"{uri}\" ! videoconvert ! video/x-raw,format=RGBA ! \
             appsink name=sink max-buffers=2 drop=true sync=true"
        );
        let element = gst::parse::launch(&launch)
            .map_err(|e| LayercastError::compositor(format!("Failed to build video pipeline: {e}")))?;
        let pipeline = element
            .dynamic_cast::<gst::Pipeline>()
            .map_err(|_| LayercastError::compositor("Video launch did not produce a pipeline"))?;
        let appsink = pipeline
            .by_name("sink")
            .and_then(|e| e.dynamic_cast::<gst_app::AppSink>().ok())
            .ok_or_else(|| LayercastError::compositor("Video pipeline is missing its appsink"))?;

        pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| LayercastError::compositor(format!("Failed to start video decode: {e:?}")))?;

        tracing::info!(%uri, "Video asset opened");
        Ok(Self {
            uri,
            pipeline: Some(pipeline),
            appsink: Some(appsink),
            last_frame: None,
        })
    }

    /// The asset's URI, used by the capture pipeline to tap the asset's
    /// decoded audio into the mix.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Stop decoding and release the media resources. Idempotent.
    pub fn release(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            if let Err(e) = pipeline.set_state(gst::State::Null) {
                tracing::warn!(error = ?e, "Failed to stop video pipeline");
            }
        }
        self.appsink = None;
        self.last_frame = None;
    }
}

impl Drop for VideoAssetSource {
    fn drop(&mut self) {
        self.release();
    }
}

impl VideoAssetSource {
    /// Loop playback: on EOS, seek back to the start.
    fn rewind_on_eos(&self) {
        let Some(pipeline) = self.pipeline.as_ref() else {
            return;
        };
        let Some(bus) = pipeline.bus() else {
            return;
        };
        while let Some(msg) = bus.pop() {
            if let gst::MessageView::Eos(_) = msg.view() {
                if let Err(e) = pipeline.seek_simple(
                    gst::SeekFlags::FLUSH | gst::SeekFlags::KEY_UNIT,
                    gst::ClockTime::ZERO,
                ) {
                    tracing::warn!(error = %e, "Video loop seek failed");
                }
            }
        }
    }
}

impl LiveSource for VideoAssetSource {
    fn poll_frame(&mut self) -> Option<SourceFrame> {
        self.rewind_on_eos();
        let appsink = self.appsink.as_ref()?;
        if let Some(frame) = pull_rgba_frame(appsink) {
            self.last_frame = Some(frame);
        }
        self.last_frame.clone()
    }

    fn natural_size(&self) -> Option<(u32, u32)> {
        self.last_frame.as_ref().map(|f| (f.width, f.height))
    }

    fn name(&self) -> &str {
        "video-asset"
    }
}

/// A still image asset, decoded once and always ready afterwards.
pub struct ImageAssetSource {
    name: String,
    frame: SourceFrame,
}

impl ImageAssetSource {
    /// Decode an image file into an RGBA frame.
    pub fn open(path: &Path) -> LayercastResult<Self> {
        let decoded = image::open(path)
            .map_err(|e| LayercastError::compositor(format!("Failed to decode image: {e}")))?
            .to_rgba8();
        let (width, height) = decoded.dimensions();
        tracing::info!(path = %path.display(), width, height, "Image asset decoded");
        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string()),
            frame: SourceFrame::from_rgba(width, height, decoded.into_raw()),
        })
    }

    /// Wrap an already-decoded RGBA buffer (tests, generated patterns).
    pub fn from_rgba(name: impl Into<String>, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            frame: SourceFrame::from_rgba(width, height, data),
        }
    }
}

impl LiveSource for ImageAssetSource {
    fn poll_frame(&mut self) -> Option<SourceFrame> {
        Some(self.frame.clone())
    }

    fn natural_size(&self) -> Option<(u32, u32)> {
        Some((self.frame.width, self.frame.height))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A generated gradient test pattern, for demos and capability checks
/// when no camera is attached.
pub struct TestPatternSource {
    frame: SourceFrame,
    tick: u64,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                data.push((x * 255 / width.max(1)) as u8);
                data.push((y * 255 / height.max(1)) as u8);
                data.push(96);
                data.push(255);
            }
        }
        Self {
            frame: SourceFrame::from_rgba(width, height, data),
            tick: 0,
        }
    }
}

impl LiveSource for TestPatternSource {
    fn poll_frame(&mut self) -> Option<SourceFrame> {
        self.tick += 1;
        Some(self.frame.clone())
    }

    fn natural_size(&self) -> Option<(u32, u32)> {
        Some((self.frame.width, self.frame.height))
    }

    fn name(&self) -> &str {
        "test-pattern"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_source_is_always_ready() {
        let mut src = ImageAssetSource::from_rgba("solid", 2, 2, vec![7u8; 16]);
        assert!(src.poll_frame().is_some());
        assert_eq!(src.natural_size(), Some((2, 2)));
    }

    #[test]
    fn unacquired_camera_is_not_ready() {
        let mut camera = CameraSource::new();
        assert!(camera.poll_frame().is_none());
        assert!(!camera.is_acquired());
    }

    #[test]
    fn camera_release_is_idempotent() {
        let mut camera = CameraSource::new();
        camera.release();
        camera.release();
        assert!(!camera.is_acquired());
    }

    #[test]
    fn missing_video_file_is_an_error() {
        let err = VideoAssetSource::open(Path::new("/nonexistent/clip.mp4")).unwrap_err();
        assert!(matches!(err, LayercastError::FileNotFound { .. }));
    }

    #[test]
    fn test_pattern_has_gradient() {
        let mut src = TestPatternSource::new(4, 4);
        let frame = src.poll_frame().unwrap();
        assert!(frame.data[0] < frame.data[3 * 4]); // red ramps left to right
    }
}
