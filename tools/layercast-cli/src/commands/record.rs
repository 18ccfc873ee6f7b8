//! Composite and record to a file.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use layercast_capture::{
    negotiate, CaptureSession, DirectorySaveSink, GstRecordingPipeline, RecordingOptions,
};
use layercast_common::config::AppConfig;
use layercast_compositor::{
    spawn_render_loop, CameraSource, ImageAssetSource, LiveSource, SourceSet, VideoAssetSource,
};
use layercast_scene::{CanvasSize, LayerKind, Stage, Transform};

#[allow(clippy::too_many_arguments)]
pub async fn run(
    output: Option<PathBuf>,
    images: Vec<PathBuf>,
    videos: Vec<PathBuf>,
    scale: f64,
    position: &str,
    camera: bool,
    mic: bool,
    fps: u32,
    duration: Option<u64>,
) -> anyhow::Result<()> {
    let overlay_transform = parse_overlay_transform(scale, position)?;
    let config = AppConfig::load();
    let canvas = CanvasSize {
        width: config.canvas.width,
        height: config.canvas.height,
    };
    let output_dir = output.unwrap_or_else(|| config.recordings_dir.clone());

    println!("Recording {}x{} @ {fps}fps", canvas.width, canvas.height);
    println!("  Output: {}", output_dir.display());
    println!("  Camera: {camera}");
    println!("  Mic: {mic}");
    println!();

    let mut stage = Stage::new();
    let mut sources = SourceSet::new();
    let mut asset_audio_uri = None;

    if camera {
        let mut camera_source = CameraSource::new();
        match camera_source.acquire() {
            Ok(()) => {
                stage.camera_active = true;
                sources.attach_camera(Box::new(camera_source));
            }
            Err(e) if e.is_capability_failure() => {
                eprintln!("Camera unavailable, compositing without background: {e}");
            }
            Err(e) => return Err(e.into()),
        }
    }

    for path in &images {
        let source = ImageAssetSource::open(path)?;
        let (width, height) = source
            .natural_size()
            .ok_or_else(|| anyhow::anyhow!("Image has no dimensions: {}", path.display()))?;
        let id = stage.import(LayerKind::Image, width, height);
        if let Some(layer) = stage.layer_mut(id) {
            layer.set_transform(overlay_transform);
        }
        sources.attach_layer(id, Box::new(source));
        println!("Imported image {} ({width}x{height})", path.display());
    }

    for path in &videos {
        let source = VideoAssetSource::open(path)?;
        // The last imported video's audio track joins the recording mix.
        asset_audio_uri = Some(source.uri().to_string());
        let (width, height) = source.natural_size().unwrap_or((1920, 1080));
        let id = stage.import(LayerKind::Video, width, height);
        if let Some(layer) = stage.layer_mut(id) {
            layer.set_transform(overlay_transform);
        }
        sources.attach_layer(id, Box::new(source));
        println!("Imported video {} ({width}x{height})", path.display());
    }

    // Recording captures the composite as-is; no selection chrome.
    stage.select(None);
    stage.locked = true;

    let stage = Arc::new(Mutex::new(stage));
    let render = spawn_render_loop(
        Arc::clone(&stage),
        sources,
        canvas,
        config.canvas.render_fps,
    );

    let codec = negotiate()?;
    println!("Codec: {} ({})", codec.name, codec.mime_type);

    let options = RecordingOptions {
        width: canvas.width,
        height: canvas.height,
        fps,
        mic: mic && config.recording.mic,
        asset_audio_uri,
        sample_rate: config.recording.audio_sample_rate,
        chunk_duration_ms: config.recording.chunk_duration_ms,
    };
    let pipeline = Box::new(GstRecordingPipeline::build(&codec, &options)?);

    let mut session = CaptureSession::new();
    session.start(pipeline, codec, render.frames(), fps)?;

    match duration {
        Some(secs) => {
            println!("Recording for {secs}s...");
            tokio::time::sleep(std::time::Duration::from_secs(secs)).await;
        }
        None => {
            println!("Press Ctrl+C to stop recording...");
            tokio::signal::ctrl_c().await?;
            println!();
        }
    }

    let sink = DirectorySaveSink::new(&output_dir);
    if let Some(recording) = session.stop(&sink).await? {
        println!(
            "Saved {} ({:.1}s, {} bytes)",
            output_dir.join(&recording.file_name).display(),
            recording.duration_secs,
            recording.data.len()
        );
    }

    // Recover and drop the sources so the camera is released.
    let _sources = render.join().await?;

    Ok(())
}

/// Parse `--scale` and the "x,y" `--position` flag into a transform.
fn parse_overlay_transform(scale: f64, position: &str) -> anyhow::Result<Transform> {
    let (x, y) = position
        .split_once(',')
        .ok_or_else(|| anyhow::anyhow!("Position must be \"x,y\", got {position:?}"))?;
    let x: f64 = x.trim().parse()?;
    let y: f64 = y.trim().parse()?;
    Ok(Transform::default().with_scale(scale).with_position(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_transform_parses_and_clamps() {
        let t = parse_overlay_transform(50.0, "25, 75").unwrap();
        assert_eq!((t.x, t.y, t.scale), (25.0, 75.0, 50.0));

        let t = parse_overlay_transform(900.0, "-10,150").unwrap();
        assert_eq!((t.x, t.y, t.scale), (0.0, 100.0, 200.0));
    }

    #[test]
    fn bad_position_is_rejected() {
        assert!(parse_overlay_transform(100.0, "fifty").is_err());
        assert!(parse_overlay_transform(100.0, "1,b").is_err());
    }
}
