//! Check system capabilities.

use layercast_capture::probe_report;
use layercast_common::config::AppConfig;
use layercast_compositor::{CameraSource, Compositor, SourceSet, TestPatternSource};
use layercast_scene::{CanvasSize, Stage};

pub fn run() -> anyhow::Result<()> {
    println!("Layercast System Check");
    println!("{}", "=".repeat(50));

    // Composite one frame from a generated pattern.
    let config = AppConfig::load();
    let canvas = CanvasSize {
        width: config.canvas.width,
        height: config.canvas.height,
    };
    let mut stage = Stage::new();
    stage.camera_active = true;
    let mut sources = SourceSet::new();
    sources.attach_camera(Box::new(TestPatternSource::new(1280, 720)));
    let frame = Compositor::new(canvas).render(&stage, &mut sources);
    println!(
        "[OK] Compositor: {}x{} frame rendered (seq {})",
        frame.width, frame.height, frame.seq
    );

    // Camera
    let mut camera = CameraSource::new();
    match camera.acquire() {
        Ok(()) => {
            println!("[OK] Camera: available");
            camera.release();
        }
        Err(e) => println!("[WARN] Camera: {e}"),
    }

    // Recording codecs
    let report = probe_report()?;
    let mut any_codec = false;
    for (codec, elements) in &report {
        let supported = elements.iter().all(|(_, ok)| *ok);
        any_codec |= supported;
        println!(
            "{} Codec {}: {}",
            if supported { "[OK]" } else { "[WARN]" },
            codec.name,
            if supported { "supported" } else { "missing elements" }
        );
    }

    println!();
    if any_codec {
        println!("A recording codec is available. Layercast is ready.");
    } else {
        println!("No recording codec is available; install the GStreamer plugin packages.");
    }

    Ok(())
}
