//! Replay a gesture script against a stage.

use std::path::PathBuf;

use layercast_common::config::AppConfig;
use layercast_gesture::{parse_pointer_script, CanvasMetrics, GestureController};
use layercast_scene::{CanvasSize, LayerKind, Stage};

pub fn run(
    script: PathBuf,
    width: u32,
    height: u32,
    display_width: Option<f64>,
    display_height: Option<f64>,
) -> anyhow::Result<()> {
    let config = AppConfig::load();
    let canvas = CanvasSize {
        width: config.canvas.width,
        height: config.canvas.height,
    };
    let metrics = match (display_width, display_height) {
        (Some(w), Some(h)) => CanvasMetrics::new(w, h),
        _ => CanvasMetrics::identity(canvas),
    };

    let content = std::fs::read_to_string(&script)?;
    let events = parse_pointer_script(&content)?;
    println!("Replaying {} events from {}", events.len(), script.display());

    let mut stage = Stage::new();
    let id = stage.import(LayerKind::Image, width, height);
    let mut controller = GestureController::new(canvas);

    for event in &events {
        controller.handle(&mut stage, metrics, event);
    }

    let layer = stage
        .layer(id)
        .ok_or_else(|| anyhow::anyhow!("Simulated layer disappeared"))?;
    println!("{}", serde_json::to_string_pretty(&layer.transform)?);

    Ok(())
}
