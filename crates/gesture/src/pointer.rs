//! Pointer/touch event types and coordinate mapping.
//!
//! Events arrive in display coordinates from whatever surface shows the
//! canvas; `CanvasMetrics` converts them into canvas-resolution pixels.
//! Events serialize to JSONL so gesture sequences can be scripted and
//! replayed (see the `simulate` CLI command).

use serde::{Deserialize, Serialize};

use layercast_scene::CanvasSize;

/// One touch point in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerPoint {
    pub x: f64,
    pub y: f64,
}

impl PointerPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &PointerPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Phase of a pointer sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerPhase {
    Start,
    Move,
    End,
}

/// A single pointer/touch event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub points: Vec<PointerPoint>,
}

impl PointerEvent {
    pub fn start(points: Vec<PointerPoint>) -> Self {
        Self {
            phase: PointerPhase::Start,
            points,
        }
    }

    pub fn moved(points: Vec<PointerPoint>) -> Self {
        Self {
            phase: PointerPhase::Move,
            points,
        }
    }

    pub fn end() -> Self {
        Self {
            phase: PointerPhase::End,
            points: Vec::new(),
        }
    }
}

/// On-screen size of the canvas element, for display-to-canvas mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasMetrics {
    pub display_width: f64,
    pub display_height: f64,
}

impl CanvasMetrics {
    pub fn new(display_width: f64, display_height: f64) -> Self {
        Self {
            display_width: display_width.max(1.0),
            display_height: display_height.max(1.0),
        }
    }

    /// Map a display-space point into canvas pixel coordinates.
    pub fn to_canvas(&self, canvas: CanvasSize, point: PointerPoint) -> PointerPoint {
        PointerPoint {
            x: point.x * canvas.width as f64 / self.display_width,
            y: point.y * canvas.height as f64 / self.display_height,
        }
    }

    /// Metrics for a display that matches the canvas 1:1.
    pub fn identity(canvas: CanvasSize) -> Self {
        Self {
            display_width: canvas.width as f64,
            display_height: canvas.height as f64,
        }
    }
}

/// Parse pointer events from JSONL content (one JSON object per line).
pub fn parse_pointer_script(jsonl: &str) -> Result<Vec<PointerEvent>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize pointer events to JSONL format.
pub fn serialize_pointer_script(events: &[PointerEvent]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for event in events {
        output.push_str(&serde_json::to_string(event)?);
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance() {
        let a = PointerPoint::new(0.0, 0.0);
        let b = PointerPoint::new(3.0, 4.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn display_to_canvas_scaling() {
        // A 270x480 on-screen element showing the 1080x1920 canvas maps
        // with a factor of 4 on both axes.
        let metrics = CanvasMetrics::new(270.0, 480.0);
        let p = metrics.to_canvas(CanvasSize::default(), PointerPoint::new(100.0, 50.0));
        assert!((p.x - 400.0).abs() < 1e-9);
        assert!((p.y - 200.0).abs() < 1e-9);
    }

    #[test]
    fn zero_display_size_does_not_divide_by_zero() {
        let metrics = CanvasMetrics::new(0.0, 0.0);
        let p = metrics.to_canvas(CanvasSize::default(), PointerPoint::new(1.0, 1.0));
        assert!(p.x.is_finite() && p.y.is_finite());
    }

    #[test]
    fn script_jsonl_roundtrip() {
        let events = vec![
            PointerEvent::start(vec![PointerPoint::new(10.0, 20.0)]),
            PointerEvent::moved(vec![PointerPoint::new(15.0, 20.0)]),
            PointerEvent::end(),
        ];
        let jsonl = serialize_pointer_script(&events).unwrap();
        let parsed = parse_pointer_script(&jsonl).unwrap();
        assert_eq!(events, parsed);
    }

    #[test]
    fn script_skips_comments_and_blanks() {
        let jsonl = "# gesture script\n\n{\"phase\":\"end\",\"points\":[]}\n";
        let parsed = parse_pointer_script(jsonl).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].phase, PointerPhase::End);
    }
}
