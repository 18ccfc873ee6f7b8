//! The gesture state machine.
//!
//! One active pointer sequence at a time:
//! `Idle -> {grab(move|top|bottom|left|right) | pinch} -> Idle`.
//! Gestures are accepted only while exactly one layer is selected, the
//! view is unlocked, and full-frame mode is off; everything else is
//! silently ignored, including moves whose selection changed mid-drag.

use layercast_scene::{
    base_draw_size, crop_with_anchor, draw_rect, hit_test, CanvasSize, GrabTarget, LayerId, Stage,
};

use crate::pointer::{CanvasMetrics, PointerEvent, PointerPhase, PointerPoint};

/// Internal controller state between events.
#[derive(Debug, Clone, Copy, PartialEq)]
enum GestureState {
    Idle,
    /// Single-touch drag on a grab target.
    Grab {
        layer: LayerId,
        target: GrabTarget,
        /// Previous pointer position in canvas coordinates. Deltas are
        /// measured against this, not the sequence start, so drift does
        /// not compound.
        last: PointerPoint,
    },
    /// Two-touch pinch. Scale follows the ratio of the current spread
    /// to the baseline, so repeated small moves do not accumulate error.
    Pinch {
        layer: LayerId,
        baseline_distance: f64,
        baseline_scale: f64,
    },
}

/// Maps pointer sequences onto transform edits for the selected layer.
#[derive(Debug)]
pub struct GestureController {
    canvas: CanvasSize,
    state: GestureState,
}

impl GestureController {
    pub fn new(canvas: CanvasSize) -> Self {
        Self {
            canvas,
            state: GestureState::Idle,
        }
    }

    /// Whether no gesture is in progress.
    pub fn is_idle(&self) -> bool {
        self.state == GestureState::Idle
    }

    /// The grab target of the active drag, if any.
    pub fn active_target(&self) -> Option<GrabTarget> {
        match self.state {
            GestureState::Grab { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Feed one pointer event, possibly mutating the selected layer's
    /// transform on `stage`.
    pub fn handle(&mut self, stage: &mut Stage, metrics: CanvasMetrics, event: &PointerEvent) {
        match event.phase {
            PointerPhase::Start => self.on_start(stage, metrics, event),
            PointerPhase::Move => self.on_move(stage, metrics, event),
            // Unconditional and idempotent: ending with no active grab
            // is a no-op.
            PointerPhase::End => self.state = GestureState::Idle,
        }
    }

    fn on_start(&mut self, stage: &Stage, metrics: CanvasMetrics, event: &PointerEvent) {
        let Some(layer) = eligible_layer(stage) else {
            return;
        };

        match event.points.len() {
            1 => {
                let Some(layer_ref) = stage.layer(layer) else {
                    return;
                };
                let p = metrics.to_canvas(self.canvas, event.points[0]);
                let rect = draw_rect(layer_ref, self.canvas);
                if let Some(target) = hit_test(rect, p.x, p.y) {
                    tracing::trace!(?layer, ?target, "Gesture grab");
                    self.state = GestureState::Grab {
                        layer,
                        target,
                        last: p,
                    };
                }
            }
            n if n >= 2 => {
                let a = metrics.to_canvas(self.canvas, event.points[0]);
                let b = metrics.to_canvas(self.canvas, event.points[1]);
                let distance = a.distance_to(&b);
                if distance <= f64::EPSILON {
                    return;
                }
                let scale = stage
                    .layer(layer)
                    .map(|l| l.transform.scale)
                    .unwrap_or_default();
                tracing::trace!(?layer, distance, scale, "Pinch started");
                self.state = GestureState::Pinch {
                    layer,
                    baseline_distance: distance,
                    baseline_scale: scale,
                };
            }
            _ => {}
        }
    }

    fn on_move(&mut self, stage: &mut Stage, metrics: CanvasMetrics, event: &PointerEvent) {
        match self.state {
            GestureState::Idle => {}
            GestureState::Grab {
                layer,
                target,
                last,
            } => {
                // Stale-gesture safety: the selection must still be this
                // layer and still editable, or the move is a no-op.
                if eligible_layer(stage) != Some(layer) {
                    return;
                }
                let [point] = event.points.as_slice() else {
                    return;
                };
                let p = metrics.to_canvas(self.canvas, *point);
                let dx = p.x - last.x;
                let dy = p.y - last.y;

                let canvas = self.canvas;
                let Some(layer_ref) = stage.layer_mut(layer) else {
                    return;
                };

                match target {
                    GrabTarget::Move => {
                        let t = layer_ref.transform;
                        layer_ref.set_transform(t.with_position(
                            t.x + dx / canvas.width as f64 * 100.0,
                            t.y + dy / canvas.height as f64 * 100.0,
                        ));
                    }
                    _ => {
                        let (base_w, base_h) = base_draw_size(layer_ref, canvas);
                        // Sign convention: dragging a handle inward
                        // increases that edge's crop.
                        let delta_pct = match target {
                            GrabTarget::Left => dx / base_w * 100.0,
                            GrabTarget::Right => -dx / base_w * 100.0,
                            GrabTarget::Top => dy / base_h * 100.0,
                            GrabTarget::Bottom => -dy / base_h * 100.0,
                            GrabTarget::Move => unreachable!(),
                        };
                        let next = crop_with_anchor(layer_ref, canvas, target, delta_pct);
                        layer_ref.set_transform(next);
                    }
                }

                self.state = GestureState::Grab {
                    layer,
                    target,
                    last: p,
                };
            }
            GestureState::Pinch {
                layer,
                baseline_distance,
                baseline_scale,
            } => {
                if eligible_layer(stage) != Some(layer) {
                    return;
                }
                if event.points.len() < 2 {
                    return;
                }
                let a = metrics.to_canvas(self.canvas, event.points[0]);
                let b = metrics.to_canvas(self.canvas, event.points[1]);
                let distance = a.distance_to(&b);
                if distance <= f64::EPSILON {
                    return;
                }
                if let Some(layer_ref) = stage.layer_mut(layer) {
                    let t = layer_ref.transform;
                    layer_ref
                        .set_transform(t.with_scale(baseline_scale * distance / baseline_distance));
                }
            }
        }
    }
}

/// The layer gestures may edit right now: the selected, visible layer,
/// with the view unlocked and full-frame mode off.
fn eligible_layer(stage: &Stage) -> Option<LayerId> {
    if stage.locked || stage.full_frame {
        return None;
    }
    stage.selected_layer().map(|l| l.id)
}
