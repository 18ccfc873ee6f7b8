//! Layercast Gesture Controller
//!
//! Maps raw pointer/touch sequences onto transform edits for the
//! selected layer: move drags, crop-handle drags with opposite-edge
//! anchoring, and two-finger pinch scaling. Geometry for hit-testing is
//! recomputed from `layercast-scene::geometry` on every sequence start,
//! never cached, so it always matches what the compositor drew.

pub mod controller;
pub mod pointer;

pub use controller::*;
pub use pointer::*;
