//! Layercast Scene Model
//!
//! The data model shared by the compositor and the gesture controller:
//! - `Transform`: immutable placement/crop value type with field-wise clamps
//! - `Layer`: one imported asset (image or video) plus its transform
//! - `Stage`: the per-tick composite frame state (visible set, selection,
//!   presentation flags)
//! - `geometry`: the single source of truth for draw rectangles, fitting,
//!   and handle placement, so rendering and hit-testing never disagree

pub mod geometry;
pub mod layer;
pub mod stage;
pub mod transform;

pub use geometry::*;
pub use layer::*;
pub use stage::*;
pub use transform::*;
