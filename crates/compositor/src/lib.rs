//! Layercast Compositor
//!
//! Turns the current stage state plus live pixel sources into one
//! fully-opaque frame per tick on a fixed-resolution RGBA surface:
//! - `Surface`: the owned pixel buffer with blit/fill/stroke primitives
//! - `source`: live source handles (camera, video asset, still image)
//!   with skip-when-not-ready semantics
//! - `Compositor`: the per-tick composite algorithm, including the
//!   selection overlay
//! - `runner`: the continuous fixed-rate render loop that republishes
//!   frames for display and capture

pub mod compositor;
pub mod runner;
pub mod source;
pub mod surface;

pub use compositor::*;
pub use runner::*;
pub use source::*;
pub use surface::*;
