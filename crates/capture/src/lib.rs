//! Layercast Capture
//!
//! Turns the render loop's frame stream into a saved recording:
//! - `codec`: preference-ordered codec negotiation against the
//!   installed GStreamer plugins
//! - `pipeline`: the appsrc-to-chunks encode pipeline with mixed audio
//! - `session`: the idle/recording lifecycle and the frame feed
//! - `sink`: destinations for finished recordings

pub mod codec;
pub mod pipeline;
pub mod session;
pub mod sink;

pub use codec::*;
pub use pipeline::*;
pub use session::*;
pub use sink::*;
