//! Layercast Common Utilities
//!
//! Shared infrastructure for all Layercast crates:
//! - Error types and result aliases
//! - Clock and tick-rate utilities for the render and capture loops
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
