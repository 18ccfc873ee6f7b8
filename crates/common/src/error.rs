//! Error types shared across Layercast crates.

use std::path::PathBuf;

/// Top-level error type for Layercast operations.
///
/// Transient conditions (a source that is not yet decodable, a gesture
/// whose selection disappeared mid-drag, an out-of-range transform edit)
/// are never represented here; they are absorbed where they occur. Only
/// capability failures and real faults surface as errors.
#[derive(Debug, thiserror::Error)]
pub enum LayercastError {
    #[error("Scene error: {message}")]
    Scene { message: String },

    #[error("Compositor error: {message}")]
    Compositor { message: String },

    #[error("Gesture error: {message}")]
    Gesture { message: String },

    #[error("Capture error: {message}")]
    Capture { message: String },

    #[error("Codec negotiation failed: {message}")]
    Codec { message: String },

    #[error("Hardware unavailable: {message}")]
    Hardware { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using LayercastError.
pub type LayercastResult<T> = Result<T, LayercastError>;

impl LayercastError {
    pub fn scene(msg: impl Into<String>) -> Self {
        Self::Scene {
            message: msg.into(),
        }
    }

    pub fn compositor(msg: impl Into<String>) -> Self {
        Self::Compositor {
            message: msg.into(),
        }
    }

    pub fn gesture(msg: impl Into<String>) -> Self {
        Self::Gesture {
            message: msg.into(),
        }
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec {
            message: msg.into(),
        }
    }

    pub fn hardware(msg: impl Into<String>) -> Self {
        Self::Hardware {
            message: msg.into(),
        }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported {
            message: msg.into(),
        }
    }

    /// Whether this error is a hardware capability failure that the UI
    /// should report (camera or microphone denied/absent).
    pub fn is_capability_failure(&self) -> bool {
        matches!(
            self,
            Self::Hardware { .. } | Self::PermissionDenied { .. }
        )
    }
}
