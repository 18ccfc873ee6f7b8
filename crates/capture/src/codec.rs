//! Recording codec negotiation.
//!
//! The encode pipeline is assembled from whatever the installed
//! GStreamer plugins can provide. Candidates are probed in preference
//! order at session start and the first fully-supported one wins; the
//! chosen option decides the container, the encoders, and the MIME type
//! and file extension stamped on the finished recording.

use layercast_common::{LayercastError, LayercastResult};

/// One candidate container/encoder combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOption {
    /// Human-readable name for logs and the `codecs` report.
    pub name: &'static str,
    /// Muxer element.
    pub muxer: &'static str,
    /// Video encoder element.
    pub video_encoder: &'static str,
    /// Parser between encoder and muxer, if the codec needs one.
    pub video_parser: Option<&'static str>,
    /// Audio encoder element.
    pub audio_encoder: &'static str,
    /// MIME type reported on the finished recording.
    pub mime_type: &'static str,
    /// File extension for the saved recording.
    pub extension: &'static str,
}

impl CodecOption {
    /// Every element this option needs from the GStreamer registry.
    pub fn required_elements(&self) -> Vec<&'static str> {
        let mut elements = vec![self.muxer, self.video_encoder, self.audio_encoder];
        if let Some(parser) = self.video_parser {
            elements.push(parser);
        }
        elements
    }
}

/// Candidates in preference order. MP4 first for the widest playback
/// compatibility, WebM next, Matroska as the tolerant fallback.
pub const CODEC_CANDIDATES: &[CodecOption] = &[
    CodecOption {
        name: "mp4-h264-aac",
        muxer: "mp4mux",
        video_encoder: "x264enc",
        video_parser: Some("h264parse"),
        audio_encoder: "avenc_aac",
        mime_type: "video/mp4",
        extension: "mp4",
    },
    CodecOption {
        name: "webm-vp8-opus",
        muxer: "webmmux",
        video_encoder: "vp8enc",
        video_parser: None,
        audio_encoder: "opusenc",
        mime_type: "video/webm",
        extension: "webm",
    },
    CodecOption {
        name: "mkv-h264-opus",
        muxer: "matroskamux",
        video_encoder: "x264enc",
        video_parser: Some("h264parse"),
        audio_encoder: "opusenc",
        mime_type: "video/x-matroska",
        extension: "mkv",
    },
];

/// Pick the first candidate whose elements all pass `probe`.
pub fn first_supported(
    candidates: &[CodecOption],
    probe: impl Fn(&str) -> bool,
) -> Option<CodecOption> {
    candidates
        .iter()
        .copied()
        .find(|c| c.required_elements().iter().all(|e| probe(e)))
}

/// Negotiate against the installed GStreamer registry.
pub fn negotiate() -> LayercastResult<CodecOption> {
    crate::pipeline::init_gstreamer()?;
    let chosen = first_supported(CODEC_CANDIDATES, element_available).ok_or_else(|| {
        LayercastError::codec(
            "No supported recording codec: mp4mux/x264enc, webmmux/vp8enc, and matroskamux are all missing",
        )
    })?;
    tracing::info!(codec = chosen.name, mime = chosen.mime_type, "Negotiated recording codec");
    Ok(chosen)
}

/// Per-candidate probe results for the `codecs` report.
pub fn probe_report() -> LayercastResult<Vec<(CodecOption, Vec<(&'static str, bool)>)>> {
    crate::pipeline::init_gstreamer()?;
    Ok(CODEC_CANDIDATES
        .iter()
        .map(|c| {
            let elements = c
                .required_elements()
                .into_iter()
                .map(|e| (e, element_available(e)))
                .collect();
            (*c, elements)
        })
        .collect())
}

fn element_available(name: &str) -> bool {
    gstreamer::ElementFactory::find(name).is_some()
}
