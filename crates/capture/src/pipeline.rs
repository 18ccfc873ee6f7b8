//! GStreamer encode pipeline for recording.
//!
//! Composited frames are pushed into an `appsrc`, encoded and muxed
//! into the negotiated container, and collected as a stream of muxed
//! chunks from an `appsink`. Audio is mixed from whichever inputs are
//! available (microphone, the visible video asset's track, and a
//! silence generator that keeps the audio track alive when both are
//! absent or end early).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use gst::prelude::*;
use gstreamer as gst;
use gstreamer_app as gst_app;
use layercast_common::{LayercastError, LayercastResult};
use layercast_compositor::SurfaceFrame;

use crate::codec::CodecOption;

/// Settings for one recording run.
#[derive(Debug, Clone)]
pub struct RecordingOptions {
    /// Output frame width in pixels.
    pub width: u32,

    /// Output frame height in pixels.
    pub height: u32,

    /// Frames pushed per second.
    pub fps: u32,

    /// Mix the microphone into the audio track.
    pub mic: bool,

    /// URI of a video asset whose audio track should be mixed in.
    pub asset_audio_uri: Option<String>,

    /// Audio sample rate.
    pub sample_rate: u32,

    /// Approximate muxed chunk duration in milliseconds.
    pub chunk_duration_ms: u32,
}

impl Default for RecordingOptions {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            mic: true,
            asset_audio_uri: None,
            sample_rate: 48000,
            chunk_duration_ms: 1000,
        }
    }
}

/// Trait for an encode pipeline fed from the render loop.
pub trait RecordingPipeline: Send {
    /// Start the pipeline.
    fn start(&mut self) -> LayercastResult<()>;

    /// Push one composited frame with its presentation timestamp.
    fn push_frame(&mut self, frame: &SurfaceFrame, pts_ns: u64) -> LayercastResult<()>;

    /// Take the muxed chunks produced since the last drain.
    fn drain_chunks(&mut self) -> Vec<Vec<u8>>;

    /// Flush and finalize, returning the remaining muxed chunks.
    fn finish(&mut self) -> LayercastResult<Vec<Vec<u8>>>;

    /// Check if the pipeline is currently running.
    fn is_running(&self) -> bool;
}

pub struct GstRecordingPipeline {
    pipeline: gst::Pipeline,
    appsrc: gst_app::AppSrc,
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
    running: Arc<AtomicBool>,
    frame_duration_ns: u64,
}

impl GstRecordingPipeline {
    /// Build the pipeline for the negotiated codec. Audio inputs that
    /// are unavailable degrade to warnings; only a video-path failure
    /// is an error.
    pub fn build(codec: &CodecOption, opts: &RecordingOptions) -> LayercastResult<Self> {
        init_gstreamer()?;

        let mic_available = gst::ElementFactory::find("pulsesrc").is_some();
        if opts.mic && !mic_available {
            tracing::warn!("Microphone source unavailable; recording without mic audio");
        }

        let launch = build_launch(codec, opts, mic_available);
        tracing::debug!(launch = %launch, "Building recording pipeline");

        let element = gst::parse::launch(&launch)
            .map_err(|e| LayercastError::capture(format!("Failed to build recording pipeline: {e}")))?;
        let pipeline = element
            .dynamic_cast::<gst::Pipeline>()
            .map_err(|_| LayercastError::capture("Launch string did not produce a pipeline"))?;

        let appsrc = pipeline
            .by_name("frames")
            .and_then(|e| e.dynamic_cast::<gst_app::AppSrc>().ok())
            .ok_or_else(|| LayercastError::capture("Recording pipeline is missing the frame source"))?;
        let appsink = pipeline
            .by_name("chunks")
            .and_then(|e| e.dynamic_cast::<gst_app::AppSink>().ok())
            .ok_or_else(|| LayercastError::capture("Recording pipeline is missing the chunk sink"))?;

        let chunks: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
        let collected = Arc::clone(&chunks);
        appsink.set_callbacks(
            gst_app::AppSinkCallbacks::builder()
                .new_sample(move |sink| {
                    let sample = sink.pull_sample().map_err(|_| gst::FlowError::Eos)?;
                    if let Some(buffer) = sample.buffer() {
                        if let Ok(map) = buffer.map_readable() {
                            if let Ok(mut guard) = collected.lock() {
                                guard.push(map.as_slice().to_vec());
                            }
                        }
                    }
                    Ok(gst::FlowSuccess::Ok)
                })
                .build(),
        );

        Ok(Self {
            pipeline,
            appsrc,
            chunks,
            running: Arc::new(AtomicBool::new(false)),
            frame_duration_ns: 1_000_000_000 / opts.fps.max(1) as u64,
        })
    }
}

impl RecordingPipeline for GstRecordingPipeline {
    fn start(&mut self) -> LayercastResult<()> {
        self.pipeline
            .set_state(gst::State::Playing)
            .map_err(|e| LayercastError::capture(format!("Failed to start recording pipeline: {e:?}")))?;

        // State changes are async; wait so the encoder chain is live
        // before the first frame is pushed.
        match self.pipeline.state(gst::ClockTime::from_seconds(10)) {
            (Ok(_), gst::State::Playing, _) => {}
            (Ok(_), state, _) => {
                tracing::warn!(?state, "Recording pipeline did not reach Playing state within timeout");
            }
            (Err(e), _, _) => {
                return Err(LayercastError::capture(format!(
                    "Recording pipeline failed to reach Playing state: {e:?}"
                )));
            }
        }

        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn push_frame(&mut self, frame: &SurfaceFrame, pts_ns: u64) -> LayercastResult<()> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(LayercastError::capture("Recording pipeline is not running"));
        }

        let mut buffer = gst::Buffer::from_mut_slice(frame.data.as_ref().clone());
        {
            let buffer = buffer
                .get_mut()
                .ok_or_else(|| LayercastError::capture("Frame buffer is not writable"))?;
            buffer.set_pts(gst::ClockTime::from_nseconds(pts_ns));
            buffer.set_duration(gst::ClockTime::from_nseconds(self.frame_duration_ns));
        }

        self.appsrc
            .push_buffer(buffer)
            .map_err(|e| LayercastError::capture(format!("Failed to push frame: {e:?}")))?;
        Ok(())
    }

    fn drain_chunks(&mut self) -> Vec<Vec<u8>> {
        match self.chunks.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => Vec::new(),
        }
    }

    fn finish(&mut self) -> LayercastResult<Vec<Vec<u8>>> {
        // EOS through the appsrc so encoders and the muxer flush their
        // tails; stopping without it truncates the recording.
        if self.appsrc.end_of_stream().is_err() {
            tracing::warn!("Failed to send EOS; recording tail may be truncated");
        } else if let Some(bus) = self.pipeline.bus() {
            let deadline = Duration::from_secs(10);
            let start = std::time::Instant::now();
            loop {
                let elapsed = start.elapsed();
                if elapsed >= deadline {
                    tracing::warn!("EOS drain timed out after 10s");
                    break;
                }
                let remaining = deadline - elapsed;
                match bus.timed_pop(gst::ClockTime::from_nseconds(remaining.as_nanos() as u64)) {
                    Some(msg) => match msg.view() {
                        gst::MessageView::Eos(_) => {
                            tracing::debug!("EOS received; recording pipeline drained");
                            break;
                        }
                        gst::MessageView::Error(e) => {
                            tracing::warn!(error = %e.error(), "Pipeline error during EOS drain");
                            break;
                        }
                        _ => {}
                    },
                    None => {
                        tracing::warn!("EOS drain timed out after 10s");
                        break;
                    }
                }
            }
        }

        self.pipeline
            .set_state(gst::State::Null)
            .map_err(|e| LayercastError::capture(format!("Failed to stop recording pipeline: {e:?}")))?;
        self.running.store(false, Ordering::SeqCst);

        let chunks = match self.chunks.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(_) => return Err(LayercastError::capture("Chunk collector lock poisoned")),
        };
        tracing::info!(chunks = chunks.len(), "Recording pipeline finalized");
        Ok(chunks)
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn build_launch(codec: &CodecOption, opts: &RecordingOptions, mic_available: bool) -> String {
    let width = opts.width;
    let height = opts.height;
    let fps = opts.fps.max(1);
    let rate = opts.sample_rate;
    // One keyframe every 2 seconds.
    let keyint = fps.saturating_mul(2).max(2);

    let encoder = match codec.video_encoder {
        "x264enc" => format!(
            "x264enc tune=zerolatency speed-preset=veryfast key-int-max={keyint} bitrate=6000"
        ),
        "vp8enc" => format!("vp8enc deadline=1 cpu-used=4 keyframe-max-dist={keyint} target-bitrate=6000000"),
        other => other.to_string(),
    };
    let parser = codec
        .video_parser
        .map(|p| format!(" ! {p}"))
        .unwrap_or_default();
    let mux = match codec.muxer {
        "mp4mux" => format!(
            "mp4mux name=mux fragment-duration={} streamable=true",
            opts.chunk_duration_ms
        ),
        other => format!("{other} name=mux streamable=true"),
    };

    let mut launch = format!(
        "appsrc name=frames is-live=true format=time block=true \
         ! video/x-raw,format=RGBA,width={width},height={height},framerate={fps}/1 \
         ! videoconvert ! {encoder}{parser} ! queue ! mux. \
         {mux} ! appsink name=chunks sync=false \
         audiomixer name=mix ! audioconvert ! audioresample ! audio/x-raw,rate={rate} \
         ! {aenc} ! queue ! mux.",
        aenc = codec.audio_encoder,
    );

    if opts.mic && mic_available {
        launch.push_str(" pulsesrc do-timestamp=true ! audioconvert ! audioresample ! queue ! mix.");
    }
    if let Some(uri) = &opts.asset_audio_uri {
        let uri = uri.replace('"', "\\\"");
        launch.push_str(&format!(
            " uridecodebin uri=\"{uri}\" ! audioconvert ! audioresample ! queue ! mix."
        ));
    }
    // Silence keeps the audio track rolling when no other input is
    // present or an asset track ends before the recording does.
    launch.push_str(" audiotestsrc wave=silence is-live=true ! audioconvert ! mix.");

    launch
}

pub(crate) fn init_gstreamer() -> LayercastResult<()> {
    static GST_INIT: OnceLock<Result<(), String>> = OnceLock::new();
    let init_res = GST_INIT.get_or_init(|| gst::init().map_err(|e| e.to_string()));
    match init_res {
        Ok(()) => Ok(()),
        Err(e) => Err(LayercastError::capture(format!(
            "Failed to initialize GStreamer: {e}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CODEC_CANDIDATES;

    #[test]
    fn mp4_launch_uses_fragmented_mux_and_parser() {
        let launch = build_launch(&CODEC_CANDIDATES[0], &RecordingOptions::default(), true);
        assert!(launch.contains("mp4mux name=mux fragment-duration=1000"));
        assert!(launch.contains("x264enc"));
        assert!(launch.contains("! h264parse"));
        assert!(launch.contains("avenc_aac"));
        assert!(launch.contains("width=1080,height=1920,framerate=30/1"));
    }

    #[test]
    fn webm_launch_skips_the_parser() {
        let launch = build_launch(&CODEC_CANDIDATES[1], &RecordingOptions::default(), true);
        assert!(launch.contains("webmmux name=mux"));
        assert!(launch.contains("vp8enc"));
        assert!(!launch.contains("h264parse"));
        assert!(launch.contains("opusenc"));
    }

    #[test]
    fn mic_branch_dropped_when_unavailable() {
        let opts = RecordingOptions::default();
        let launch = build_launch(&CODEC_CANDIDATES[0], &opts, false);
        assert!(!launch.contains("pulsesrc"));
        assert!(launch.contains("audiotestsrc wave=silence"));
    }

    #[test]
    fn mic_branch_dropped_when_disabled() {
        let opts = RecordingOptions {
            mic: false,
            ..RecordingOptions::default()
        };
        let launch = build_launch(&CODEC_CANDIDATES[0], &opts, true);
        assert!(!launch.contains("pulsesrc"));
    }

    #[test]
    fn asset_audio_branch_uses_the_uri() {
        let opts = RecordingOptions {
            asset_audio_uri: Some("file:///tmp/clip.mp4".to_string()),
            ..RecordingOptions::default()
        };
        let launch = build_launch(&CODEC_CANDIDATES[0], &opts, true);
        assert!(launch.contains("uridecodebin uri=\"file:///tmp/clip.mp4\""));
        assert!(launch.contains("pulsesrc"));
    }
}
