//! Recording session lifecycle.
//!
//! A session is either idle or recording. Starting wires the render
//! loop's frame channel into an encode pipeline through a fixed-rate
//! feed task; stopping drains the pipeline, assembles the chunks into
//! one recording, and hands it to a save sink. Start while recording
//! and stop while idle are both no-ops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use layercast_common::{LayercastError, LayercastResult, RecordingClock};
use layercast_compositor::SurfaceFrame;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::codec::CodecOption;
use crate::pipeline::RecordingPipeline;
use crate::sink::SaveSink;

/// A finished recording, ready to save.
#[derive(Debug, Clone)]
pub struct FinalizedRecording {
    /// Timestamped file name including the extension.
    pub file_name: String,

    /// MIME type of the container.
    pub mime_type: String,

    /// The muxed recording bytes, chunks concatenated in push order.
    pub data: Vec<u8>,

    /// Recording duration in seconds.
    pub duration_secs: f64,
}

/// State of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Recording,
}

/// Coordinates the encode pipeline and the frame feed for one
/// recording at a time.
pub struct CaptureSession {
    state: SessionState,
    codec: Option<CodecOption>,
    clock: Option<RecordingClock>,
    stop_flag: Arc<AtomicBool>,
    feed_task: Option<JoinHandle<FeedOutcome>>,
}

/// What the feed task hands back at stop: the pipeline, the frame
/// count, and every chunk drained while recording.
struct FeedOutcome {
    pipeline: Box<dyn RecordingPipeline>,
    pushed: u64,
    chunks: Vec<Vec<u8>>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            codec: None,
            clock: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            feed_task: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    /// Whole seconds recorded so far; 0 while idle.
    pub fn elapsed_secs(&self) -> u64 {
        match (self.state, &self.clock) {
            (SessionState::Recording, Some(clock)) => clock.elapsed_whole_secs(),
            _ => 0,
        }
    }

    /// Start recording frames from `frames` at `fps` through `pipeline`.
    ///
    /// A no-op when already recording.
    pub fn start(
        &mut self,
        mut pipeline: Box<dyn RecordingPipeline>,
        codec: CodecOption,
        frames: watch::Receiver<SurfaceFrame>,
        fps: u32,
    ) -> LayercastResult<()> {
        if self.state == SessionState::Recording {
            debug!("Recording already in progress; start ignored");
            return Ok(());
        }

        pipeline.start()?;
        let clock = RecordingClock::start();
        info!(epoch_wall = %clock.epoch_wall(), fps, codec = codec.name, "Recording started");

        self.stop_flag.store(false, Ordering::SeqCst);
        let stop_flag = Arc::clone(&self.stop_flag);
        let fps = fps.max(1);
        let frame_duration_ns = 1_000_000_000 / fps as u64;

        self.feed_task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_nanos(frame_duration_ns));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut pushed: u64 = 0;
            let mut chunks: Vec<Vec<u8>> = Vec::new();

            while !stop_flag.load(Ordering::SeqCst) {
                interval.tick().await;
                if stop_flag.load(Ordering::SeqCst) {
                    break;
                }
                let frame = frames.borrow().clone();
                // The channel is seeded with a blank frame; wait for the
                // render loop's first real composite.
                if frame.seq == 0 {
                    continue;
                }
                let pts_ns = pushed * frame_duration_ns;
                if let Err(e) = pipeline.push_frame(&frame, pts_ns) {
                    warn!(error = %e, "Frame push failed; stopping feed");
                    break;
                }
                pushed += 1;
                chunks.extend(pipeline.drain_chunks());
            }

            FeedOutcome {
                pipeline,
                pushed,
                chunks,
            }
        }));

        self.codec = Some(codec);
        self.clock = Some(clock);
        self.state = SessionState::Recording;
        Ok(())
    }

    /// Stop recording, finalize the output, and save it through `sink`.
    ///
    /// A no-op returning `Ok(None)` when idle.
    pub async fn stop(&mut self, sink: &dyn SaveSink) -> LayercastResult<Option<FinalizedRecording>> {
        if self.state != SessionState::Recording {
            debug!("No recording in progress; stop ignored");
            return Ok(None);
        }

        self.stop_flag.store(true, Ordering::SeqCst);
        let task = self.feed_task.take();
        let clock = self.clock.take();
        let codec = self.codec.take();
        // Going idle up front keeps the session restartable when a step
        // below fails; the recording is lost but the machine is not.
        self.state = SessionState::Idle;

        let mut outcome = match task {
            Some(task) => task
                .await
                .map_err(|e| LayercastError::capture(format!("Frame feed task failed: {e}")))?,
            None => return Err(LayercastError::capture("Recording session has no feed task")),
        };

        let mut chunks = outcome.chunks;
        chunks.extend(outcome.pipeline.finish()?);
        let pushed = outcome.pushed;
        let duration_secs = clock.as_ref().map(|c| c.elapsed_secs()).unwrap_or(0.0);
        let codec = codec
            .ok_or_else(|| LayercastError::capture("Recording session has no negotiated codec"))?;

        let total: usize = chunks.iter().map(Vec::len).sum();
        let mut data = Vec::with_capacity(total);
        for chunk in chunks {
            data.extend_from_slice(&chunk);
        }

        let recording = FinalizedRecording {
            file_name: format!(
                "recording-{}.{}",
                chrono::Local::now().format("%Y%m%d-%H%M%S"),
                codec.extension
            ),
            mime_type: codec.mime_type.to_string(),
            data,
            duration_secs,
        };

        info!(
            file = %recording.file_name,
            frames = pushed,
            duration_secs,
            bytes = recording.data.len(),
            "Recording finalized"
        );

        let path = sink.save(&recording)?;
        info!(path = %path.display(), "Recording saved");

        Ok(Some(recording))
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CODEC_CANDIDATES;
    use crate::sink::tests::MemorySink;
    use std::sync::atomic::AtomicU64;

    struct MockPipeline {
        started: Arc<AtomicBool>,
        pushed: Arc<AtomicU64>,
        running: bool,
        /// Drained while frames are flowing.
        streamed: Vec<Vec<u8>>,
        /// Returned by finish.
        tail: Vec<Vec<u8>>,
    }

    impl MockPipeline {
        fn new(started: Arc<AtomicBool>, pushed: Arc<AtomicU64>) -> Self {
            Self {
                started,
                pushed,
                running: false,
                streamed: vec![b"chunk-one".to_vec()],
                tail: vec![b"chunk-two".to_vec()],
            }
        }
    }

    impl RecordingPipeline for MockPipeline {
        fn start(&mut self) -> LayercastResult<()> {
            self.started.store(true, Ordering::SeqCst);
            self.running = true;
            Ok(())
        }

        fn push_frame(&mut self, _frame: &SurfaceFrame, _pts_ns: u64) -> LayercastResult<()> {
            self.pushed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn drain_chunks(&mut self) -> Vec<Vec<u8>> {
            std::mem::take(&mut self.streamed)
        }

        fn finish(&mut self) -> LayercastResult<Vec<Vec<u8>>> {
            self.running = false;
            Ok(std::mem::take(&mut self.tail))
        }

        fn is_running(&self) -> bool {
            self.running
        }
    }

    struct FailingSink;

    impl SaveSink for FailingSink {
        fn save(&self, _recording: &FinalizedRecording) -> LayercastResult<std::path::PathBuf> {
            Err(LayercastError::capture("disk full"))
        }
    }

    fn frame_channel() -> (watch::Sender<SurfaceFrame>, watch::Receiver<SurfaceFrame>) {
        watch::channel(SurfaceFrame::black(4, 4))
    }

    fn real_frame(seq: u64) -> SurfaceFrame {
        SurfaceFrame {
            seq,
            ..SurfaceFrame::black(4, 4)
        }
    }

    #[tokio::test]
    async fn stop_while_idle_is_a_no_op() {
        let mut session = CaptureSession::new();
        let sink = MemorySink::new();
        let result = session.stop(&sink).await.unwrap();
        assert!(result.is_none());
        assert!(sink.saved().is_empty());
    }

    #[tokio::test]
    async fn start_while_recording_is_a_no_op() {
        let mut session = CaptureSession::new();
        let (_tx, rx) = frame_channel();

        let first_started = Arc::new(AtomicBool::new(false));
        let pipeline = Box::new(MockPipeline::new(
            Arc::clone(&first_started),
            Arc::new(AtomicU64::new(0)),
        ));
        session
            .start(pipeline, CODEC_CANDIDATES[0], rx.clone(), 30)
            .unwrap();
        assert!(session.is_recording());

        let second_started = Arc::new(AtomicBool::new(false));
        let pipeline = Box::new(MockPipeline::new(
            Arc::clone(&second_started),
            Arc::new(AtomicU64::new(0)),
        ));
        session.start(pipeline, CODEC_CANDIDATES[0], rx, 30).unwrap();

        assert!(first_started.load(Ordering::SeqCst));
        assert!(!second_started.load(Ordering::SeqCst));

        session.stop(&MemorySink::new()).await.unwrap();
    }

    #[tokio::test]
    async fn recording_round_trip_concatenates_chunks() {
        let mut session = CaptureSession::new();
        let (tx, rx) = frame_channel();
        tx.send(real_frame(1)).unwrap();

        let pushed = Arc::new(AtomicU64::new(0));
        let pipeline = Box::new(MockPipeline::new(
            Arc::new(AtomicBool::new(false)),
            Arc::clone(&pushed),
        ));
        session
            .start(pipeline, CODEC_CANDIDATES[0], rx, 120)
            .unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;

        let sink = MemorySink::new();
        let recording = session.stop(&sink).await.unwrap().unwrap();
        assert_eq!(recording.data, b"chunk-onechunk-two");
        assert_eq!(recording.mime_type, "video/mp4");
        assert!(recording.file_name.starts_with("recording-"));
        assert!(recording.file_name.ends_with(".mp4"));
        assert!(pushed.load(Ordering::SeqCst) > 0);
        assert!(!session.is_recording());
        assert_eq!(session.elapsed_secs(), 0);

        let saved = sink.saved();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].data, b"chunk-onechunk-two");
    }

    #[tokio::test]
    async fn failed_save_leaves_the_session_restartable() {
        let mut session = CaptureSession::new();
        let (tx, rx) = frame_channel();
        tx.send(real_frame(1)).unwrap();

        let pipeline = Box::new(MockPipeline::new(
            Arc::new(AtomicBool::new(false)),
            Arc::new(AtomicU64::new(0)),
        ));
        session
            .start(pipeline, CODEC_CANDIDATES[0], rx.clone(), 120)
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(session.stop(&FailingSink).await.is_err());
        assert!(!session.is_recording());
        assert_eq!(session.elapsed_secs(), 0);

        // A fresh recording starts and stops cleanly afterwards.
        let restarted = Arc::new(AtomicBool::new(false));
        let pipeline = Box::new(MockPipeline::new(
            Arc::clone(&restarted),
            Arc::new(AtomicU64::new(0)),
        ));
        session
            .start(pipeline, CODEC_CANDIDATES[0], rx, 120)
            .unwrap();
        assert!(restarted.load(Ordering::SeqCst));
        tokio::time::sleep(Duration::from_millis(40)).await;

        let recording = session.stop(&MemorySink::new()).await.unwrap();
        assert!(recording.is_some());
    }

    #[tokio::test]
    async fn seed_frames_are_not_recorded() {
        let mut session = CaptureSession::new();
        // Channel still holds the seq-0 seed frame.
        let (_tx, rx) = frame_channel();

        let pushed = Arc::new(AtomicU64::new(0));
        let pipeline = Box::new(MockPipeline::new(
            Arc::new(AtomicBool::new(false)),
            Arc::clone(&pushed),
        ));
        session
            .start(pipeline, CODEC_CANDIDATES[0], rx, 120)
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        session.stop(&MemorySink::new()).await.unwrap();

        assert_eq!(pushed.load(Ordering::SeqCst), 0);
    }
}
