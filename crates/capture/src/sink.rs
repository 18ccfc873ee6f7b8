//! Save sinks for finished recordings.

use std::path::{Path, PathBuf};

use layercast_common::LayercastResult;

use crate::session::FinalizedRecording;

/// Destination for a finished recording.
pub trait SaveSink: Send + Sync {
    /// Persist the recording, returning where it landed.
    fn save(&self, recording: &FinalizedRecording) -> LayercastResult<PathBuf>;
}

/// Writes recordings into a directory, creating it on first save.
pub struct DirectorySaveSink {
    dir: PathBuf,
}

impl DirectorySaveSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveSink for DirectorySaveSink {
    fn save(&self, recording: &FinalizedRecording) -> LayercastResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(&recording.file_name);
        std::fs::write(&path, &recording.data)?;
        tracing::debug!(
            path = %path.display(),
            bytes = recording.data.len(),
            "Wrote recording"
        );
        Ok(path)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Collects recordings in memory for session tests.
    pub(crate) struct MemorySink {
        saved: Mutex<Vec<FinalizedRecording>>,
    }

    impl MemorySink {
        pub(crate) fn new() -> Self {
            Self {
                saved: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn saved(&self) -> Vec<FinalizedRecording> {
            self.saved.lock().unwrap().clone()
        }
    }

    impl SaveSink for MemorySink {
        fn save(&self, recording: &FinalizedRecording) -> LayercastResult<PathBuf> {
            self.saved.lock().unwrap().push(recording.clone());
            Ok(PathBuf::from(&recording.file_name))
        }
    }

    fn sample_recording() -> FinalizedRecording {
        FinalizedRecording {
            file_name: "recording-20260827-120000.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
            data: b"not really mp4".to_vec(),
            duration_secs: 1.5,
        }
    }

    #[test]
    fn directory_sink_creates_the_directory_and_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirectorySaveSink::new(tmp.path().join("recordings"));
        let path = sink.save(&sample_recording()).unwrap();
        assert!(path.ends_with("recording-20260827-120000.mp4"));
        assert_eq!(std::fs::read(&path).unwrap(), b"not really mp4");
    }

    #[test]
    fn directory_sink_overwrites_same_name() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirectorySaveSink::new(tmp.path());
        let mut rec = sample_recording();
        sink.save(&rec).unwrap();
        rec.data = b"second".to_vec();
        let path = sink.save(&rec).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }
}
