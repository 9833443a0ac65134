//! Top-level orchestration: record, transcribe, post-process.

use murmur_audio::{AudioFrameSource, SpeechDetector, WebRtcSpeechDetector};
use murmur_core::config::{MurmurConfig, RecordingConfig};
use murmur_core::error::Result;
use murmur_core::events::{StatusKind, StatusReporter};
use murmur_core::types::{PostProcessConfig, RecordingMode};
use murmur_transcribe::{post_process, TranscriptionBackend};

use crate::cancel::CancellationToken;
use crate::control::ActivationControl;
use crate::session::{RecordingSession, SessionOutcome};

/// Owns the backend and drives one session at a time.
///
/// The backend (in particular a loaded local model) is constructed once and
/// reused across sessions; `record_and_transcribe` takes `&mut self`, so the
/// engine can never have two sessions in flight. Serializing concurrent
/// activation requests is the hotkey handler's job, not the engine's.
pub struct SessionController<B: TranscriptionBackend> {
    backend: B,
    recording: RecordingConfig,
    post: PostProcessConfig,
    reporter: StatusReporter,
}

impl<B: TranscriptionBackend> SessionController<B> {
    pub fn new(
        backend: B,
        recording: RecordingConfig,
        post: PostProcessConfig,
        reporter: StatusReporter,
    ) -> Self {
        Self {
            backend,
            recording,
            post,
            reporter,
        }
    }

    pub fn from_config(backend: B, config: &MurmurConfig, reporter: StatusReporter) -> Self {
        Self::new(
            backend,
            config.recording.clone(),
            config.post_process(),
            reporter,
        )
    }

    /// Run one full activation: capture, transcribe, post-process.
    ///
    /// Returns the final text, or an empty string when the session was
    /// cancelled, captured nothing, or failed — every failure is reported
    /// through the status sink and never propagates to the caller.
    pub async fn record_and_transcribe<S, C>(
        &mut self,
        source: &mut S,
        control: C,
        cancel: CancellationToken,
    ) -> String
    where
        S: AudioFrameSource,
        C: ActivationControl,
    {
        self.reporter.emit(StatusKind::Recording, "Recording...");

        let frames = match source.open() {
            Ok(frames) => frames,
            Err(e) => {
                tracing::error!(error = %e, "Failed to open audio source");
                self.reporter.emit(StatusKind::Error, "Error");
                return String::new();
            }
        };

        let detector = match self.build_detector() {
            Ok(detector) => detector,
            Err(e) => {
                source.close();
                tracing::error!(error = %e, "Failed to build speech detector");
                self.reporter.emit(StatusKind::Error, "Error");
                return String::new();
            }
        };

        let session = RecordingSession::new(
            &self.recording,
            frames,
            detector,
            control,
            cancel,
            self.reporter.clone(),
        );
        let outcome = session.run().await;
        source.close();

        let artifact = match outcome {
            SessionOutcome::Finished(artifact) => artifact,
            SessionOutcome::Empty => {
                tracing::debug!("Nothing recorded; skipping transcription");
                return String::new();
            }
            // Cancel and failure events were emitted by the session.
            SessionOutcome::Cancelled => return String::new(),
            SessionOutcome::Failed(_) => return String::new(),
        };

        self.reporter.emit(StatusKind::Transcribing, "Transcribing...");
        let raw = match self.backend.transcribe(&artifact).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, "Transcription failed");
                self.reporter.emit(StatusKind::Error, "Error");
                return String::new();
            }
        };

        // Artifact consumed; dropping it deletes the temp WAV.
        drop(artifact);

        post_process(&raw, &self.post)
    }

    fn build_detector(&self) -> Result<Option<Box<dyn SpeechDetector>>> {
        match self.recording.mode {
            RecordingMode::VoiceActivityDetection => Ok(Some(Box::new(
                WebRtcSpeechDetector::new(self.recording.sample_rate)?,
            ))),
            _ => Ok(None),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::timeout;

    use murmur_audio::{AudioFrame, FrameResult, ScriptedFrameSource};
    use murmur_core::error::MurmurError;
    use murmur_core::events::{ChannelStatusSink, StatusEvent};
    use murmur_transcribe::MockTranscriptionBackend;

    use crate::control::ScriptedControl;

    const RATE: u32 = 16000;
    const FRAME_SAMPLES: usize = 480;

    fn toggle_config() -> RecordingConfig {
        RecordingConfig {
            mode: RecordingMode::PressToToggle,
            ..Default::default()
        }
    }

    fn frames(n: usize) -> Vec<AudioFrame> {
        std::iter::repeat_with(|| AudioFrame::filled(RATE, 11)).take(n).collect()
    }

    fn drain(mut rx: tokio::sync::mpsc::UnboundedReceiver<StatusEvent>) -> Vec<StatusKind> {
        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(event.kind);
        }
        kinds
    }

    #[tokio::test]
    async fn test_end_to_end_press_to_toggle() {
        // Ten frames, then a toggle; a stub backend returns text with a
        // trailing period that post-processing strips.
        let (sink, events_rx) = ChannelStatusSink::new();
        let backend = MockTranscriptionBackend::new("test transcription.");
        let mut controller = SessionController::new(
            backend.clone(),
            toggle_config(),
            PostProcessConfig {
                remove_trailing_period: true,
                add_trailing_space: false,
                remove_capitalization: false,
            },
            StatusReporter::new(Arc::new(sink)),
        );

        let mut source = ScriptedFrameSource::new(frames(11));
        let text = timeout(
            Duration::from_secs(1),
            controller.record_and_transcribe(
                &mut source,
                ScriptedControl::toggle_after_frames(10),
                CancellationToken::new(),
            ),
        )
        .await
        .unwrap();

        assert_eq!(text, "test transcription");
        assert_eq!(backend.call_count(), 1);
        assert_eq!(
            drain(events_rx),
            vec![StatusKind::Recording, StatusKind::Transcribing]
        );
    }

    #[tokio::test]
    async fn test_cancelled_session_skips_backend() {
        let (sink, events_rx) = ChannelStatusSink::new();
        let backend = MockTranscriptionBackend::new("never seen");
        let mut controller = SessionController::new(
            backend.clone(),
            toggle_config(),
            PostProcessConfig::default(),
            StatusReporter::new(Arc::new(sink)),
        );

        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut source = ScriptedFrameSource::new(frames(5));
        let text = timeout(
            Duration::from_secs(1),
            controller.record_and_transcribe(&mut source, ScriptedControl::idle(), cancel),
        )
        .await
        .unwrap();

        assert_eq!(text, "");
        assert_eq!(backend.call_count(), 0);
        assert_eq!(
            drain(events_rx),
            vec![StatusKind::Recording, StatusKind::Cancel]
        );
    }

    #[tokio::test]
    async fn test_backend_failure_is_contained() {
        let (sink, events_rx) = ChannelStatusSink::new();
        let backend = MockTranscriptionBackend::failing();
        let mut controller = SessionController::new(
            backend.clone(),
            toggle_config(),
            PostProcessConfig::default(),
            StatusReporter::new(Arc::new(sink)),
        );

        let mut source = ScriptedFrameSource::new(frames(3));
        let text = timeout(
            Duration::from_secs(1),
            controller.record_and_transcribe(
                &mut source,
                ScriptedControl::toggle_after_frames(2),
                CancellationToken::new(),
            ),
        )
        .await
        .unwrap();

        assert_eq!(text, "");
        assert_eq!(backend.call_count(), 1);
        assert_eq!(
            drain(events_rx),
            vec![
                StatusKind::Recording,
                StatusKind::Transcribing,
                StatusKind::Error
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_session_returns_empty_without_dispatch() {
        let backend = MockTranscriptionBackend::new("never seen");
        let mut controller = SessionController::new(
            backend.clone(),
            RecordingConfig {
                mode: RecordingMode::HoldToRecord,
                ..Default::default()
            },
            PostProcessConfig::default(),
            StatusReporter::none(),
        );

        let mut source = ScriptedFrameSource::new(frames(1));
        let text = timeout(
            Duration::from_secs(1),
            controller.record_and_transcribe(
                &mut source,
                ScriptedControl::hold_for_frames(0),
                CancellationToken::new(),
            ),
        )
        .await
        .unwrap();

        assert_eq!(text, "");
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_source_open_failure_is_reported() {
        struct BrokenSource;
        impl AudioFrameSource for BrokenSource {
            fn open(
                &mut self,
            ) -> murmur_core::error::Result<tokio::sync::mpsc::Receiver<FrameResult>>
            {
                Err(MurmurError::Capture("no input device".to_string()))
            }
            fn close(&mut self) {}
        }

        let (sink, events_rx) = ChannelStatusSink::new();
        let backend = MockTranscriptionBackend::new("never seen");
        let mut controller = SessionController::new(
            backend.clone(),
            toggle_config(),
            PostProcessConfig::default(),
            StatusReporter::new(Arc::new(sink)),
        );

        let text = controller
            .record_and_transcribe(
                &mut BrokenSource,
                ScriptedControl::idle(),
                CancellationToken::new(),
            )
            .await;

        assert_eq!(text, "");
        assert_eq!(backend.call_count(), 0);
        assert_eq!(
            drain(events_rx),
            vec![StatusKind::Recording, StatusKind::Error]
        );
    }

    #[tokio::test]
    async fn test_controller_runs_consecutive_sessions() {
        // One engine instance, sequential sessions; the backend instance is
        // reused without reconstruction.
        let backend = MockTranscriptionBackend::new("again.");
        let mut controller = SessionController::new(
            backend.clone(),
            toggle_config(),
            PostProcessConfig {
                remove_trailing_period: true,
                ..Default::default()
            },
            StatusReporter::none(),
        );

        for _ in 0..2 {
            let mut source = ScriptedFrameSource::new(frames(2));
            let text = timeout(
                Duration::from_secs(1),
                controller.record_and_transcribe(
                    &mut source,
                    ScriptedControl::toggle_after_frames(1),
                    CancellationToken::new(),
                ),
            )
            .await
            .unwrap();
            assert_eq!(text, "again");
        }
        assert_eq!(backend.call_count(), 2);
    }

    #[test]
    fn test_sample_count_matches_recorded_frames() {
        // Shared constant sanity: the e2e assertion above relies on this.
        assert_eq!(murmur_audio::samples_per_frame(RATE), FRAME_SAMPLES);
    }
}
