//! The mode-aware capture loop.
//!
//! A session pulls frames off the source channel one at a time and applies,
//! in order: the cancellation check, then the active mode's append/stop rule.
//! Mode dispatch is a single exclusive match — each mode owns one handler,
//! and no mode's check runs unless that mode is active.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use murmur_audio::{AudioArtifact, AudioFrame, FrameResult, SpeechDetector, FRAME_DURATION_MS};
use murmur_core::config::RecordingConfig;
use murmur_core::error::{MurmurError, Result};
use murmur_core::events::{StatusKind, StatusReporter};
use murmur_core::types::RecordingMode;

use crate::cancel::CancellationToken;
use crate::control::ActivationControl;

/// Terminal result of one capture loop.
#[derive(Debug)]
pub enum SessionOutcome {
    /// Recording stopped by its mode rule with a non-empty buffer.
    Finished(AudioArtifact),
    /// Recording stopped by its mode rule without capturing anything.
    Empty,
    /// Externally cancelled; any captured audio is discarded.
    Cancelled,
    /// Capture failed; the error has already been reported.
    Failed(MurmurError),
}

/// Per-frame verdict from a mode handler.
enum Step {
    Continue,
    Stop,
}

/// One activation-to-result capture loop.
///
/// Created when a shortcut fires and consumed by [`RecordingSession::run`];
/// a new session is built for the next activation. Accumulated samples are
/// append-only and all frames share the session's sample rate.
pub struct RecordingSession<C: ActivationControl> {
    id: Uuid,
    started_at: DateTime<Utc>,
    mode: RecordingMode,
    sample_rate: u32,
    silence_frame_limit: u32,
    frames: mpsc::Receiver<FrameResult>,
    detector: Option<Box<dyn SpeechDetector>>,
    control: C,
    cancel: CancellationToken,
    reporter: StatusReporter,
    samples: Vec<i16>,
    silent_frames: u32,
}

impl<C: ActivationControl> RecordingSession<C> {
    pub fn new(
        recording: &RecordingConfig,
        frames: mpsc::Receiver<FrameResult>,
        detector: Option<Box<dyn SpeechDetector>>,
        control: C,
        cancel: CancellationToken,
        reporter: StatusReporter,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            mode: recording.mode,
            sample_rate: recording.sample_rate,
            silence_frame_limit: recording.silence_duration_ms / FRAME_DURATION_MS,
            frames,
            detector,
            control,
            cancel,
            reporter,
            samples: Vec::new(),
            silent_frames: 0,
        }
    }

    /// Run the capture loop to a terminal outcome.
    ///
    /// The cancellation flag is sampled before and after each blocking frame
    /// fetch, bounding cancellation latency to one frame period.
    pub async fn run(mut self) -> SessionOutcome {
        tracing::info!(session_id = %self.id, mode = %self.mode, "Recording session started");

        loop {
            if self.cancel.is_cancelled() {
                return self.cancelled();
            }

            let frame = match self.frames.recv().await {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => return self.failed(e),
                None => {
                    return self.failed(MurmurError::Capture(
                        "Audio stream ended unexpectedly".to_string(),
                    ))
                }
            };

            if self.cancel.is_cancelled() {
                return self.cancelled();
            }

            match self.apply_mode(frame) {
                Ok(Step::Continue) => {}
                Ok(Step::Stop) => break,
                Err(e) => return self.failed(e),
            }
        }

        self.finish()
    }

    /// One exclusive dispatch per frame; each mode owns one handler.
    fn apply_mode(&mut self, frame: AudioFrame) -> Result<Step> {
        match self.mode {
            RecordingMode::PressToToggle => self.step_press_to_toggle(frame),
            RecordingMode::HoldToRecord => self.step_hold_to_record(frame),
            RecordingMode::VoiceActivityDetection => self.step_voice_activity(frame),
            RecordingMode::Continuous => self.step_continuous(frame),
        }
    }

    /// Append every frame; stop when the control fires again after at least
    /// one frame has been recorded.
    fn step_press_to_toggle(&mut self, frame: AudioFrame) -> Result<Step> {
        if self.control.toggle_requested() && !self.samples.is_empty() {
            return Ok(Step::Stop);
        }
        self.samples.extend_from_slice(&frame.samples);
        Ok(Step::Continue)
    }

    /// Append only while the control is asserted; stop the instant it is
    /// released, without appending the frame observed on release.
    fn step_hold_to_record(&mut self, frame: AudioFrame) -> Result<Step> {
        if self.control.is_asserted() {
            self.samples.extend_from_slice(&frame.samples);
            Ok(Step::Continue)
        } else {
            Ok(Step::Stop)
        }
    }

    /// Append speech frames; once something has been recorded, count
    /// consecutive non-speech frames and stop at the configured silence
    /// duration. Silence before the first speech frame never counts.
    fn step_voice_activity(&mut self, frame: AudioFrame) -> Result<Step> {
        let detector = self.detector.as_mut().ok_or_else(|| {
            MurmurError::Config(
                "voice_activity_detection mode requires a speech detector".to_string(),
            )
        })?;

        if detector.is_speech(&frame)? {
            self.samples.extend_from_slice(&frame.samples);
            self.silent_frames = 0;
        } else if !self.samples.is_empty() {
            self.silent_frames += 1;
            if self.silent_frames >= self.silence_frame_limit {
                return Ok(Step::Stop);
            }
        }
        Ok(Step::Continue)
    }

    /// Append every frame; only external cancellation ends the session.
    fn step_continuous(&mut self, frame: AudioFrame) -> Result<Step> {
        self.samples.extend_from_slice(&frame.samples);
        Ok(Step::Continue)
    }

    fn finish(self) -> SessionOutcome {
        if self.samples.is_empty() {
            tracing::info!(session_id = %self.id, "Recording finished with no samples");
            return SessionOutcome::Empty;
        }

        let elapsed_ms = (Utc::now() - self.started_at).num_milliseconds();
        tracing::info!(
            session_id = %self.id,
            samples = self.samples.len(),
            elapsed_ms,
            "Recording finished"
        );

        match AudioArtifact::from_samples(&self.samples, self.sample_rate) {
            Ok(artifact) => SessionOutcome::Finished(artifact),
            Err(e) => self.failed(e),
        }
    }

    fn cancelled(&self) -> SessionOutcome {
        tracing::info!(session_id = %self.id, "Recording session cancelled");
        self.reporter.emit(StatusKind::Cancel, "");
        SessionOutcome::Cancelled
    }

    fn failed(&self, error: MurmurError) -> SessionOutcome {
        tracing::error!(session_id = %self.id, error = %error, "Recording session failed");
        self.reporter.emit(StatusKind::Error, "Error");
        SessionOutcome::Failed(error)
    }
}

// =============================================================================
// Tests
// =============================================================================
