//! Speech-activity detection over single 30 ms frames.

use murmur_core::error::{MurmurError, Result};
use murmur_core::types::SUPPORTED_SAMPLE_RATES;

use crate::frame::AudioFrame;

/// Classifier deciding whether one frame contains speech.
///
/// Implementations may keep internal decoder state, hence `&mut self`.
pub trait SpeechDetector: Send {
    fn is_speech(&mut self, frame: &AudioFrame) -> Result<bool>;
}

/// Speech detector backed by the WebRTC VAD.
///
/// Sensitivity is fixed at the most aggressive (most speech-selective)
/// mode — a deliberate simplification, not user-configurable. Construction
/// validates the sample rate against the set the algorithm accepts.
pub struct WebRtcSpeechDetector {
    vad: webrtc_vad::Vad,
    sample_rate: u32,
}

// SAFETY: the underlying Vad wraps a raw pointer to a self-contained decoder
// state. It is only ever driven from the single capture-loop task that owns
// this detector; we need Send to move it onto that task, never Sync.
unsafe impl Send for WebRtcSpeechDetector {}

impl WebRtcSpeechDetector {
    /// Create a detector for the given sample rate.
    ///
    /// # Errors
    /// Returns `MurmurError::Config` if the rate is not one of
    /// {8000, 16000, 32000, 48000}.
    pub fn new(sample_rate: u32) -> Result<Self> {
        let rate = match sample_rate {
            8000 => webrtc_vad::SampleRate::Rate8kHz,
            16000 => webrtc_vad::SampleRate::Rate16kHz,
            32000 => webrtc_vad::SampleRate::Rate32kHz,
            48000 => webrtc_vad::SampleRate::Rate48kHz,
            other => {
                return Err(MurmurError::Config(format!(
                    "Speech detector does not support {} Hz (supported: {:?})",
                    other, SUPPORTED_SAMPLE_RATES
                )))
            }
        };

        let vad = webrtc_vad::Vad::new_with_rate_and_mode(
            rate,
            webrtc_vad::VadMode::VeryAggressive,
        );
        Ok(Self { vad, sample_rate })
    }
}

impl SpeechDetector for WebRtcSpeechDetector {
    fn is_speech(&mut self, frame: &AudioFrame) -> Result<bool> {
        if frame.sample_rate != self.sample_rate {
            return Err(MurmurError::Capture(format!(
                "Frame rate {} does not match detector rate {}",
                frame.sample_rate, self.sample_rate
            )));
        }
        self.vad
            .is_voice_segment(&frame.samples)
            .map_err(|_| MurmurError::Capture("Speech classifier rejected frame".to_string()))
    }
}

/// Amplitude-threshold detector for tests.
///
/// A frame is speech if any sample magnitude exceeds the threshold.
#[derive(Debug, Clone)]
pub struct AmplitudeSpeechDetector {
    threshold: i16,
}

impl AmplitudeSpeechDetector {
    pub fn new(threshold: i16) -> Self {
        Self { threshold }
    }
}

impl SpeechDetector for AmplitudeSpeechDetector {
    fn is_speech(&mut self, frame: &AudioFrame) -> Result<bool> {
        Ok(frame
            .samples
            .iter()
            .any(|&s| (s as i32).abs() > self.threshold as i32))
    }
}

// =============================================================================
// Tests
// =============================================================================
