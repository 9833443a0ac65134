//! Murmur audio crate - frame capture, speech-activity detection, and WAV
//! artifact serialization.
//!
//! Provides trait-based abstractions for the frame source and the speech
//! classifier, a cpal-backed device implementation, and scripted/mock
//! implementations for testing without real audio hardware.

pub mod artifact;
pub mod cpal_source;
pub mod detector;
pub mod frame;
pub mod source;

pub use artifact::AudioArtifact;
pub use cpal_source::{list_input_devices, CpalFrameSource};
pub use detector::{AmplitudeSpeechDetector, SpeechDetector, WebRtcSpeechDetector};
pub use frame::{samples_per_frame, AudioFrame, FRAME_DURATION_MS};
pub use source::{AudioFrameSource, FrameResult, ScriptedFrameSource, FRAME_CHANNEL_CAPACITY};
