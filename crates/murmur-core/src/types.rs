//! Shared domain types for the Murmur dictation engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MurmurError;

/// Sample rates the speech-activity classifier accepts (hardware-typical).
///
/// Configuration validation rejects anything outside this set up front so a
/// bad rate never reaches the capture loop.
pub const SUPPORTED_SAMPLE_RATES: [u32; 4] = [8000, 16000, 32000, 48000];

/// How a recording session decides, frame by frame, when to stop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingMode {
    /// Record every frame; stop when speech is followed by enough silence.
    #[default]
    VoiceActivityDetection,
    /// Record every frame; stop when the activation control fires again.
    PressToToggle,
    /// Record only while the activation control is held down.
    HoldToRecord,
    /// Record every frame; stop only via external cancellation.
    Continuous,
}

impl fmt::Display for RecordingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordingMode::VoiceActivityDetection => "voice_activity_detection",
            RecordingMode::PressToToggle => "press_to_toggle",
            RecordingMode::HoldToRecord => "hold_to_record",
            RecordingMode::Continuous => "continuous",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for RecordingMode {
    type Err = MurmurError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "voice_activity_detection" => Ok(RecordingMode::VoiceActivityDetection),
            "press_to_toggle" => Ok(RecordingMode::PressToToggle),
            "hold_to_record" => Ok(RecordingMode::HoldToRecord),
            "continuous" => Ok(RecordingMode::Continuous),
            other => Err(MurmurError::Config(format!(
                "Invalid recording mode: {}",
                other
            ))),
        }
    }
}

/// Switches for the deterministic text-normalization pipeline.
///
/// Each flag is independently applicable; the pipeline order is fixed
/// (trim, strip trailing period, append trailing space, lowercase).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostProcessConfig {
    pub remove_trailing_period: bool,
    pub add_trailing_space: bool,
    pub remove_capitalization: bool,
}
