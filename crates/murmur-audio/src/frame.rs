//! The fixed-duration audio frame, atomic unit of the capture loop.

use murmur_core::error::{MurmurError, Result};

/// Duration of one frame in milliseconds.
///
/// Fixed at 30 ms — the longest window the speech classifier accepts, and
/// the granularity at which cancellation and mode rules are evaluated.
pub const FRAME_DURATION_MS: u32 = 30;

/// Number of samples in one frame at the given sample rate.
///
/// Exact for every supported rate (all are multiples of 1000/30).
pub fn samples_per_frame(sample_rate: u32) -> usize {
    (sample_rate as usize * FRAME_DURATION_MS as usize) / 1000
}

/// One 30 ms block of mono signed 16-bit samples.
///
/// Invariant: `samples.len() == samples_per_frame(sample_rate)`. All frames
/// within a session share the same sample rate and length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl AudioFrame {
    /// Build a frame from raw samples, enforcing the length invariant.
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Result<Self> {
        let expected = samples_per_frame(sample_rate);
        if samples.len() != expected {
            return Err(MurmurError::Capture(format!(
                "Frame has {} samples, expected {} at {} Hz",
                samples.len(),
                expected,
                sample_rate
            )));
        }
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// A frame with every sample set to `value`. Handy in tests and for the
    /// amplitude-based mock detector.
    pub fn filled(sample_rate: u32, value: i16) -> Self {
        Self {
            samples: vec![value; samples_per_frame(sample_rate)],
            sample_rate,
        }
    }

    /// An all-zero (silent) frame.
    pub fn silent(sample_rate: u32) -> Self {
        Self::filled(sample_rate, 0)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
