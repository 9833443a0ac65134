//! The finished audio artifact of a completed session.
//!
//! A mono 16-bit little-endian PCM WAV file at the session's sample rate,
//! written to a named temporary file whose lifetime is tied to the artifact
//! value: create → consume → delete. Dropping the artifact removes the file,
//! so finished recordings never accumulate on disk.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use tempfile::NamedTempFile;
use tracing::debug;

use murmur_core::error::{MurmurError, Result};

/// A completed recording, serialized as a WAV temp file.
#[derive(Debug)]
pub struct AudioArtifact {
    file: NamedTempFile,
    sample_rate: u32,
    num_samples: usize,
}

impl AudioArtifact {
    /// Serialize accumulated session samples into a WAV temp file.
    ///
    /// # Errors
    /// Returns `MurmurError::Capture` for an empty sample buffer (a session
    /// only produces an artifact from a non-empty recording) or a failed
    /// write.
    pub fn from_samples(samples: &[i16], sample_rate: u32) -> Result<Self> {
        if samples.is_empty() {
            return Err(MurmurError::Capture(
                "Cannot serialize an empty recording".to_string(),
            ));
        }

        let file = tempfile::Builder::new()
            .prefix("murmur-")
            .suffix(".wav")
            .tempfile()?;

        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(file.path(), spec)
            .map_err(|e| MurmurError::Capture(format!("Failed to create WAV file: {}", e)))?;
        for &sample in samples {
            writer
                .write_sample(sample)
                .map_err(|e| MurmurError::Capture(format!("Failed to write WAV data: {}", e)))?;
        }
        writer
            .finalize()
            .map_err(|e| MurmurError::Capture(format!("Failed to finalize WAV file: {}", e)))?;

        debug!(
            path = %file.path().display(),
            samples = samples.len(),
            sample_rate,
            "Audio artifact written"
        );

        Ok(Self {
            file,
            sample_rate,
            num_samples: samples.len(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn duration_secs(&self) -> f32 {
        self.num_samples as f32 / self.sample_rate as f32
    }
}

// =============================================================================
// Tests
// =============================================================================
