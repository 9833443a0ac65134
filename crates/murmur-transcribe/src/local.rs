//! Local transcription via whisper-rs (whisper.cpp bindings).
//!
//! When compiled with the `whisper` feature, loads a GGML model once and
//! runs speech-to-text inference on finished artifacts. Without the feature,
//! provides a stub that fails cleanly at transcribe time.
//!
//! Device selection happens at construction only: the preferred device is
//! attempted first and a failure falls back to CPU-only compute with a
//! logged warning. A session never changes compute paths mid-flight.

#[cfg(feature = "whisper")]
use std::path::Path;

use murmur_audio::AudioArtifact;
use murmur_core::config::LocalModelOptions;
use murmur_core::error::{MurmurError, Result};

use crate::TranscriptionBackend;

/// Transcription backend holding one loaded local model.
///
/// Construction is expensive (model load); the instance is meant to be
/// created once per process and reused read-only across sessions.
pub struct LocalModelBackend {
    #[cfg(feature = "whisper")]
    ctx: whisper_rs::WhisperContext,
    options: LocalModelOptions,
}

impl LocalModelBackend {
    /// Load the configured model, honoring the device preference.
    ///
    /// # Errors
    /// Returns `MurmurError::Transcription` if the model file doesn't exist
    /// or fails to load on every compute path.
    #[cfg(feature = "whisper")]
    pub fn new(options: LocalModelOptions) -> Result<Self> {
        use whisper_rs::{WhisperContext, WhisperContextParameters};

        let model_path = &options.model;
        if !Path::new(model_path).exists() {
            return Err(MurmurError::Transcription(format!(
                "Whisper model file not found: {}",
                model_path
            )));
        }

        tracing::info!(
            model = %model_path,
            device = %options.device,
            compute_type = %options.compute_type,
            "Loading local model"
        );

        let want_gpu = options.device != "cpu";
        let ctx = if want_gpu {
            let mut params = WhisperContextParameters::default();
            params.use_gpu(true);
            match WhisperContext::new_with_params(model_path, params) {
                Ok(ctx) => ctx,
                Err(e) => {
                    // Construction-time fallback only; transcribe never
                    // switches compute paths.
                    tracing::warn!(
                        error = %e,
                        device = %options.device,
                        "Model failed to load on preferred device; falling back to CPU"
                    );
                    let mut params = WhisperContextParameters::default();
                    params.use_gpu(false);
                    WhisperContext::new_with_params(model_path, params).map_err(|e| {
                        MurmurError::Transcription(format!("Failed to load model: {}", e))
                    })?
                }
            }
        } else {
            let mut params = WhisperContextParameters::default();
            params.use_gpu(false);
            WhisperContext::new_with_params(model_path, params).map_err(|e| {
                MurmurError::Transcription(format!("Failed to load model: {}", e))
            })?
        };

        tracing::info!("Local model loaded");
        Ok(Self { ctx, options })
    }

    /// Stub constructor when the `whisper` feature is disabled.
    #[cfg(not(feature = "whisper"))]
    pub fn new(options: LocalModelOptions) -> Result<Self> {
        tracing::warn!(
            "LocalModelBackend created without the `whisper` feature — transcription will fail"
        );
        Ok(Self { options })
    }

    pub fn options(&self) -> &LocalModelOptions {
        &self.options
    }
}

// ---------------------------------------------------------------------------
// Real implementation (whisper feature enabled)
// ---------------------------------------------------------------------------

#[cfg(feature = "whisper")]
impl TranscriptionBackend for LocalModelBackend {
    async fn transcribe(&self, artifact: &AudioArtifact) -> Result<String> {
        use whisper_rs::{FullParams, SamplingStrategy};

        let samples = read_artifact_samples(artifact)?;
        let samples = if self.options.vad_filter {
            filter_speech_frames(&samples, artifact.sample_rate())?
        } else {
            samples
        };

        if samples.is_empty() {
            tracing::debug!("VAD filter removed all audio; nothing to decode");
            return Ok(String::new());
        }

        let audio = samples_to_f32(&samples);
        tracing::debug!(
            samples = audio.len(),
            duration_secs = artifact.duration_secs(),
            "Starting local decode"
        );

        // Run inference (synchronous — whisper.cpp is CPU-bound).
        let mut state = self.ctx.create_state().map_err(|e| {
            MurmurError::Transcription(format!("Failed to create decoder state: {}", e))
        })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(self.options.language.as_deref());
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_temperature(self.options.temperature);
        params.set_no_context(!self.options.condition_on_previous_text);
        if let Some(ref prompt) = self.options.initial_prompt {
            params.set_initial_prompt(prompt);
        }

        state
            .full(params, &audio)
            .map_err(|e| MurmurError::Transcription(format!("Decode failed: {}", e)))?;

        let n_segments = state.full_n_segments().map_err(|e| {
            MurmurError::Transcription(format!("Failed to get segment count: {}", e))
        })?;

        // Concatenate segment texts in decoder order, no reordering.
        let mut text = String::new();
        for i in 0..n_segments {
            let segment = state.full_get_segment_text(i).map_err(|e| {
                MurmurError::Transcription(format!("Failed to get segment {}: {}", i, e))
            })?;
            text.push_str(&segment);
        }

        tracing::info!(segments = n_segments, text_len = text.len(), "Decode complete");
        Ok(text)
    }
}

// ---------------------------------------------------------------------------
// Stub implementation (whisper feature disabled)
// ---------------------------------------------------------------------------

#[cfg(not(feature = "whisper"))]
impl TranscriptionBackend for LocalModelBackend {
    async fn transcribe(&self, _artifact: &AudioArtifact) -> Result<String> {
        Err(MurmurError::Transcription(
            "Local transcription requires the `whisper` feature to be enabled".to_string(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Artifact decoding helpers
// ---------------------------------------------------------------------------

/// Read the artifact's 16-bit PCM samples back from disk.
#[cfg_attr(not(feature = "whisper"), allow(dead_code))]
fn read_artifact_samples(artifact: &AudioArtifact) -> Result<Vec<i16>> {
    let mut reader = hound::WavReader::open(artifact.path())
        .map_err(|e| MurmurError::Transcription(format!("Failed to open artifact: {}", e)))?;
    reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<i16>, _>>()
        .map_err(|e| MurmurError::Transcription(format!("Failed to read artifact: {}", e)))
}

/// Convert 16-bit PCM to the f32 range the decoder expects.
#[cfg_attr(not(feature = "whisper"), allow(dead_code))]
fn samples_to_f32(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32768.0).collect()
}

/// Keep only the 30 ms frames the speech classifier marks as speech.
///
/// An incomplete trailing chunk is always kept — it is too short to
/// classify.
#[cfg_attr(not(feature = "whisper"), allow(dead_code))]
fn filter_speech_frames(samples: &[i16], sample_rate: u32) -> Result<Vec<i16>> {
    use murmur_audio::{samples_per_frame, AudioFrame, SpeechDetector, WebRtcSpeechDetector};

    let frame_len = samples_per_frame(sample_rate);
    let mut detector = WebRtcSpeechDetector::new(sample_rate)?;
    let mut kept = Vec::with_capacity(samples.len());

    for chunk in samples.chunks(frame_len) {
        if chunk.len() < frame_len {
            kept.extend_from_slice(chunk);
            continue;
        }
        let frame = AudioFrame::new(chunk.to_vec(), sample_rate)?;
        if detector.is_speech(&frame)? {
            kept.extend_from_slice(chunk);
        }
    }

    Ok(kept)
}

// =============================================================================
// Tests
// =============================================================================
