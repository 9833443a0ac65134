use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MurmurError, Result};
use crate::types::{PostProcessConfig, RecordingMode, SUPPORTED_SAMPLE_RATES};

/// Top-level configuration for the Murmur dictation engine.
///
/// Loaded from a TOML file; every section and field falls back to its
/// default when absent, so a partial file is always accepted. Invalid values
/// (unknown recording mode, unsupported sample rate) fail fast at
/// [`MurmurConfig::validate`] — they are never silently replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MurmurConfig {
    /// Use the remote transcription API instead of the local model.
    pub use_api: bool,
    pub api: ApiOptions,
    pub local_model: LocalModelOptions,
    pub recording: RecordingConfig,
    pub output: OutputConfig,
    pub ui: UiConfig,
}

impl Default for MurmurConfig {
    fn default() -> Self {
        Self {
            use_api: false,
            api: ApiOptions::default(),
            local_model: LocalModelOptions::default(),
            recording: RecordingConfig::default(),
            output: OutputConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl MurmurConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// parsed values fail validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MurmurConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file is absent.
    ///
    /// A file that exists but fails to parse or validate is still an error;
    /// only a missing file defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            warn!(
                "Config file {} not found; using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| MurmurError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_SAMPLE_RATES.contains(&self.recording.sample_rate) {
            return Err(MurmurError::Config(format!(
                "Unsupported sample rate {} (supported: {:?})",
                self.recording.sample_rate, SUPPORTED_SAMPLE_RATES
            )));
        }
        if self.recording.silence_duration_ms == 0 {
            return Err(MurmurError::Config(
                "silence_duration_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// The post-processing switches as a standalone config value.
    pub fn post_process(&self) -> PostProcessConfig {
        PostProcessConfig {
            remove_trailing_period: self.output.remove_trailing_period,
            add_trailing_space: self.output.add_trailing_space,
            remove_capitalization: self.output.remove_capitalization,
        }
    }
}

/// Options for the remote transcription API backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiOptions {
    /// Model identifier sent with each request.
    pub model: String,
    /// Language code, or None for auto-detection.
    pub language: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Optional prompt biasing the transcription.
    pub initial_prompt: Option<String>,
}

impl Default for ApiOptions {
    fn default() -> Self {
        Self {
            model: "whisper-1".to_string(),
            language: None,
            temperature: 0.0,
            initial_prompt: None,
        }
    }
}

/// Options for the local transcription model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalModelOptions {
    /// Model size or path (e.g. "base", or a GGML file path).
    pub model: String,
    /// Preferred compute device: "auto", "gpu", or "cpu".
    pub device: String,
    /// Compute type hint (e.g. "auto", "int8", "float16").
    pub compute_type: String,
    /// Language code, or None for auto-detection.
    pub language: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Optional prompt biasing the transcription.
    pub initial_prompt: Option<String>,
    /// Feed previous output back into the decoder as context.
    pub condition_on_previous_text: bool,
    /// Drop non-speech frames from the artifact before decoding.
    pub vad_filter: bool,
}

impl Default for LocalModelOptions {
    fn default() -> Self {
        Self {
            model: "base".to_string(),
            device: "auto".to_string(),
            compute_type: "auto".to_string(),
            language: None,
            temperature: 0.0,
            initial_prompt: None,
            condition_on_previous_text: true,
            vad_filter: false,
        }
    }
}

/// Capture-loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Shortcut descriptor consumed by the hosting hotkey layer.
    pub activation_key: String,
    /// How the session decides when to stop.
    pub mode: RecordingMode,
    /// Input device name (case-insensitive substring), or None for default.
    pub sound_device: Option<String>,
    /// Capture sample rate in Hz.
    pub sample_rate: u32,
    /// Consecutive silence that ends a voice-activity session, in ms.
    pub silence_duration_ms: u32,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            activation_key: "ctrl+shift+space".to_string(),
            mode: RecordingMode::VoiceActivityDetection,
            sound_device: None,
            sample_rate: 16000,
            silence_duration_ms: 900,
        }
    }
}

/// Text output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Delay between injected keystrokes, in seconds (consumed downstream).
    pub writing_key_press_delay_secs: f64,
    pub remove_trailing_period: bool,
    pub add_trailing_space: bool,
    pub remove_capitalization: bool,
    /// Play a completion sound after text is delivered.
    pub noise_on_completion: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            writing_key_press_delay_secs: 0.008,
            remove_trailing_period: true,
            add_trailing_space: false,
            remove_capitalization: false,
            noise_on_completion: false,
        }
    }
}

/// Status-surface configuration (downstream only).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub print_to_terminal: bool,
    pub hide_status_window: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            print_to_terminal: true,
            hide_status_window: false,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
