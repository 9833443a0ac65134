//! Remote transcription over an OpenAI-compatible HTTP API.
//!
//! Uploads the finished artifact as multipart form data and returns the
//! response's `text` field verbatim. Endpoint and credentials come from the
//! environment; any transport or auth failure surfaces as a transcription
//! error and is never retried.

use serde::Deserialize;

use murmur_audio::AudioArtifact;
use murmur_core::config::ApiOptions;
use murmur_core::error::{MurmurError, Result};

use crate::TranscriptionBackend;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Join the transcriptions route onto a configured base URL.
fn transcription_endpoint(base_url: &str) -> String {
    format!("{}/audio/transcriptions", base_url.trim_end_matches('/'))
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcription backend calling a remote speech-to-text API.
pub struct RemoteApiBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    options: ApiOptions,
}

impl RemoteApiBackend {
    /// Build a backend from explicit endpoint and credentials.
    pub fn new(base_url: impl AsRef<str>, api_key: impl Into<String>, options: ApiOptions) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: transcription_endpoint(base_url.as_ref()),
            api_key: api_key.into(),
            options,
        }
    }

    /// Build a backend from `OPENAI_API_KEY` / `OPENAI_BASE_URL`.
    ///
    /// # Errors
    /// Returns `MurmurError::Config` when the key is missing — fail fast at
    /// startup rather than on the first session.
    pub fn from_env(options: ApiOptions) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            MurmurError::Config("OPENAI_API_KEY is not set".to_string())
        })?;
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        tracing::info!(endpoint = %transcription_endpoint(&base_url), "Remote backend configured");
        Ok(Self::new(base_url, api_key, options))
    }

    pub fn options(&self) -> &ApiOptions {
        &self.options
    }
}

impl TranscriptionBackend for RemoteApiBackend {
    async fn transcribe(&self, artifact: &AudioArtifact) -> Result<String> {
        let bytes = tokio::fs::read(artifact.path()).await?;
        tracing::debug!(
            bytes = bytes.len(),
            duration_secs = artifact.duration_secs(),
            "Uploading artifact"
        );

        let file_part = reqwest::multipart::Part::bytes(bytes)
            .file_name("artifact.wav")
            .mime_str("audio/wav")
            .map_err(|e| MurmurError::Transcription(format!("Invalid upload part: {}", e)))?;

        let mut form = reqwest::multipart::Form::new()
            .text("model", self.options.model.clone())
            .text("temperature", self.options.temperature.to_string())
            .part("file", file_part);
        if let Some(ref language) = self.options.language {
            form = form.text("language", language.clone());
        }
        if let Some(ref prompt) = self.options.initial_prompt {
            form = form.text("prompt", prompt.clone());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| MurmurError::Transcription(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MurmurError::Transcription(format!(
                "API returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let payload: TranscriptionResponse = response.json().await.map_err(|e| {
            MurmurError::Transcription(format!("Malformed API response: {}", e))
        })?;

        tracing::info!(text_len = payload.text.len(), "Remote transcription complete");
        Ok(payload.text)
    }
}

// =============================================================================
// Tests
// =============================================================================
