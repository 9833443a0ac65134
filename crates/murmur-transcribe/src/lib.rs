//! Murmur transcription crate - backends turning a finished audio artifact
//! into raw text, plus the deterministic text post-processor.
//!
//! The backend is a trait with exactly two production implementations, local
//! model and remote API, selected once at construction from configuration —
//! never branched on per call. A mock backend is provided for testing
//! without a model or network.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use murmur_audio::AudioArtifact;
use murmur_core::config::MurmurConfig;
use murmur_core::error::{MurmurError, Result};

pub mod local;
pub mod post_process;
pub mod remote;

pub use local::LocalModelBackend;
pub use post_process::post_process;
pub use remote::RemoteApiBackend;

/// Service turning one completed audio artifact into raw text.
///
/// Calls are synchronous from the session's point of view: one artifact in,
/// one text out, no streaming and no retry. A process-wide instance is
/// constructed once and shared read-only across sessions.
pub trait TranscriptionBackend: Send + Sync {
    fn transcribe(
        &self,
        artifact: &AudioArtifact,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// The two production backends behind one value, chosen at construction.
pub enum Backend {
    Local(LocalModelBackend),
    Remote(RemoteApiBackend),
}

impl Backend {
    /// Build the backend the configuration selects.
    ///
    /// This is the only place `use_api` is consulted; per-call code never
    /// branches on it.
    pub fn from_config(config: &MurmurConfig) -> Result<Self> {
        if config.use_api {
            Ok(Backend::Remote(RemoteApiBackend::from_env(
                config.api.clone(),
            )?))
        } else {
            Ok(Backend::Local(LocalModelBackend::new(
                config.local_model.clone(),
            )?))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Local(_) => "local",
            Backend::Remote(_) => "remote",
        }
    }
}

impl TranscriptionBackend for Backend {
    async fn transcribe(&self, artifact: &AudioArtifact) -> Result<String> {
        match self {
            Backend::Local(backend) => backend.transcribe(artifact).await,
            Backend::Remote(backend) => backend.transcribe(artifact).await,
        }
    }
}

/// Mock backend returning a fixed transcription. For tests.
///
/// Counts calls so tests can assert that cancelled or failed sessions never
/// dispatch a transcription.
#[derive(Clone, Debug)]
pub struct MockTranscriptionBackend {
    text: String,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockTranscriptionBackend {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A mock whose every call fails with a transcription error.
    pub fn failing() -> Self {
        Self {
            text: String::new(),
            fail: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl TranscriptionBackend for MockTranscriptionBackend {
    async fn transcribe(&self, _artifact: &AudioArtifact) -> Result<String> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.fail {
            Err(MurmurError::Transcription(
                "Mock transcription failure".to_string(),
            ))
        } else {
            Ok(self.text.clone())
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
