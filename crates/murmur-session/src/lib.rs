//! Murmur session crate - the recording session engine.
//!
//! Drives the mode-aware capture loop over frames from an audio source,
//! applies speech-activity gating and cooperative cancellation, and hands
//! the finished artifact to a transcription backend through the
//! [`SessionController`].

pub mod cancel;
pub mod control;
pub mod controller;
pub mod session;

pub use cancel::CancellationToken;
pub use control::{ActivationControl, HotkeyControl, ScriptedControl};
pub use controller::SessionController;
pub use session::{RecordingSession, SessionOutcome};
