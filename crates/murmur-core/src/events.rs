//! Status events emitted at each phase transition of a dictation session.
//!
//! Events flow through an injected [`StatusSink`] rather than a process-wide
//! logger, so a hosting application can route them to a status window, a
//! terminal printer, or nothing at all. The consumer may be absent; emitting
//! into a [`StatusReporter`] with no sink is a no-op.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The phase a status event describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// The capture loop is running.
    Recording,
    /// A finished artifact was handed to the transcription backend.
    Transcribing,
    /// The session was cancelled before producing an artifact.
    Cancel,
    /// Capture or transcription failed; the session yields no text.
    Error,
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusKind::Recording => "recording",
            StatusKind::Transcribing => "transcribing",
            StatusKind::Cancel => "cancel",
            StatusKind::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// One entry in the ordered status stream consumed by an external sink.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub kind: StatusKind,
    pub message: String,
}

impl StatusEvent {
    pub fn new(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Consumer of the status stream.
///
/// Implementations must tolerate being called from a worker task and must
/// not block the capture loop.
pub trait StatusSink: Send + Sync {
    fn emit(&self, event: StatusEvent);
}

/// Status sink that forwards events into a tokio unbounded channel.
///
/// Preserves emission order. A dropped receiver is tolerated silently so a
/// status window closing mid-session never fails the session itself.
#[derive(Clone, Debug)]
pub struct ChannelStatusSink {
    tx: tokio::sync::mpsc::UnboundedSender<StatusEvent>,
}

impl ChannelStatusSink {
    /// Create a sink and the receiver its events arrive on.
    pub fn new() -> (Self, tokio::sync::mpsc::UnboundedReceiver<StatusEvent>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StatusSink for ChannelStatusSink {
    fn emit(&self, event: StatusEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Status consumer gone; event dropped");
        }
    }
}

/// Handle the engine components use to report status.
///
/// Wraps an optional shared sink; cloning is cheap and `none()` produces a
/// reporter whose emissions vanish.
#[derive(Clone, Default)]
pub struct StatusReporter {
    sink: Option<Arc<dyn StatusSink>>,
}

impl StatusReporter {
    pub fn new(sink: Arc<dyn StatusSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// A reporter with no consumer attached.
    pub fn none() -> Self {
        Self { sink: None }
    }

    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    pub fn emit(&self, kind: StatusKind, message: impl Into<String>) {
        if let Some(ref sink) = self.sink {
            sink.emit(StatusEvent::new(kind, message));
        }
    }
}

impl fmt::Debug for StatusReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusReporter")
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_kind_display() {
        assert_eq!(StatusKind::Recording.to_string(), "recording");
        assert_eq!(StatusKind::Transcribing.to_string(), "transcribing");
        assert_eq!(StatusKind::Cancel.to_string(), "cancel");
        assert_eq!(StatusKind::Error.to_string(), "error");
    }

    #[tokio::test]
    async fn test_channel_sink_preserves_order() {
        let (sink, mut rx) = ChannelStatusSink::new();
        sink.emit(StatusEvent::new(StatusKind::Recording, "Recording..."));
        sink.emit(StatusEvent::new(StatusKind::Transcribing, "Transcribing..."));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.kind, StatusKind::Recording);
        assert_eq!(second.kind, StatusKind::Transcribing);
    }

    #[test]
    fn test_channel_sink_dropped_receiver_is_tolerated() {
        let (sink, rx) = ChannelStatusSink::new();
        drop(rx);
        // Must not panic.
        sink.emit(StatusEvent::new(StatusKind::Error, "Error"));
    }

    #[tokio::test]
    async fn test_reporter_with_sink() {
        let (sink, mut rx) = ChannelStatusSink::new();
        let reporter = StatusReporter::new(Arc::new(sink));
        assert!(reporter.has_sink());

        reporter.emit(StatusKind::Cancel, "");
        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, StatusKind::Cancel);
        assert_eq!(event.message, "");
    }

    #[test]
    fn test_reporter_without_sink_is_noop() {
        let reporter = StatusReporter::none();
        assert!(!reporter.has_sink());
        reporter.emit(StatusKind::Recording, "Recording...");
    }

    #[test]
    fn test_status_event_serde() {
        let event = StatusEvent::new(StatusKind::Transcribing, "Transcribing...");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"transcribing\""));
        let back: StatusEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
