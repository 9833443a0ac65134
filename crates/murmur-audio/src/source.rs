//! Frame source abstraction and the scripted implementation for tests.

use tokio::sync::mpsc;

use murmur_core::error::Result;

use crate::frame::AudioFrame;

/// One item on the frame channel: a captured frame, or an in-band stream
/// failure the consumer reports as a capture error.
pub type FrameResult = Result<AudioFrame>;

/// Capacity of the callback→consumer frame channel, in frames (~1 s).
///
/// The device callback never blocks; if the consumer falls this far behind,
/// frames are dropped and counted rather than buffered without bound.
pub const FRAME_CHANNEL_CAPACITY: usize = 32;

/// Source of fixed-duration audio frames.
///
/// `open` starts delivery into a bounded, ordered channel and returns the
/// receiving end; the single consumer owns the receiver for the session's
/// lifetime. A channel that closes while the stream should still be live, or
/// an `Err` item, signals stream failure. `close` stops delivery.
pub trait AudioFrameSource: Send {
    fn open(&mut self) -> Result<mpsc::Receiver<FrameResult>>;
    fn close(&mut self);
}

/// Frame source that replays a programmed sequence. For tests.
///
/// The whole script is queued on open. By default the channel is held open
/// after the script runs out (as a live microphone would keep the stream
/// alive); `close_after_script` drops the sender instead so the consumer
/// observes end-of-stream.
pub struct ScriptedFrameSource {
    script: Vec<FrameResult>,
    hold_open: bool,
    keepalive: Option<mpsc::Sender<FrameResult>>,
}

impl ScriptedFrameSource {
    /// A source that delivers the given frames in order, then stays open.
    pub fn new(frames: Vec<AudioFrame>) -> Self {
        Self {
            script: frames.into_iter().map(Ok).collect(),
            hold_open: true,
            keepalive: None,
        }
    }

    /// A source with explicit per-item results, for injecting stream errors.
    pub fn with_script(script: Vec<FrameResult>) -> Self {
        Self {
            script,
            hold_open: true,
            keepalive: None,
        }
    }

    /// Drop the sender once the script is queued, so the consumer sees the
    /// stream end after the last item.
    pub fn close_after_script(mut self) -> Self {
        self.hold_open = false;
        self
    }
}

impl AudioFrameSource for ScriptedFrameSource {
    fn open(&mut self) -> Result<mpsc::Receiver<FrameResult>> {
        let (tx, rx) = mpsc::channel(self.script.len().max(1) + 1);
        for item in self.script.drain(..) {
            // Capacity covers the whole script; try_send cannot fail here.
            let _ = tx.try_send(item);
        }
        if self.hold_open {
            self.keepalive = Some(tx);
        }
        Ok(rx)
    }

    fn close(&mut self) {
        self.keepalive = None;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::error::MurmurError;

    #[tokio::test]
    async fn test_scripted_source_delivers_in_order() {
        let frames = vec![
            AudioFrame::filled(16000, 1),
            AudioFrame::filled(16000, 2),
            AudioFrame::filled(16000, 3),
        ];
        let mut source = ScriptedFrameSource::new(frames);
        let mut rx = source.open().unwrap();

        for expected in 1..=3i16 {
            let frame = rx.recv().await.unwrap().unwrap();
            assert_eq!(frame.samples[0], expected);
        }
    }

    #[tokio::test]
    async fn test_scripted_source_stays_open_until_closed() {
        let mut source = ScriptedFrameSource::new(vec![AudioFrame::silent(16000)]);
        let mut rx = source.open().unwrap();

        assert!(rx.recv().await.unwrap().is_ok());
        // Script exhausted but the stream is still live.
        assert!(rx.try_recv().is_err());

        source.close();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_scripted_source_close_after_script() {
        let mut source =
            ScriptedFrameSource::new(vec![AudioFrame::silent(16000)]).close_after_script();
        let mut rx = source.open().unwrap();

        assert!(rx.recv().await.unwrap().is_ok());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_scripted_source_delivers_errors_in_band() {
        let mut source = ScriptedFrameSource::with_script(vec![
            Ok(AudioFrame::silent(16000)),
            Err(MurmurError::Capture("device unplugged".to_string())),
        ]);
        let mut rx = source.open().unwrap();

        assert!(rx.recv().await.unwrap().is_ok());
        let err = rx.recv().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("device unplugged"));
    }
}
