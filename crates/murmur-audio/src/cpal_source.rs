//! Real microphone capture via cpal.
//!
//! The cpal stream is not `Send`, so it lives on a dedicated worker thread
//! for the whole session. The device callback assembles exact 30 ms frames
//! and pushes them over a bounded channel; the consumer loop never shares a
//! mutable buffer with the callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use murmur_core::error::{MurmurError, Result};

use crate::frame::{samples_per_frame, AudioFrame};
use crate::source::{AudioFrameSource, FrameResult, FRAME_CHANNEL_CAPACITY};

/// List the names of all available input devices.
pub fn list_input_devices() -> Result<Vec<String>> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| MurmurError::Capture(format!("Failed to enumerate devices: {}", e)))?;
    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

/// Frame source backed by a cpal input stream.
///
/// Opens the configured device (case-insensitive substring match, or the
/// default input device) as mono 16-bit at the configured rate, converting
/// from f32 and downmixing multi-channel input in the callback when the
/// hardware does not deliver that natively.
pub struct CpalFrameSource {
    device_name: Option<String>,
    sample_rate: u32,
    shutdown: Arc<AtomicBool>,
    worker: Option<std::thread::JoinHandle<()>>,
}

impl CpalFrameSource {
    pub fn new(device_name: Option<String>, sample_rate: u32) -> Self {
        Self {
            device_name,
            sample_rate,
            shutdown: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

impl AudioFrameSource for CpalFrameSource {
    fn open(&mut self) -> Result<mpsc::Receiver<FrameResult>> {
        if self.worker.is_some() {
            return Err(MurmurError::Capture(
                "Frame source is already open".to_string(),
            ));
        }

        let (tx, rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<()>>();

        self.shutdown.store(false, Ordering::Relaxed);
        let shutdown = Arc::clone(&self.shutdown);
        let device_name = self.device_name.clone();
        let sample_rate = self.sample_rate;

        let worker = std::thread::spawn(move || {
            run_capture(device_name, sample_rate, tx, shutdown, ready_tx);
        });

        // Wait for the worker to report whether the stream opened. A device
        // that cannot be opened surfaces here; no retry is attempted.
        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.worker = Some(worker);
                Ok(rx)
            }
            Ok(Err(e)) => {
                let _ = worker.join();
                Err(e)
            }
            Err(_) => {
                let _ = worker.join();
                Err(MurmurError::Capture(
                    "Capture worker exited before opening the stream".to_string(),
                ))
            }
        }
    }

    fn close(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        debug!("Frame source closed");
    }
}

impl Drop for CpalFrameSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Worker-thread body: build the stream, report readiness, then keep the
/// stream alive until shutdown is requested.
fn run_capture(
    device_name: Option<String>,
    sample_rate: u32,
    tx: mpsc::Sender<FrameResult>,
    shutdown: Arc<AtomicBool>,
    ready_tx: std::sync::mpsc::Sender<Result<()>>,
) {
    let stream = match build_stream(device_name, sample_rate, tx) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(MurmurError::Capture(format!(
            "Failed to start audio stream: {}",
            e
        ))));
        return;
    }
    let _ = ready_tx.send(Ok(()));

    while !shutdown.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(10));
    }
    drop(stream);
}

/// Accumulates mono samples from the device callback and emits exact frames.
struct FrameAssembler {
    pending: Vec<i16>,
    frame_len: usize,
    sample_rate: u32,
    tx: mpsc::Sender<FrameResult>,
    dropped: u64,
}

impl FrameAssembler {
    fn new(sample_rate: u32, tx: mpsc::Sender<FrameResult>) -> Self {
        let frame_len = samples_per_frame(sample_rate);
        Self {
            pending: Vec::with_capacity(frame_len * 2),
            frame_len,
            sample_rate,
            tx,
            dropped: 0,
        }
    }

    fn extend(&mut self, samples: impl Iterator<Item = i16>) {
        self.pending.extend(samples);
        while self.pending.len() >= self.frame_len {
            let rest = self.pending.split_off(self.frame_len);
            let samples = std::mem::replace(&mut self.pending, rest);
            let frame = AudioFrame {
                samples,
                sample_rate: self.sample_rate,
            };
            match self.tx.try_send(Ok(frame)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    self.dropped += 1;
                    if self.dropped % FRAME_CHANNEL_CAPACITY as u64 == 1 {
                        warn!(dropped = self.dropped, "Consumer behind; dropping frames");
                    }
                }
                // Consumer finished; the stream is about to be torn down.
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
    }
}

fn build_stream(
    device_name: Option<String>,
    sample_rate: u32,
    tx: mpsc::Sender<FrameResult>,
) -> Result<cpal::Stream> {
    let host = cpal::default_host();

    let device = match device_name {
        None => host
            .default_input_device()
            .ok_or_else(|| MurmurError::Capture("No default input device found".to_string()))?,
        Some(name) => {
            let name_lower = name.to_lowercase();
            host.input_devices()
                .map_err(|e| MurmurError::Capture(format!("Failed to enumerate devices: {}", e)))?
                .find(|d| {
                    d.name()
                        .map(|n| n.to_lowercase().contains(&name_lower))
                        .unwrap_or(false)
                })
                .ok_or_else(|| {
                    MurmurError::Capture(format!("Audio device '{}' not found", name))
                })?
        }
    };

    let resolved_name = device.name().unwrap_or_else(|_| "unknown".to_string());
    debug!(device = %resolved_name, "Selected audio device");

    let supported = device.default_input_config().map_err(|e| {
        MurmurError::Capture(format!("Failed to query device config: {}", e))
    })?;
    let channels = supported.channels();
    let sample_format = supported.sample_format();

    let config = cpal::StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    info!(
        device = %resolved_name,
        sample_rate,
        channels,
        format = ?sample_format,
        "Opening input stream"
    );

    let mut assembler = FrameAssembler::new(sample_rate, tx.clone());
    let err_tx = tx;
    let err_fn = move |e: cpal::StreamError| {
        warn!(error = %e, "Audio stream error");
        let _ = err_tx.try_send(Err(MurmurError::Capture(format!(
            "Audio stream error: {}",
            e
        ))));
    };

    let stride = channels as usize;
    let stream = match sample_format {
        cpal::SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                assembler.extend(data.iter().step_by(stride).copied());
            },
            err_fn,
            None,
        ),
        cpal::SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                assembler.extend(
                    data.iter()
                        .step_by(stride)
                        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16),
                );
            },
            err_fn,
            None,
        ),
        cpal::SampleFormat::U16 => device.build_input_stream(
            &config,
            move |data: &[u16], _: &cpal::InputCallbackInfo| {
                assembler.extend(
                    data.iter()
                        .step_by(stride)
                        .map(|&s| (s as i32 - 32768) as i16),
                );
            },
            err_fn,
            None,
        ),
        other => {
            return Err(MurmurError::Capture(format!(
                "Unsupported sample format: {:?}",
                other
            )))
        }
    };

    stream.map_err(|e| MurmurError::Capture(format!("Failed to build input stream: {}", e)))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_unknown_device_fails_without_retry() {
        // Fails to match any device (or to enumerate at all on headless
        // machines); either way the open surfaces a capture error.
        let mut source =
            CpalFrameSource::new(Some("murmur-no-such-device-xyzzy".to_string()), 16000);
        let result = source.open();
        assert!(matches!(result, Err(MurmurError::Capture(_))));
    }

    #[tokio::test]
    async fn test_frame_assembler_emits_exact_frames() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut assembler = FrameAssembler::new(16000, tx);

        // 480 samples per frame at 16 kHz; feed 1000 samples in two bursts.
        assembler.extend((0..700).map(|i| i as i16));
        assembler.extend((700..1000).map(|i| i as i16));

        let first = rx.try_recv().unwrap().unwrap();
        assert_eq!(first.len(), 480);
        assert_eq!(first.samples[0], 0);
        assert_eq!(first.samples[479], 479);

        let second = rx.try_recv().unwrap().unwrap();
        assert_eq!(second.len(), 480);
        assert_eq!(second.samples[0], 480);

        // 40 samples remain pending; no partial frame is emitted.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_frame_assembler_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut assembler = FrameAssembler::new(8000, tx);

        // Three full frames into a single-slot channel: two are dropped.
        assembler.extend(std::iter::repeat(7i16).take(240 * 3));
        assert_eq!(assembler.dropped, 2);

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
