//! Murmur application binary - composition root.
//!
//! Ties the engine crates together into a single executable:
//! 1. Load and validate configuration from TOML (fatal on invalid values)
//! 2. Construct the transcription backend once (local model or remote API)
//! 3. Print status events unless the status surface is hidden
//! 4. Drive sessions from stdin lines standing in for the global hotkey
//!    layer, which is an external collaborator of this engine
//!
//! Line mapping per recording mode: the first line activates a session;
//! during a session a line is the toggle signal (press_to_toggle), the key
//! release (hold_to_record), or a cancellation (voice_activity_detection,
//! continuous).

use std::path::PathBuf;
use std::pin::pin;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use murmur_audio::{list_input_devices, CpalFrameSource};
use murmur_core::config::MurmurConfig;
use murmur_core::events::{ChannelStatusSink, StatusReporter};
use murmur_core::types::RecordingMode;
use murmur_session::{CancellationToken, HotkeyControl, SessionController};
use murmur_transcribe::Backend;

#[derive(Parser, Debug)]
#[command(name = "murmur", about = "Push-to-talk dictation engine")]
struct Args {
    /// Path to the configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// List available input devices and exit.
    #[arg(long)]
    list_devices: bool,
}

/// Resolve the config file path (MURMUR_CONFIG env, or ~/.murmur/config.toml).
fn config_path(args: &Args) -> PathBuf {
    if let Some(ref path) = args.config {
        return path.clone();
    }
    if let Ok(path) = std::env::var("MURMUR_CONFIG") {
        return PathBuf::from(path);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".murmur").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    if args.list_devices {
        for name in list_input_devices()? {
            println!("{}", name);
        }
        return Ok(());
    }

    tracing::info!("Starting Murmur v{}", env!("CARGO_PKG_VERSION"));

    // Config. Invalid values are fatal; only a missing file defaults.
    let config_file = config_path(&args);
    let config = MurmurConfig::load_or_default(&config_file)?;
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    let backend_kind = if config.use_api { "the remote API" } else { "a local model" };
    tracing::info!(
        mode = %config.recording.mode,
        activation_key = %config.recording.activation_key,
        "Transcription runs on {}; a line on stdin stands in for the activation key",
        backend_kind
    );

    // Backend is constructed once and reused read-only across sessions;
    // reloading a local model per session is deliberately not supported.
    let backend = Backend::from_config(&config)?;

    // Status surface.
    let reporter = if config.ui.hide_status_window {
        StatusReporter::none()
    } else {
        let (sink, mut events) = ChannelStatusSink::new();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                eprintln!("[murmur] {}: {}", event.kind, event.message);
            }
        });
        StatusReporter::new(std::sync::Arc::new(sink))
    };

    let mode = config.recording.mode;
    let print_to_terminal = config.ui.print_to_terminal;
    let noise_on_completion = config.output.noise_on_completion;

    let mut source = CpalFrameSource::new(
        config.recording.sound_device.clone(),
        config.recording.sample_rate,
    );
    let mut controller = SessionController::from_config(backend, &config, reporter);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    tracing::info!("Ready; press Enter to start a session (ctrl-d to exit)");

    while let Some(_activation) = lines.next_line().await? {
        let control = HotkeyControl::new();
        control.set_asserted(true);
        let cancel = CancellationToken::new();

        let mut session = pin!(controller.record_and_transcribe(
            &mut source,
            control.clone(),
            cancel.clone(),
        ));

        // Forward further stdin lines into the session as control signals
        // until the session reaches a terminal outcome.
        let text = loop {
            tokio::select! {
                text = &mut session => break text,
                line = lines.next_line() => match line {
                    Ok(Some(_)) => match mode {
                        RecordingMode::PressToToggle => control.signal_toggle(),
                        RecordingMode::HoldToRecord => control.set_asserted(false),
                        RecordingMode::VoiceActivityDetection | RecordingMode::Continuous => {
                            cancel.cancel()
                        }
                    },
                    // stdin closed mid-session: cancel and wind down.
                    _ => cancel.cancel(),
                },
            }
        };

        if !text.is_empty() {
            if print_to_terminal {
                println!("{}", text);
            }
            if noise_on_completion {
                // Terminal bell; keystroke injection and audio feedback are
                // downstream collaborators, not part of this engine.
                eprint!("\x07");
            }
        }
    }

    tracing::info!("Exiting");
    Ok(())
}
