pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use config::MurmurConfig;
pub use error::{MurmurError, Result};
pub use events::{StatusEvent, StatusKind, StatusReporter, StatusSink};
pub use types::*;
