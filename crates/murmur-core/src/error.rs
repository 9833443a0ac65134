use thiserror::Error;

/// Top-level error type for the Murmur engine.
///
/// Each variant wraps a subsystem-specific failure. Subsystem crates map
/// their library errors into these variants so that the `?` operator works
/// seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MurmurError {
    /// Invalid configuration — fatal at startup, never silently defaulted.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio device unavailable or stream failure during recording.
    #[error("Capture error: {0}")]
    Capture(String),

    /// Local decode failure or remote transport/auth failure.
    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for MurmurError {
    fn from(err: toml::de::Error) -> Self {
        MurmurError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MurmurError {
    fn from(err: toml::ser::Error) -> Self {
        MurmurError::Config(err.to_string())
    }
}

/// A specialized `Result` type for Murmur operations.
pub type Result<T> = std::result::Result<T, MurmurError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MurmurError::Config("unsupported sample rate".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: unsupported sample rate"
        );

        let err = MurmurError::Capture("device lost".to_string());
        assert_eq!(err.to_string(), "Capture error: device lost");

        let err = MurmurError::Transcription("decode failed".to_string());
        assert_eq!(err.to_string(), "Transcription error: decode failed");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MurmurError = io_err.into();
        assert!(matches!(err, MurmurError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let parsed: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        let err: MurmurError = parsed.unwrap_err().into();
        assert!(matches!(err, MurmurError::Config(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success".to_string())
        }

        assert_eq!(inner().unwrap(), "success");
    }
}
