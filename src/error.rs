use std::io;
use thiserror::Error;

/// Result type for splicing operations
pub type SpliceResult<T> = Result<T, SpliceError>;

/// Error types for reading, segmenting, interleaving and writing audio
#[derive(Error, Debug)]
pub enum SpliceError {
    /// IO error (file operations, disk access)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// WAV reading or writing failed
    #[error("WAV error: {0}")]
    Wav(String),

    /// Container probing failed
    #[error("Probe error: {0}")]
    Probe(String),

    /// Input audio does not match the configured working format
    #[error("Format mismatch: expected {property} {expected}, got {got}")]
    FormatMismatch {
        /// Which property disagreed ("sample rate", "channel count", "bit depth")
        property: &'static str,
        /// Configured value
        expected: u32,
        /// Value found in the input
        got: u32,
    },

    /// Invalid sample rate
    #[error("Invalid sample rate: {rate}")]
    InvalidSampleRate {
        /// The invalid sample rate
        rate: u32,
    },

    /// Invalid channel configuration
    #[error("Invalid channel configuration: expected {expected}, got {got}")]
    InvalidChannels {
        /// Expected number of channels
        expected: u32,
        /// Got number of channels
        got: u32,
    },

    /// Unsupported bit depth
    #[error("Invalid bit depth: {bits}")]
    InvalidBitDepth {
        /// The invalid bit depth
        bits: u32,
    },

    /// Unsupported audio format or file extension
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// A buffer with no frames was handed to the engine
    #[error("Audio buffer is empty")]
    EmptyBuffer,

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// External transcoder failed
    #[error("Transcode error: {0}")]
    TranscodeError(String),

    /// The background worker panicked before returning
    #[error("Worker thread panicked")]
    WorkerPanicked,
}

impl From<symphonia::core::errors::Error> for SpliceError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        match err {
            symphonia::core::errors::Error::IoError(e) => SpliceError::Io(e),
            e => SpliceError::Probe(e.to_string()),
        }
    }
}

impl From<hound::Error> for SpliceError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => SpliceError::Io(e),
            e => SpliceError::Wav(e.to_string()),
        }
    }
}

impl From<toml::de::Error> for SpliceError {
    fn from(err: toml::de::Error) -> Self {
        SpliceError::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hound_io_error_is_unwrapped() {
        let err: SpliceError = hound::Error::IoError(io::Error::other("disk gone")).into();
        assert!(matches!(err, SpliceError::Io(_)));
    }

    #[test]
    fn test_format_mismatch_message() {
        let err = SpliceError::FormatMismatch {
            property: "sample rate",
            expected: 48000,
            got: 44100,
        };
        assert_eq!(
            err.to_string(),
            "Format mismatch: expected sample rate 48000, got 44100"
        );
    }
}
