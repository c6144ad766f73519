//! Error types shared across the relay.

/// Result type alias for the relay
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the relay
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Landmark source error: {0}")]
    Source(#[from] SourceError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
}

/// Failures while acquiring frames from the landmark source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to start detector `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("detector did not signal ready (got {0:?})")]
    NotReady(String),

    #[error("detector stream closed")]
    Closed,

    #[error("frame read failed: {0}")]
    Read(#[from] std::io::Error),

    #[error("malformed frame on line {line}: {source}")]
    Malformed {
        line: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid frame on line {line}: {reason}")]
    InvalidFrame { line: u64, reason: String },

    #[error("invalid replay rate {0} fps")]
    InvalidFps(f32),

    #[error("detector reported: {0}")]
    Detector(String),
}
