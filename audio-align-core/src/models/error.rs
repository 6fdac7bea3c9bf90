use thiserror::Error;

/// Errors raised by the buffering and alignment core.
///
/// Channel closure and overruns are not errors: closure is reported as a
/// zero-length result and overruns are only counted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlignError {
    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("unknown streamline strategy: {0}")]
    UnknownStrategy(String),

    #[error("invalid audio format: {0}")]
    InvalidFormat(String),

    #[error("i/o error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, AlignError>;
