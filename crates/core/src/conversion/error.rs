//! Error types for the conversion module.

use std::path::PathBuf;
use thiserror::Error;

use crate::download::FetchError;
use crate::engine::EngineError;

/// Errors a layer codec can report.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The codec does not handle this kind of input or output.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// The data could not be decoded.
    #[error("Invalid {format} data: {reason}")]
    Invalid { format: String, reason: String },

    /// I/O error while reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Creates an invalid data error.
    pub fn invalid(format: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            format: format.into(),
            reason: reason.into(),
        }
    }
}

/// Which kind of failure ended a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Engine binary not located.
    Configuration,
    /// The OS refused to create the child process.
    Spawn,
    /// Reading the child's output failed.
    EngineIo,
    /// Child exited non-zero under strict exit checking.
    EngineFailed,
    Cancelled,
    TimedOut,
    /// A temp file could not be created.
    Staging,
    /// The decoder rejected the produced artifact.
    Decode,
    /// The layer could not be written out for the engine.
    Export,
    /// The download collaborator reported failure.
    Fetch,
    /// The request named nothing to convert.
    MalformedRequest,
}

/// Errors that can occur during a conversion.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Locating or running the engine failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A temp file could not be created.
    #[error("Failed to stage temporary file: {0}")]
    Staging(#[source] std::io::Error),

    /// The decoder rejected the staged artifact.
    #[error("Failed to decode {format} data: {source}")]
    Decode {
        format: String,
        #[source]
        source: CodecError,
    },

    /// Writing the layer out for the engine failed.
    #[error("Failed to export layer to {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// Downloading the input failed.
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    /// The request did not name anything to convert.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
}

impl ConversionError {
    /// Creates a decode error for the given format.
    pub fn decode(format: impl Into<String>, source: CodecError) -> Self {
        Self::Decode {
            format: format.into(),
            source,
        }
    }

    /// Creates a malformed request error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRequest(reason.into())
    }

    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Engine(e) => match e {
                EngineError::NotFound => ErrorKind::Configuration,
                EngineError::Spawn { .. } => ErrorKind::Spawn,
                EngineError::Io(_) => ErrorKind::EngineIo,
                EngineError::ExitStatus { .. } => ErrorKind::EngineFailed,
                EngineError::Cancelled => ErrorKind::Cancelled,
                EngineError::TimedOut { .. } => ErrorKind::TimedOut,
            },
            Self::Staging(_) => ErrorKind::Staging,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::Export { .. } => ErrorKind::Export,
            Self::Fetch { .. } => ErrorKind::Fetch,
            Self::MalformedRequest(_) => ErrorKind::MalformedRequest,
        }
    }

    /// Whether running the same conversion again might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Engine(EngineError::TimedOut { .. }) | Self::Engine(EngineError::Io(_)) => true,
            Self::Fetch { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}
