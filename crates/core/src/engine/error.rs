//! Error types for the engine module.

use thiserror::Error;

/// Errors that can occur while locating or running the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Engine binary was not located at startup.
    #[error("Conversion engine not found (set engine.path or install gpsbabel)")]
    NotFound,

    /// The OS refused to create the child process.
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error while reading the child's output or reaping it.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Child exited unsuccessfully and strict exit checking is enabled.
    #[error("Engine exited with code {code:?}")]
    ExitStatus { code: Option<i32> },

    /// The run was cancelled by the caller.
    #[error("Engine run cancelled")]
    Cancelled,

    /// The run exceeded the configured deadline.
    #[error("Engine run timed out after {timeout_secs} seconds")]
    TimedOut { timeout_secs: u64 },
}

impl EngineError {
    /// Creates a spawn failure for the given program.
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }
}
