//! Discovery of the engine and unbuffer helper binaries.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::config::EngineConfig;
use super::error::EngineError;

/// Engine binary name looked up on `PATH` when no explicit path is configured.
pub const DEFAULT_ENGINE_NAME: &str = "gpsbabel";

/// Helper that forces line-buffered output from the engine.
pub const UNBUFFER_NAME: &str = "unbuffer";

/// Where the engine and the optional unbuffer helper live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineLocation {
    engine: Option<PathBuf>,
    unbuffer: Option<PathBuf>,
}

impl EngineLocation {
    pub fn new(engine: Option<PathBuf>, unbuffer: Option<PathBuf>) -> Self {
        Self { engine, unbuffer }
    }

    /// Resolves binary locations from configuration and `PATH`.
    ///
    /// Missing binaries are logged, never fatal: without the engine only
    /// shell and native-decode conversions remain possible, and without
    /// unbuffer diagnostics just arrive later.
    pub fn discover(config: &EngineConfig) -> Self {
        let engine = if config.path == Path::new(DEFAULT_ENGINE_NAME) {
            match which::which(DEFAULT_ENGINE_NAME) {
                Ok(path) => Some(path),
                Err(_) => {
                    warn!("{} not found in PATH", DEFAULT_ENGINE_NAME);
                    None
                }
            }
        } else {
            Some(config.path.clone())
        };

        // unbuffer is an expect(1) script, not something to hunt for on Windows
        let unbuffer = if config.use_unbuffer && cfg!(unix) {
            match which::which(UNBUFFER_NAME) {
                Ok(path) => Some(path),
                Err(_) => {
                    warn!("{} not found in PATH", UNBUFFER_NAME);
                    None
                }
            }
        } else {
            None
        };

        debug!(engine = ?engine, unbuffer = ?unbuffer, "Engine location resolved");
        Self { engine, unbuffer }
    }

    pub fn engine(&self) -> Option<&Path> {
        self.engine.as_deref()
    }

    pub fn unbuffer(&self) -> Option<&Path> {
        self.unbuffer.as_deref()
    }

    /// Returns the engine path or [`EngineError::NotFound`].
    pub fn require_engine(&self) -> Result<&Path, EngineError> {
        self.engine().ok_or(EngineError::NotFound)
    }
}
