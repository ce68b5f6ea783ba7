//! Configuration for locating and running the engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::location::DEFAULT_ENGINE_NAME;

/// Engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine binary. Left at the default it is looked up on `PATH`,
    /// anything else is used verbatim.
    #[serde(default = "default_engine_path")]
    pub path: PathBuf,

    /// Prefix engine runs with `unbuffer` when it is on `PATH`, so diagnostics
    /// arrive line by line instead of in blocks.
    #[serde(default = "default_use_unbuffer")]
    pub use_unbuffer: bool,

    /// Shell used for shell-command conversions.
    #[serde(default = "default_shell")]
    pub shell: PathBuf,

    /// Upper bound for a single engine run in seconds. No bound when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Treat a non-zero engine exit code as a failed conversion.
    #[serde(default)]
    pub strict_exit_status: bool,
}

fn default_engine_path() -> PathBuf {
    PathBuf::from(DEFAULT_ENGINE_NAME)
}

fn default_use_unbuffer() -> bool {
    true
}

fn default_shell() -> PathBuf {
    PathBuf::from("/bin/bash")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: default_engine_path(),
            use_unbuffer: default_use_unbuffer(),
            shell: default_shell(),
            timeout_secs: None,
            strict_exit_status: false,
        }
    }
}

impl EngineConfig {
    /// Creates a config pointing at a specific engine binary.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Sets the shell used for shell-command conversions.
    pub fn with_shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Enables or disables the `unbuffer` lookup.
    pub fn with_unbuffer(mut self, use_unbuffer: bool) -> Self {
        self.use_unbuffer = use_unbuffer;
        self
    }

    /// Sets the per-run timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Enables strict exit status checking.
    pub fn with_strict_exit_status(mut self, strict: bool) -> Self {
        self.strict_exit_status = strict;
        self
    }
}
