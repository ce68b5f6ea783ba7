//! Uniquely named temp files that carry data into and out of the engine.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::debug;

/// Where and how staged files are created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Directory for staged files. The system temp directory when unset.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    /// File name prefix; the rest of the name is random.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    "tmp-trackbabel.".to_string()
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            prefix: default_prefix(),
        }
    }
}

impl StagingConfig {
    /// Sets the directory for staged files.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(temp_dir.into());
        self
    }
}

/// A staged temp file, removed when dropped.
///
/// The file exists (empty) from creation on; no handle is kept open, so
/// child processes are free to replace it.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the file, used to resolve links in decoded data.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Creates staged files according to a [`StagingConfig`].
#[derive(Debug, Clone)]
pub struct Stager {
    dir: PathBuf,
    prefix: String,
}

impl Stager {
    pub fn new(config: &StagingConfig) -> Self {
        Self {
            dir: config
                .temp_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
            prefix: config.prefix.clone(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates a new, empty, uniquely named file.
    pub fn stage(&self) -> std::io::Result<StagedFile> {
        let path = tempfile::Builder::new()
            .prefix(&self.prefix)
            .tempfile_in(&self.dir)?
            .into_temp_path();
        debug!("Temporary file: {}", path.display());
        Ok(StagedFile { path })
    }
}

impl Default for Stager {
    fn default() -> Self {
        Self::new(&StagingConfig::default())
    }
}
