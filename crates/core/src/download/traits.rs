//! Trait definitions for the download module.

use async_trait::async_trait;
use std::path::Path;

use super::error::FetchError;
use super::types::DownloadOptions;

/// Fetches a URL into a local file.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Returns the name of this downloader implementation.
    fn name(&self) -> &str;

    /// Downloads `url` into `destination`, replacing any existing content.
    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        options: &DownloadOptions,
    ) -> Result<(), FetchError>;
}
