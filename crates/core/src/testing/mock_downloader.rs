//! Mock downloader for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::download::{DownloadOptions, Downloader, FetchError};

/// A recorded fetch for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFetch {
    pub url: String,
    pub options: DownloadOptions,
}

/// Mock implementation of the Downloader trait.
///
/// Serves configured bodies by URL and records every request. Unknown URLs
/// get an empty body unless the mock was built with [`MockDownloader::failing`].
#[derive(Debug, Default)]
pub struct MockDownloader {
    bodies: Arc<RwLock<HashMap<String, String>>>,
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
    fail: bool,
}

impl MockDownloader {
    /// Create a new mock downloader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock whose every fetch fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Serve `body` for `url`.
    pub async fn set_body(&self, url: impl Into<String>, body: impl Into<String>) {
        self.bodies.write().await.insert(url.into(), body.into());
    }

    /// All fetches so far.
    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        options: &DownloadOptions,
    ) -> Result<(), FetchError> {
        self.fetches.write().await.push(RecordedFetch {
            url: url.to_string(),
            options: options.clone(),
        });
        if self.fail {
            return Err(FetchError::Other(format!("mock failure for {}", url)));
        }
        let body = self.bodies.read().await.get(url).cloned().unwrap_or_default();
        tokio::fs::write(destination, body).await?;
        Ok(())
    }
}
