//! reqwest-based downloader.

use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::path::Path;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::config::DownloadConfig;
use super::error::FetchError;
use super::traits::Downloader;
use super::types::DownloadOptions;

/// Downloads over HTTP(S) with reqwest.
pub struct HttpDownloader {
    config: DownloadConfig,
}

impl HttpDownloader {
    pub fn new(config: DownloadConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(DownloadConfig::default())
    }

    /// Redirect limits are a client-level setting in reqwest, so each request
    /// gets a client matching its options.
    fn client_for(&self, options: &DownloadOptions) -> Result<Client, FetchError> {
        let redirects = options
            .follow_location
            .unwrap_or(self.config.follow_location);
        let policy = if redirects == 0 {
            Policy::none()
        } else {
            Policy::limited(redirects)
        };

        let mut builder = Client::builder()
            .redirect(policy)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .user_agent(&self.config.user_agent);
        if !self.config.use_system_proxy {
            builder = builder.no_proxy();
        }
        Ok(builder.build()?)
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(
        &self,
        url: &str,
        destination: &Path,
        options: &DownloadOptions,
    ) -> Result<(), FetchError> {
        let client = self.client_for(options)?;
        let mut request = client.get(url);
        if let Some(referer) = &options.referer {
            request = request.header(reqwest::header::REFERER, referer);
        }
        for (name, value) in &options.custom_headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(auth) = &options.user_pass {
            request = request.basic_auth(&auth.user, Some(&auth.password));
        }

        let mut response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let mut file = File::create(destination).await?;
        let mut total = 0usize;
        while let Some(chunk) = response.chunk().await? {
            total += chunk.len();
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!("Downloaded {} bytes from {} to {:?}", total, url, destination);
        Ok(())
    }
}
