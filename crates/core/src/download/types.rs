//! Types for the download module.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Credentials for HTTP basic authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicAuth {
    pub user: String,
    pub password: String,
}

/// Per-request download knobs. Opaque to the conversion code, which only
/// passes them through to the downloader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOptions {
    /// Value for the `Referer` header.
    #[serde(default)]
    pub referer: Option<String>,

    /// Maximum redirects to follow. Falls back to the downloader's default.
    #[serde(default)]
    pub follow_location: Option<usize>,

    /// Basic authentication credentials.
    #[serde(default)]
    pub user_pass: Option<BasicAuth>,

    /// Extra request headers.
    #[serde(default)]
    pub custom_headers: BTreeMap<String, String>,
}

impl DownloadOptions {
    /// Sets the `Referer` header.
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    /// Sets the maximum number of redirects to follow.
    pub fn with_follow_location(mut self, redirects: usize) -> Self {
        self.follow_location = Some(redirects);
        self
    }

    /// Sets basic authentication credentials.
    pub fn with_basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user_pass = Some(BasicAuth {
            user: user.into(),
            password: password.into(),
        });
        self
    }

    /// Adds an extra request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.insert(name.into(), value.into());
        self
    }
}
