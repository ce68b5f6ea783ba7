//! Configuration for the HTTP downloader.

use serde::{Deserialize, Serialize};

/// HTTP downloader settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Redirects followed when a request does not say otherwise.
    #[serde(default = "default_follow_location")]
    pub follow_location: usize,

    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Honor `HTTP_PROXY`-style environment variables.
    #[serde(default = "default_use_system_proxy")]
    pub use_system_proxy: bool,
}

fn default_use_system_proxy() -> bool {
    true
}

fn default_follow_location() -> usize {
    2
}

fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("trackbabel/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            follow_location: default_follow_location(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            use_system_proxy: default_use_system_proxy(),
        }
    }
}
