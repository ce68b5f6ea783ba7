//! Download module for fetching URL-sourced input.
//!
//! Conversions from a URL stage a temp file and hand it to a [`Downloader`]
//! before decoding. [`HttpDownloader`] is the reqwest-backed implementation;
//! tests use `testing::MockDownloader`.

mod config;
mod error;
mod http;
mod traits;
mod types;

pub use config::DownloadConfig;
pub use error::FetchError;
pub use http::HttpDownloader;
pub use traits::Downloader;
pub use types::{BasicAuth, DownloadOptions};
