use serde::{Deserialize, Serialize};

use crate::conversion::StagingConfig;
use crate::download::DownloadConfig;
use crate::engine::EngineConfig;

/// Top-level configuration. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub staging: StagingConfig,

    #[serde(default)]
    pub download: DownloadConfig,
}

/// Effective configuration with defaults resolved and paths in display form.
///
/// Used by the CLI to show the effective configuration.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub engine_path: String,
    pub use_unbuffer: bool,
    pub shell: String,
    pub timeout_secs: Option<u64>,
    pub strict_exit_status: bool,
    pub temp_dir: String,
    pub temp_prefix: String,
    pub download_follow_location: usize,
    pub download_timeout_secs: u64,
    pub user_agent: String,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            engine_path: config.engine.path.display().to_string(),
            use_unbuffer: config.engine.use_unbuffer,
            shell: config.engine.shell.display().to_string(),
            timeout_secs: config.engine.timeout_secs,
            strict_exit_status: config.engine.strict_exit_status,
            temp_dir: config
                .staging
                .temp_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir)
                .display()
                .to_string(),
            temp_prefix: config.staging.prefix.clone(),
            download_follow_location: config.download.follow_location,
            download_timeout_secs: config.download.timeout_secs,
            user_agent: config.download.user_agent.clone(),
        }
    }
}
