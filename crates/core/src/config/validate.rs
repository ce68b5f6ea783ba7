use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Staging prefix is non-empty and a plain file name fragment
/// - Shell is set
/// - Timeouts, when present, are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let prefix = &config.staging.prefix;
    if prefix.is_empty() {
        return Err(ConfigError::ValidationError(
            "staging.prefix cannot be empty".to_string(),
        ));
    }
    if prefix.contains(['/', '\\']) {
        return Err(ConfigError::ValidationError(format!(
            "staging.prefix cannot contain path separators: {}",
            prefix
        )));
    }

    if config.engine.shell.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "engine.shell cannot be empty".to_string(),
        ));
    }

    if config.engine.timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "engine.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.download.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "download.timeout_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}
