use crate::config::types::{PolicySettings, RunnerSettings, Settings};
use crate::ConfigError;

/// Validates the entire settings structure
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    validate_runner_settings(&settings.runner)?;
    validate_policy_settings(&settings.policy)?;
    Ok(())
}

fn validate_runner_settings(settings: &RunnerSettings) -> Result<(), ConfigError> {
    if settings.executable.trim().is_empty() {
        return Err(ConfigError::Validation(
            "runner.executable cannot be empty".to_string(),
        ));
    }

    if settings.script.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "runner.script cannot be empty".to_string(),
        ));
    }

    if let Some(dir) = &settings.base_dir {
        if dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "runner.base-dir cannot be empty".to_string(),
            ));
        }
    }

    if settings.timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "runner.timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_policy_settings(settings: &PolicySettings) -> Result<(), ConfigError> {
    if settings.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "policy.user-agent cannot be empty".to_string(),
        ));
    }

    if settings.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "policy.timeout-secs must be >= 1, got {}",
            settings.timeout_secs
        )));
    }

    Ok(())
}
