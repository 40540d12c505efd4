//! Input validation for function names, stages and regions.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConfigError;

/// Longest function name the provider accepts.
pub const MAX_FUNCTION_NAME_LEN: usize = 64;

static FUNCTION_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static function name regex"));

static STAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]+$").expect("static stage regex"));

// e.g. us-east-1, eu-central-2, us-gov-west-1
static REGION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z]{2}(-gov|-iso[a-z]*)?-[a-z]+-\d+$").expect("static region regex")
});

/// Validate a provider-side function name (1-64 chars of `[A-Za-z0-9_-]`).
pub fn validate_function_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Function name cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_FUNCTION_NAME_LEN {
        return Err(ConfigError::ValidationFailed(format!(
            "Function name must be at most {} characters, got {}: {}",
            MAX_FUNCTION_NAME_LEN,
            name.len(),
            name
        )));
    }

    if !FUNCTION_NAME.is_match(name) {
        return Err(ConfigError::ValidationFailed(format!(
            "Function name may only contain letters, digits, '-' and '_', got: {}",
            name
        )));
    }

    Ok(())
}

/// Validate a deployment stage name.
pub fn validate_stage(stage: &str) -> Result<(), ConfigError> {
    if !STAGE.is_match(stage) {
        return Err(ConfigError::ValidationFailed(format!(
            "Stage may only contain letters, digits and '-', got: '{}'",
            stage
        )));
    }
    Ok(())
}

/// Validate a region identifier.
pub fn validate_region(region: &str) -> Result<(), ConfigError> {
    if !REGION.is_match(region) {
        return Err(ConfigError::ValidationFailed(format!(
            "Region must look like 'us-east-1', got: '{}'",
            region
        )));
    }
    Ok(())
}

/// Validate an optional endpoint override (http/https URL).
pub fn validate_endpoint_url(url: &str) -> Result<(), ConfigError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| {
        ConfigError::ValidationFailed(format!("Invalid endpoint URL '{}': {}", url, e))
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::ValidationFailed(format!(
            "Endpoint URL must use http or https, got: {}",
            other
        ))),
    }
}
