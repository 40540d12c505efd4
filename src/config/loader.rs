//! Settings file loader and serialization.

use crate::config::Settings;
use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

/// File looked up in the working directory before the global settings.
pub const LOCAL_SETTINGS_FILE: &str = "rollback.toml";

/// Get the global settings path: ~/.config/function-rollback/config.toml
pub fn get_global_settings_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        ConfigError::ValidationFailed("Cannot determine config directory".to_string())
    })?;

    Ok(config_dir.join("function-rollback").join("config.toml"))
}

/// Pick the settings file to use: explicit path, then ./rollback.toml, then the global file.
pub fn locate_settings(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let local = PathBuf::from(LOCAL_SETTINGS_FILE);
    if local.is_file() {
        return Ok(local);
    }

    let global = get_global_settings_path()?;
    if global.is_file() {
        return Ok(global);
    }

    Err(ConfigError::FileNotFound(format!(
        "No {} in the working directory and no {}",
        LOCAL_SETTINGS_FILE,
        global.display()
    )))
}

/// Load and validate settings from a .toml or .json file.
pub fn load_settings_from_file(path: &Path) -> Result<Settings, ConfigError> {
    let format = validate_settings_path(path)?;

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(format!(
                "Configuration file not found at: {}",
                path.display()
            ))
        } else {
            ConfigError::IoError(e)
        }
    })?;

    let settings = parse_settings(&content, format)?;
    settings.validate()?;

    log::debug!(
        "[Config] Loaded settings for service '{}' from {}",
        settings.service,
        path.display()
    );
    Ok(settings)
}

/// Save settings to a .toml or .json file.
pub fn save_settings_to_file(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    let format = validate_settings_path(path)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(ConfigError::IoError)?;
        }
    }

    let content = match format {
        SettingsFormat::Toml => toml::to_string_pretty(settings).map_err(|e| {
            ConfigError::ValidationFailed(format!("Failed to serialize settings: {}", e))
        })?,
        SettingsFormat::Json => serde_json::to_string_pretty(settings)?,
    };

    fs::write(path, content).map_err(ConfigError::IoError)?;
    Ok(())
}

/// On-disk settings format, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsFormat {
    Toml,
    Json,
}

/// Parse settings content without validating it.
pub fn parse_settings(content: &str, format: SettingsFormat) -> Result<Settings, ConfigError> {
    let settings = match format {
        SettingsFormat::Toml => toml::from_str(content)?,
        SettingsFormat::Json => serde_json::from_str(content)?,
    };
    Ok(settings)
}

/// Validate settings path (.toml or .json extension required).
pub fn validate_settings_path(path: &Path) -> Result<SettingsFormat, ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Configuration path cannot be empty".to_string(),
        ));
    }

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => Ok(SettingsFormat::Toml),
        Some("json") => Ok(SettingsFormat::Json),
        Some(ext) => Err(ConfigError::ValidationFailed(format!(
            "Configuration file must have .toml or .json extension, got .{}",
            ext
        ))),
        None => Err(ConfigError::ValidationFailed(
            "Configuration file must have .toml or .json extension".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AliasFallback;

    #[test]
    fn test_validate_settings_path() {
        assert_eq!(
            validate_settings_path(Path::new("rollback.toml")).unwrap(),
            SettingsFormat::Toml
        );
        assert_eq!(
            validate_settings_path(Path::new("rollback.json")).unwrap(),
            SettingsFormat::Json
        );
        assert!(validate_settings_path(Path::new("rollback.yml")).is_err());
        assert!(validate_settings_path(Path::new("rollback")).is_err());
        assert!(validate_settings_path(Path::new("")).is_err());
    }

    #[test]
    fn test_parse_minimal_toml_applies_defaults() {
        let settings = parse_settings("service = \"svc\"\n", SettingsFormat::Toml).unwrap();
        assert_eq!(settings.service, "svc");
        assert_eq!(settings.stage, "dev");
        assert_eq!(settings.region, "us-east-1");
        assert_eq!(settings.rollback.alias_fallback, AliasFallback::NotFoundOnly);
        assert!(settings.rollback.serialize_per_function);
        assert!(settings.functions.is_empty());
    }

    #[test]
    fn test_parse_fallback_policy() {
        let content = "service = \"svc\"\n[rollback]\nalias_fallback = \"any-error\"\n";
        let settings = parse_settings(content, SettingsFormat::Toml).unwrap();
        assert_eq!(settings.rollback.alias_fallback, AliasFallback::AnyError);
    }
}
