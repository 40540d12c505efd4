//! Configuration module for the service being protected.
//!
//! # Module Structure
//!
//! - `loader`: Locates and parses settings files (TOML or JSON)
//! - `validator`: Validates function names, stages, regions and endpoints
//!
//! # Example
//!
//! ```toml
//! service = "aws-nodejs"
//! stage = "dev"
//! region = "us-east-1"
//!
//! [provider]
//! endpoint_url = "http://localhost:4566"
//!
//! [rollback]
//! alias_fallback = "not-found-only"
//!
//! [functions.hello]
//!
//! [functions.worker]
//! name = "custom-worker"
//! ```

pub mod loader;
pub mod validator;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::models::FunctionName;

pub const DEFAULT_STAGE: &str = "dev";
pub const DEFAULT_REGION: &str = "us-east-1";

/// When the publisher falls back from updating the checkpoint alias to creating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AliasFallback {
    /// Create only when the update reports the alias missing; surface every other failure
    #[default]
    NotFoundOnly,
    /// Create after any update failure; surface both failures if create fails too
    AnyError,
}

/// Provider connection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Endpoint override (e.g. LocalStack)
    pub endpoint_url: Option<String>,

    /// Named credentials profile
    pub profile: Option<String>,
}

/// Checkpoint/rollback behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollbackSettings {
    pub alias_fallback: AliasFallback,

    /// Hold an in-process lock per function for the duration of a pipeline
    pub serialize_per_function: bool,
}

impl Default for RollbackSettings {
    fn default() -> Self {
        RollbackSettings {
            alias_fallback: AliasFallback::default(),
            serialize_per_function: true,
        }
    }
}

/// Per-function declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionSettings {
    /// Explicit deployed name, overriding `<service>-<stage>-<function>`
    pub name: Option<String>,
}

/// Top-level settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub service: String,
    pub stage: String,
    pub region: String,
    pub provider: ProviderSettings,
    pub rollback: RollbackSettings,
    pub functions: BTreeMap<String, FunctionSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            service: String::new(),
            stage: DEFAULT_STAGE.to_string(),
            region: DEFAULT_REGION.to_string(),
            provider: ProviderSettings::default(),
            rollback: RollbackSettings::default(),
            functions: BTreeMap::new(),
        }
    }
}

/// Fully resolved target of one checkpoint or rollback invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Function key as declared in the settings
    pub key: String,
    pub function: FunctionName,
    pub stage: String,
    pub region: String,
}

impl Settings {
    /// Check the settings file itself, independent of any invocation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Service name cannot be empty".to_string(),
            ));
        }
        validator::validate_stage(&self.stage)?;
        validator::validate_region(&self.region)?;
        if let Some(url) = &self.provider.endpoint_url {
            validator::validate_endpoint_url(url)?;
        }
        Ok(())
    }

    /// Resolve a declared function key to its deployed name for `stage`.
    pub fn resolve_function(&self, key: &str, stage: &str) -> Result<FunctionName, ConfigError> {
        let declared = self
            .functions
            .get(key)
            .ok_or_else(|| ConfigError::UnknownFunction(key.to_string()))?;

        match &declared.name {
            Some(name) => FunctionName::parse(name.clone()),
            None => FunctionName::parse(format!("{}-{}-{}", self.service, stage, key)),
        }
    }

    /// Validate an invocation and resolve everything the pipelines need.
    ///
    /// Stage and region fall back to the settings when not given.
    pub fn target(
        &self,
        key: &str,
        stage: Option<&str>,
        region: Option<&str>,
    ) -> Result<Target, ConfigError> {
        let stage = stage.unwrap_or(self.stage.as_str());
        let region = region.unwrap_or(self.region.as_str());
        validator::validate_stage(stage)?;
        validator::validate_region(region)?;

        let function = self.resolve_function(key, stage)?;
        Ok(Target {
            key: key.to_string(),
            function,
            stage: stage.to_string(),
            region: region.to_string(),
        })
    }
}
