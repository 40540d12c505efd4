//! Core data structures shared by the publisher and the executor.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::validator;
use crate::error::ConfigError;
use crate::orchestrator::state::{ExecutorPhase, PublisherPhase};

/// Suffix appended to a function name to form its checkpoint alias.
pub const CHECKPOINT_ALIAS_SUFFIX: &str = "-rollback";

/// Deployed name of a function as known to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FunctionName(String);

impl FunctionName {
    /// Validate and wrap a provider-side function name.
    pub fn parse(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        validator::validate_function_name(&name)?;
        Ok(FunctionName(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the alias holding this function's rollback checkpoint.
    pub fn checkpoint_alias(&self) -> AliasName {
        AliasName(format!("{}{}", self.0, CHECKPOINT_ALIAS_SUFFIX))
    }
}

impl TryFrom<String> for FunctionName {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FunctionName::parse(value)
    }
}

impl From<FunctionName> for String {
    fn from(value: FunctionName) -> Self {
        value.0
    }
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FunctionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Provider-assigned identifier of a published, immutable version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version(String);

impl Version {
    pub fn new(id: impl Into<String>) -> Self {
        Version(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Named, mutable pointer to a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AliasName(String);

impl AliasName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AliasName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Function record returned by a qualified GetFunction call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionCode {
    /// Version the qualifier resolved to, when the provider reports it
    pub version: Option<Version>,

    /// Time-limited download location of the code archive
    pub location: Option<String>,

    /// Archive size in bytes
    pub code_size: u64,
}

/// How the checkpoint alias was reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasOutcome {
    /// Existing alias was repointed
    Updated,
    /// Alias did not exist and was created
    Created,
}

/// A published version and the hash of the code it froze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSnapshot {
    pub version: Version,
    pub code_sha256: String,
}

/// Code currently deployed to a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveCode {
    /// Hash of the unpublished live slot (`$LATEST`)
    pub code_sha256: String,

    /// Most recent published version, `None` if the function has never been published
    pub latest_published: Option<VersionSnapshot>,
}

impl LiveCode {
    /// Published version holding exactly the live code, if there is one.
    pub fn live_version(&self) -> Option<&Version> {
        self.latest_published
            .as_ref()
            .filter(|snapshot| snapshot.code_sha256 == self.code_sha256)
            .map(|snapshot| &snapshot.version)
    }
}

/// Output of the publish step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedVersion {
    pub function: FunctionName,

    /// Version created by this publish
    pub published: Version,

    /// Version already holding the code that was live before this publish
    pub live: Option<Version>,
}

impl PublishedVersion {
    /// Version the checkpoint alias must point at.
    ///
    /// When no earlier version matches the live code, the fresh one is the only
    /// snapshot of the pre-deploy code.
    pub fn checkpoint_target(&self) -> &Version {
        self.live.as_ref().unwrap_or(&self.published)
    }
}

/// Result of a successful checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointReport {
    pub function: FunctionName,
    pub published: Version,
    pub alias: AliasName,
    pub target: Version,
    pub outcome: AliasOutcome,
    pub phases: Vec<PublisherPhase>,
}

/// Output of the resolve step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCheckpoint {
    pub function: FunctionName,
    pub alias: AliasName,
    pub version: Option<Version>,
    pub location: String,
    pub code_size: u64,
}

/// Output of the fetch step. The bytes are never written anywhere but the upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedCode {
    pub checkpoint: ResolvedCheckpoint,
    pub bytes: Vec<u8>,
}

/// Result of a successful rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub function: FunctionName,
    pub alias: AliasName,
    pub restored_version: Option<Version>,
    pub bytes_uploaded: u64,
    pub phases: Vec<ExecutorPhase>,
}
