//! Shared test fixtures: an in-memory function-management provider that records
//! every call it receives.

#![allow(dead_code)]

use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::Mutex;

use function_rollback::provider::{ContentFetcher, FunctionApi, ProviderResult};
use function_rollback::models::{LiveCode, VersionSnapshot};
use function_rollback::{AliasName, FetchError, FunctionCode, FunctionName, ProviderError, Version};

/// One call observed by the fake, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    LiveCode,
    PublishVersion,
    UpdateAlias { alias: String, target: String },
    CreateAlias { alias: String, target: String },
    GetFunction { qualifier: String },
    UpdateFunctionCode { bytes: usize },
    Fetch { location: String },
}

/// Operations a failure can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    LiveCode,
    PublishVersion,
    UpdateAlias,
    CreateAlias,
    GetFunction,
    UpdateFunctionCode,
    Fetch,
}

struct State {
    live_code: Vec<u8>,
    /// Published versions; version `n` is at index `n - 1`
    versions: Vec<Vec<u8>>,
    aliases: HashMap<String, String>,
    calls: Vec<Call>,
    failures: HashMap<Op, ProviderError>,
}

/// In-memory stand-in for a single deployed function.
pub struct FakeLambda {
    function: String,
    location_base: String,
    state: Mutex<State>,
}

impl FakeLambda {
    /// Function whose live code is `code` and has never been published.
    pub fn new(function: &str, code: &[u8]) -> Self {
        FakeLambda {
            function: function.to_string(),
            location_base: "https://code.example.com".to_string(),
            state: Mutex::new(State {
                live_code: code.to_vec(),
                versions: Vec::new(),
                aliases: HashMap::new(),
                calls: Vec::new(),
                failures: HashMap::new(),
            }),
        }
    }

    /// Function whose live code `code` is also published as version 1.
    pub fn published(function: &str, code: &[u8]) -> Self {
        let fake = FakeLambda::new(function, code);
        fake.state.lock().unwrap().versions.push(code.to_vec());
        fake
    }

    /// Serve code locations under `base` (e.g. a mock HTTP server).
    pub fn with_location_base(mut self, base: &str) -> Self {
        self.location_base = base.trim_end_matches('/').to_string();
        self
    }

    pub fn with_alias(self, alias: &str, version: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .aliases
            .insert(alias.to_string(), version.to_string());
        self
    }

    /// Make every call to `op` fail with `error`.
    pub fn fail(&self, op: Op, error: ProviderError) {
        self.state.lock().unwrap().failures.insert(op, error);
    }

    /// Simulate the host deploying new code.
    pub fn deploy(&self, code: &[u8]) {
        self.state.lock().unwrap().live_code = code.to_vec();
    }

    pub fn live_code(&self) -> Vec<u8> {
        self.state.lock().unwrap().live_code.clone()
    }

    pub fn version_code(&self, version: &str) -> Option<Vec<u8>> {
        let index: usize = version.parse().ok()?;
        self.state
            .lock()
            .unwrap()
            .versions
            .get(index.checked_sub(1)?)
            .cloned()
    }

    pub fn version_count(&self) -> usize {
        self.state.lock().unwrap().versions.len()
    }

    pub fn alias_target(&self, alias: &str) -> Option<String> {
        self.state.lock().unwrap().aliases.get(alias).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    pub fn location_for(&self, version: &str) -> String {
        format!(
            "{}/snapshots/{}/{}.zip?X-Amz-Signature=fake",
            self.location_base, self.function, version
        )
    }

    fn record(&self, call: Call, op: Op) -> ProviderResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.failures.get(&op) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn check_function(&self, function: &FunctionName) -> ProviderResult<()> {
        if function.as_str() == self.function {
            Ok(())
        } else {
            Err(ProviderError::NotFound(format!(
                "Function not found: {}",
                function
            )))
        }
    }
}

impl FunctionApi for FakeLambda {
    fn live_code<'a>(&'a self, function: &'a FunctionName) -> BoxFuture<'a, ProviderResult<LiveCode>> {
        async move {
            self.record(Call::LiveCode, Op::LiveCode)?;
            self.check_function(function)?;
            let state = self.state.lock().unwrap();
            Ok(LiveCode {
                code_sha256: code_sha256(&state.live_code),
                latest_published: state.versions.last().map(|code| VersionSnapshot {
                    version: Version::new(state.versions.len().to_string()),
                    code_sha256: code_sha256(code),
                }),
            })
        }
        .boxed()
    }

    fn publish_version<'a>(
        &'a self,
        function: &'a FunctionName,
    ) -> BoxFuture<'a, ProviderResult<Version>> {
        async move {
            self.record(Call::PublishVersion, Op::PublishVersion)?;
            self.check_function(function)?;
            let mut state = self.state.lock().unwrap();
            let code = state.live_code.clone();
            state.versions.push(code);
            Ok(Version::new(state.versions.len().to_string()))
        }
        .boxed()
    }

    fn update_alias<'a>(
        &'a self,
        function: &'a FunctionName,
        alias: &'a AliasName,
        target: &'a Version,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        async move {
            self.record(
                Call::UpdateAlias {
                    alias: alias.to_string(),
                    target: target.to_string(),
                },
                Op::UpdateAlias,
            )?;
            self.check_function(function)?;
            let mut state = self.state.lock().unwrap();
            match state.aliases.get_mut(alias.as_str()) {
                Some(current) => {
                    *current = target.to_string();
                    Ok(())
                }
                None => Err(ProviderError::NotFound(format!(
                    "Alias not found: {}",
                    alias
                ))),
            }
        }
        .boxed()
    }

    fn create_alias<'a>(
        &'a self,
        function: &'a FunctionName,
        alias: &'a AliasName,
        target: &'a Version,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        async move {
            self.record(
                Call::CreateAlias {
                    alias: alias.to_string(),
                    target: target.to_string(),
                },
                Op::CreateAlias,
            )?;
            self.check_function(function)?;
            let mut state = self.state.lock().unwrap();
            if state.aliases.contains_key(alias.as_str()) {
                return Err(ProviderError::Conflict(format!(
                    "Alias already exists: {}",
                    alias
                )));
            }
            state
                .aliases
                .insert(alias.to_string(), target.to_string());
            Ok(())
        }
        .boxed()
    }

    fn get_function<'a>(
        &'a self,
        function: &'a FunctionName,
        qualifier: &'a AliasName,
    ) -> BoxFuture<'a, ProviderResult<FunctionCode>> {
        async move {
            self.record(
                Call::GetFunction {
                    qualifier: qualifier.to_string(),
                },
                Op::GetFunction,
            )?;
            self.check_function(function)?;
            let version = self.alias_target(qualifier.as_str()).ok_or_else(|| {
                ProviderError::NotFound(format!(
                    "Cannot find alias arn: {}:{}",
                    function, qualifier
                ))
            })?;
            let code_size = self
                .version_code(&version)
                .map(|code| code.len() as u64)
                .unwrap_or_default();
            Ok(FunctionCode {
                location: Some(self.location_for(&version)),
                version: Some(Version::new(version)),
                code_size,
            })
        }
        .boxed()
    }

    fn update_function_code<'a>(
        &'a self,
        function: &'a FunctionName,
        zip_file: Vec<u8>,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        async move {
            self.record(
                Call::UpdateFunctionCode {
                    bytes: zip_file.len(),
                },
                Op::UpdateFunctionCode,
            )?;
            self.check_function(function)?;
            self.state.lock().unwrap().live_code = zip_file;
            Ok(())
        }
        .boxed()
    }
}

impl ContentFetcher for FakeLambda {
    fn fetch<'a>(&'a self, location: &'a str) -> BoxFuture<'a, Result<Vec<u8>, FetchError>> {
        async move {
            let failure = {
                let mut state = self.state.lock().unwrap();
                state.calls.push(Call::Fetch {
                    location: location.to_string(),
                });
                state.failures.contains_key(&Op::Fetch)
            };
            let version = location
                .split('?')
                .next()
                .and_then(|path| path.rsplit('/').next())
                .and_then(|file| file.strip_suffix(".zip"))
                .unwrap_or_default()
                .to_string();
            match self.version_code(&version) {
                Some(code) if !failure => Ok(code),
                _ => Err(FetchError::Status {
                    status: 404,
                    location: location.to_string(),
                }),
            }
        }
        .boxed()
    }
}

/// Stand-in for the provider's code hash; equal code gives equal hashes.
fn code_sha256(code: &[u8]) -> String {
    format!("sha256:{}", String::from_utf8_lossy(code))
}

pub fn function(name: &str) -> FunctionName {
    FunctionName::parse(name).unwrap()
}
