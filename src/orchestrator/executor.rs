//! Rollback executor: re-upload the code behind `<function>-rollback` as live code.
//!
//! Resolve, fetch, upload, each awaiting the previous step. The executor never
//! publishes and never touches the alias, so running it twice restores the same
//! checkpoint twice.

use humansize::{format_size, BINARY};
use std::sync::Arc;

use crate::error::RollbackError;
use crate::log_progress;
use crate::models::{FetchedCode, FunctionName, ResolvedCheckpoint, RestoreReport};
use crate::orchestrator::state::{ExecutorPhase, PhaseTracker};
use crate::provider::{redact_location, ContentFetcher, FunctionApi};

pub struct RollbackExecutor {
    api: Arc<dyn FunctionApi>,
    fetcher: Arc<dyn ContentFetcher>,
}

impl RollbackExecutor {
    pub fn new(api: Arc<dyn FunctionApi>, fetcher: Arc<dyn ContentFetcher>) -> Self {
        RollbackExecutor { api, fetcher }
    }

    /// Restore the live code of `function` from its checkpoint alias.
    pub async fn rollback(&self, function: &FunctionName) -> Result<RestoreReport, RollbackError> {
        let mut tracker = PhaseTracker::<ExecutorPhase>::new("Rollback");
        let result = self.run(&mut tracker, function).await;

        if let Err(e) = &result {
            tracker.advance(e.phase());
            log::error!("[Rollback] {} ({})", e, tracker.trail());
            return result;
        }

        result.map(|mut report| {
            report.phases = tracker.into_history();
            report
        })
    }

    async fn run(
        &self,
        tracker: &mut PhaseTracker<ExecutorPhase>,
        function: &FunctionName,
    ) -> Result<RestoreReport, RollbackError> {
        tracker.advance(ExecutorPhase::ResolvingCheckpoint);
        let checkpoint = self.resolve(function).await?;
        tracker.advance(ExecutorPhase::Resolved);

        tracker.advance(ExecutorPhase::Fetching);
        let fetched = self.fetch(checkpoint).await?;
        tracker.advance(ExecutorPhase::Fetched);

        tracker.advance(ExecutorPhase::Uploading);
        let report = self.upload(fetched).await?;
        tracker.advance(ExecutorPhase::Restored);

        log_progress!("Successfully rolled back function: {}", function);
        Ok(report)
    }

    async fn resolve(&self, function: &FunctionName) -> Result<ResolvedCheckpoint, RollbackError> {
        log_progress!("Rolling back function: {}...", function);
        let alias = function.checkpoint_alias();

        let record = self
            .api
            .get_function(function, &alias)
            .await
            .map_err(|source| {
                if source.is_not_found() {
                    RollbackError::CheckpointMissing {
                        function: function.to_string(),
                        alias: alias.to_string(),
                    }
                } else {
                    RollbackError::Resolve {
                        function: function.to_string(),
                        alias: alias.to_string(),
                        source,
                    }
                }
            })?;

        let location = record
            .location
            .ok_or_else(|| RollbackError::MissingCodeLocation {
                function: function.to_string(),
                alias: alias.to_string(),
            })?;

        log::debug!(
            "[Rollback] {} -> version {} at {}",
            alias,
            record
                .version
                .as_ref()
                .map(|v| v.as_str())
                .unwrap_or("unknown"),
            redact_location(&location)
        );

        Ok(ResolvedCheckpoint {
            function: function.clone(),
            alias,
            version: record.version,
            location,
            code_size: record.code_size,
        })
    }

    async fn fetch(&self, checkpoint: ResolvedCheckpoint) -> Result<FetchedCode, RollbackError> {
        let bytes = self
            .fetcher
            .fetch(&checkpoint.location)
            .await
            .map_err(|source| RollbackError::Fetch {
                function: checkpoint.function.to_string(),
                source,
            })?;

        if bytes.len() as u64 != checkpoint.code_size {
            log::warn!(
                "[Rollback] Downloaded {} bytes but {} reports a code size of {}",
                bytes.len(),
                checkpoint.alias,
                checkpoint.code_size
            );
        }

        Ok(FetchedCode { checkpoint, bytes })
    }

    async fn upload(&self, fetched: FetchedCode) -> Result<RestoreReport, RollbackError> {
        let FetchedCode { checkpoint, bytes } = fetched;
        let size = bytes.len() as u64;

        log_progress!(
            "Uploading function: {} ({})...",
            checkpoint.function,
            format_size(size, BINARY)
        );

        self.api
            .update_function_code(&checkpoint.function, bytes)
            .await
            .map_err(|source| RollbackError::Upload {
                function: checkpoint.function.to_string(),
                source,
            })?;

        Ok(RestoreReport {
            function: checkpoint.function,
            alias: checkpoint.alias,
            restored_version: checkpoint.version,
            bytes_uploaded: size,
            phases: Vec::new(),
        })
    }
}
