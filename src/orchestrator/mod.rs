//! Checkpoint/rollback orchestration: publisher, executor, and the service tying them
//! to settings and per-function locking.

pub mod checkpoint;
pub mod executor;
pub mod lock;
pub mod state;

use std::sync::Arc;

pub use checkpoint::CheckpointPublisher;
pub use executor::RollbackExecutor;
pub use lock::{FunctionLockGuard, FunctionLocks};
pub use state::{ExecutorPhase, Phase, PhaseTracker, PublisherPhase};

use crate::config::RollbackSettings;
use crate::error::{CheckpointError, RollbackError};
use crate::models::{CheckpointReport, FunctionName, RestoreReport};
use crate::provider::{ContentFetcher, FunctionApi};

/// Entry point for both pipelines against one provider.
#[derive(Clone)]
pub struct RollbackService {
    publisher: Arc<CheckpointPublisher>,
    executor: Arc<RollbackExecutor>,
    locks: Option<FunctionLocks>,
}

impl RollbackService {
    pub fn new(
        api: Arc<dyn FunctionApi>,
        fetcher: Arc<dyn ContentFetcher>,
        settings: &RollbackSettings,
    ) -> Self {
        RollbackService {
            publisher: Arc::new(CheckpointPublisher::new(
                Arc::clone(&api),
                settings.alias_fallback,
            )),
            executor: Arc::new(RollbackExecutor::new(api, fetcher)),
            locks: settings.serialize_per_function.then(FunctionLocks::new),
        }
    }

    /// Run the checkpoint publisher for `function`.
    pub async fn checkpoint(
        &self,
        function: &FunctionName,
    ) -> Result<CheckpointReport, CheckpointError> {
        let _guard = match &self.locks {
            Some(locks) => Some(locks.acquire(function).await),
            None => None,
        };

        let report = self.publisher.checkpoint(function).await?;
        log::info!(
            "[Checkpoint] {}: published {}, {} -> {} ({:?})",
            report.function,
            report.published,
            report.alias,
            report.target,
            report.outcome
        );
        Ok(report)
    }

    /// Run the rollback executor for `function`.
    pub async fn rollback(&self, function: &FunctionName) -> Result<RestoreReport, RollbackError> {
        let _guard = match &self.locks {
            Some(locks) => Some(locks.acquire(function).await),
            None => None,
        };

        let report = self.executor.rollback(function).await?;
        log::info!(
            "[Rollback] {}: restored {} bytes from {}",
            report.function,
            report.bytes_uploaded,
            report.alias
        );
        Ok(report)
    }
}
