//! Checkpoint publisher: snapshot the live code and point `<function>-rollback` at it.
//!
//! Runs before every deploy. The sequence is strict:
//!
//! 1. read the live code hash, then publish a new version
//! 2. repoint the checkpoint alias (update) at the published version holding the
//!    pre-publish live code: an earlier version with the same hash, else the new one
//! 3. create the alias instead when the update reports it missing
//!
//! A published version is never removed, even when the alias step fails.

use std::sync::Arc;

use crate::config::AliasFallback;
use crate::error::{CheckpointError, ProviderError};
use crate::log_progress;
use crate::models::{
    AliasName, AliasOutcome, CheckpointReport, FunctionName, PublishedVersion, Version,
};
use crate::orchestrator::state::{PhaseTracker, PublisherPhase};
use crate::provider::FunctionApi;

pub struct CheckpointPublisher {
    api: Arc<dyn FunctionApi>,
    fallback: AliasFallback,
}

impl CheckpointPublisher {
    pub fn new(api: Arc<dyn FunctionApi>, fallback: AliasFallback) -> Self {
        CheckpointPublisher { api, fallback }
    }

    /// Publish a new version of `function` and move its checkpoint alias.
    pub async fn checkpoint(
        &self,
        function: &FunctionName,
    ) -> Result<CheckpointReport, CheckpointError> {
        let mut tracker = PhaseTracker::<PublisherPhase>::new("Checkpoint");

        tracker.advance(PublisherPhase::Publishing);
        let published = match self.publish(function).await {
            Ok(published) => published,
            Err(e) => {
                tracker.advance(PublisherPhase::PublishFailed);
                log::error!("[Checkpoint] {} ({})", e, tracker.trail());
                return Err(e);
            }
        };
        tracker.advance(PublisherPhase::Published);

        let alias = function.checkpoint_alias();
        let target = published.checkpoint_target().clone();

        tracker.advance(PublisherPhase::Aliasing);
        let outcome = match self.upsert_alias(&mut tracker, function, &alias, &target).await {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!(
                    "[Checkpoint] {} (version {} stays published; {})",
                    e,
                    published.published,
                    tracker.trail()
                );
                return Err(e);
            }
        };

        Ok(CheckpointReport {
            function: published.function,
            published: published.published,
            alias,
            target,
            outcome,
            phases: tracker.into_history(),
        })
    }

    async fn publish(&self, function: &FunctionName) -> Result<PublishedVersion, CheckpointError> {
        let live_code = self.api.live_code(function).await.map_err(|source| {
            CheckpointError::LiveCode {
                function: function.to_string(),
                source,
            }
        })?;

        let published = self.api.publish_version(function).await.map_err(|source| {
            CheckpointError::Publish {
                function: function.to_string(),
                source,
            }
        })?;

        log_progress!("Publish the new version: {}", published);
        let live = live_code.live_version().cloned();
        match (&live, &live_code.latest_published) {
            (Some(live), _) => log::debug!(
                "[Checkpoint] {} was live at version {} before publishing {}",
                function,
                live,
                published
            ),
            (None, Some(latest)) => log::info!(
                "[Checkpoint] Live code of {} differs from version {}; checkpoint targets {}",
                function,
                latest.version,
                published
            ),
            (None, None) => log::info!(
                "[Checkpoint] {} had no published version; checkpoint targets {}",
                function,
                published
            ),
        }

        Ok(PublishedVersion {
            function: function.clone(),
            published,
            live,
        })
    }

    async fn upsert_alias(
        &self,
        tracker: &mut PhaseTracker<PublisherPhase>,
        function: &FunctionName,
        alias: &AliasName,
        target: &Version,
    ) -> Result<AliasOutcome, CheckpointError> {
        let update_error = match self.api.update_alias(function, alias, target).await {
            Ok(()) => {
                tracker.advance(PublisherPhase::Aliased);
                log_progress!("Update the alias: {} = {}", alias, target);
                return Ok(AliasOutcome::Updated);
            }
            Err(e) => e,
        };

        if !update_error.is_not_found() && self.fallback == AliasFallback::NotFoundOnly {
            tracker.advance(PublisherPhase::AliasFailed);
            return Err(update_failure(alias, update_error));
        }

        if update_error.is_not_found() {
            log::debug!("[Checkpoint] Alias {} does not exist yet, creating it", alias);
            tracker.advance(PublisherPhase::AliasMissing);
        } else {
            log::warn!(
                "[Checkpoint] Updating alias {} failed ({}); attempting create",
                alias,
                update_error
            );
        }

        tracker.advance(PublisherPhase::Creating);
        match self.api.create_alias(function, alias, target).await {
            Ok(()) => {
                tracker.advance(PublisherPhase::Created);
                log_progress!("Create the new alias: {} = {}", alias, target);
                Ok(AliasOutcome::Created)
            }
            Err(create_error) => {
                tracker.advance(PublisherPhase::CreateFailed);
                if update_error.is_not_found() {
                    Err(CheckpointError::AliasCreate {
                        alias: alias.to_string(),
                        source: create_error,
                    })
                } else {
                    Err(CheckpointError::AliasUpsert {
                        alias: alias.to_string(),
                        update: update_error,
                        create: create_error,
                    })
                }
            }
        }
    }
}

fn update_failure(alias: &AliasName, source: ProviderError) -> CheckpointError {
    if source.is_access_denied() {
        CheckpointError::AliasUpdateDenied {
            alias: alias.to_string(),
            source,
        }
    } else {
        CheckpointError::AliasUpdate {
            alias: alias.to_string(),
            source,
        }
    }
}
