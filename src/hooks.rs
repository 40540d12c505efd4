//! Lifecycle hook dispatch.
//!
//! A deploy host invokes `before:deploy:function:deploy` ahead of every function
//! deploy and `rollback:function:rollback` when the user asks for a rollback. Both
//! validate the invocation against the settings before touching the provider.

use std::fmt;
use std::str::FromStr;

use crate::config::{Settings, Target};
use crate::error::{AppError, Result};
use crate::models::{CheckpointReport, RestoreReport};
use crate::orchestrator::RollbackService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// Validate, then checkpoint
    BeforeDeployFunction,
    /// Validate, then roll back
    RollbackFunction,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 2] = [
        LifecycleEvent::BeforeDeployFunction,
        LifecycleEvent::RollbackFunction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleEvent::BeforeDeployFunction => "before:deploy:function:deploy",
            LifecycleEvent::RollbackFunction => "rollback:function:rollback",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleEvent {
    type Err = AppError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        LifecycleEvent::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| AppError::UnknownEvent(s.to_string()))
    }
}

/// Options supplied by the host with every hook invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookOptions {
    pub function: String,
    pub stage: Option<String>,
    pub region: Option<String>,
}

/// What a hook run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    Checkpointed(CheckpointReport),
    RolledBack(RestoreReport),
}

/// Validate the hook options and resolve the target function.
pub fn validate(settings: &Settings, options: &HookOptions) -> Result<Target> {
    settings.validate()?;
    let target = settings.target(
        &options.function,
        options.stage.as_deref(),
        options.region.as_deref(),
    )?;
    log::debug!(
        "[Hooks] {} resolved to {} ({} / {})",
        target.key,
        target.function,
        target.stage,
        target.region
    );
    Ok(target)
}

/// Run the pipeline bound to `event` for an already validated target.
pub async fn dispatch(
    event: LifecycleEvent,
    service: &RollbackService,
    target: &Target,
) -> Result<HookOutcome> {
    log::info!("[Hooks] {} for {}", event, target.function);
    match event {
        LifecycleEvent::BeforeDeployFunction => {
            let report = service.checkpoint(&target.function).await?;
            Ok(HookOutcome::Checkpointed(report))
        }
        LifecycleEvent::RollbackFunction => {
            let report = service.rollback(&target.function).await?;
            Ok(HookOutcome::RolledBack(report))
        }
    }
}
