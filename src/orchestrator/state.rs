//! Phase tracking for the checkpoint and rollback pipelines.
//!
//! **Architecture**:
//! - `PublisherPhase`: states of the checkpoint publisher
//! - `ExecutorPhase`: states of the rollback executor
//! - `PhaseTracker`: records the visited phases and rejects illegal transitions
//!
//! Both pipelines share the naming convention but have disjoint states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Common behavior of the pipeline phase enums.
pub trait Phase: Copy + Eq + fmt::Debug {
    /// Starting phase of every run.
    const INITIAL: Self;

    fn as_str(&self) -> &'static str;

    fn valid_next_phases(&self) -> Vec<Self>;

    fn can_transition_to(&self, next: Self) -> bool {
        self.valid_next_phases().contains(&next)
    }

    fn is_terminal(&self) -> bool {
        self.valid_next_phases().is_empty()
    }

    fn is_success(&self) -> bool;
}

/// Checkpoint publisher phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublisherPhase {
    Idle,

    /// Capturing the live version and publishing a new one
    Publishing,

    PublishFailed,

    Published,

    /// Repointing the checkpoint alias
    Aliasing,

    /// Update reported the alias missing; falling back to create
    AliasMissing,

    Creating,

    Created,

    CreateFailed,

    /// Existing alias repointed
    Aliased,

    /// Update failed for a reason other than a missing alias
    AliasFailed,
}

impl Phase for PublisherPhase {
    const INITIAL: Self = PublisherPhase::Idle;

    fn as_str(&self) -> &'static str {
        match self {
            PublisherPhase::Idle => "idle",
            PublisherPhase::Publishing => "publishing",
            PublisherPhase::PublishFailed => "publish_failed",
            PublisherPhase::Published => "published",
            PublisherPhase::Aliasing => "aliasing",
            PublisherPhase::AliasMissing => "alias_missing",
            PublisherPhase::Creating => "creating",
            PublisherPhase::Created => "created",
            PublisherPhase::CreateFailed => "create_failed",
            PublisherPhase::Aliased => "aliased",
            PublisherPhase::AliasFailed => "alias_failed",
        }
    }

    fn valid_next_phases(&self) -> Vec<Self> {
        use PublisherPhase::*;
        match self {
            Idle => vec![Publishing],
            Publishing => vec![Published, PublishFailed],
            Published => vec![Aliasing],
            // Creating directly is the lenient fallback after a non-not-found failure
            Aliasing => vec![Aliased, AliasMissing, Creating, AliasFailed],
            AliasMissing => vec![Creating],
            Creating => vec![Created, CreateFailed],
            PublishFailed | Created | CreateFailed | Aliased | AliasFailed => vec![],
        }
    }

    fn is_success(&self) -> bool {
        matches!(self, PublisherPhase::Aliased | PublisherPhase::Created)
    }
}

/// Rollback executor phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorPhase {
    Idle,

    /// Reading the function record behind the checkpoint alias
    ResolvingCheckpoint,

    /// No checkpoint alias exists
    NotFound,

    ResolveFailed,

    Resolved,

    /// Downloading the checkpoint archive
    Fetching,

    FetchFailed,

    Fetched,

    /// Replacing the live code
    Uploading,

    UploadFailed,

    Restored,
}

impl Phase for ExecutorPhase {
    const INITIAL: Self = ExecutorPhase::Idle;

    fn as_str(&self) -> &'static str {
        match self {
            ExecutorPhase::Idle => "idle",
            ExecutorPhase::ResolvingCheckpoint => "resolving_checkpoint",
            ExecutorPhase::NotFound => "not_found",
            ExecutorPhase::ResolveFailed => "resolve_failed",
            ExecutorPhase::Resolved => "resolved",
            ExecutorPhase::Fetching => "fetching",
            ExecutorPhase::FetchFailed => "fetch_failed",
            ExecutorPhase::Fetched => "fetched",
            ExecutorPhase::Uploading => "uploading",
            ExecutorPhase::UploadFailed => "upload_failed",
            ExecutorPhase::Restored => "restored",
        }
    }

    fn valid_next_phases(&self) -> Vec<Self> {
        use ExecutorPhase::*;
        match self {
            Idle => vec![ResolvingCheckpoint],
            ResolvingCheckpoint => vec![Resolved, NotFound, ResolveFailed],
            Resolved => vec![Fetching],
            Fetching => vec![Fetched, FetchFailed],
            Fetched => vec![Uploading],
            Uploading => vec![Restored, UploadFailed],
            NotFound | ResolveFailed | FetchFailed | UploadFailed | Restored => vec![],
        }
    }

    fn is_success(&self) -> bool {
        matches!(self, ExecutorPhase::Restored)
    }
}

impl PublisherPhase {
    pub fn as_str(&self) -> &'static str {
        Phase::as_str(self)
    }
}

impl ExecutorPhase {
    pub fn as_str(&self) -> &'static str {
        Phase::as_str(self)
    }
}

impl fmt::Display for PublisherPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Phase::as_str(self))
    }
}

impl fmt::Display for ExecutorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Phase::as_str(self))
    }
}

/// Ordered record of the phases one pipeline run went through.
#[derive(Debug, Clone)]
pub struct PhaseTracker<P: Phase> {
    label: &'static str,
    history: Vec<P>,
}

impl<P: Phase> PhaseTracker<P> {
    pub fn new(label: &'static str) -> Self {
        PhaseTracker {
            label,
            history: vec![P::INITIAL],
        }
    }

    pub fn current(&self) -> P {
        self.history.last().copied().unwrap_or(P::INITIAL)
    }

    /// Attempt to transition to the next phase.
    pub fn transition_to(&mut self, next: P) -> Result<(), String> {
        let current = self.current();
        if !current.can_transition_to(next) {
            return Err(format!(
                "Invalid phase transition: {} -> {}",
                current.as_str(),
                next.as_str()
            ));
        }
        log::debug!(
            "[{}] PHASE TRANSITION: {} -> {}",
            self.label,
            current.as_str(),
            next.as_str()
        );
        self.history.push(next);
        Ok(())
    }

    /// Transition used by the pipelines, whose call order is fixed.
    pub(crate) fn advance(&mut self, next: P) {
        if let Err(e) = self.transition_to(next) {
            debug_assert!(false, "{}", e);
            log::error!("[{}] {}", self.label, e);
        }
    }

    pub fn history(&self) -> &[P] {
        &self.history
    }

    pub fn into_history(self) -> Vec<P> {
        self.history
    }

    /// Phase names joined with arrows, for logs.
    pub fn trail(&self) -> String {
        self.history
            .iter()
            .map(|phase| phase.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}
