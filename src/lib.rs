//! Function Rollback
//!
//! Deployment safety for serverless functions: every deploy first captures the
//! live code as a checkpoint (a published version behind the `<function>-rollback`
//! alias), and a rollback re-uploads that checkpoint as the live code.
//!
//! The system is organized into functional modules:
//! - **error**: Unified error type hierarchy
//! - **models**: Function, version and alias types, pipeline step values
//! - **config**: Service settings, loading and validation
//! - **provider**: Function-management API and code download seams (AWS Lambda, HTTP)
//! - **orchestrator**: Checkpoint publisher, rollback executor, phase tracking
//! - **hooks**: Lifecycle events mapped onto the pipelines
//! - **logging**: `log` backend and progress reporting
//!
//! All state lives in the provider; nothing is persisted locally.

pub mod error;
pub mod models;

pub mod config;

pub mod logging;

pub mod provider;

pub mod orchestrator;

pub mod hooks;

// Re-export the log crate for macro usage
pub use log;

pub use error::{
    AppError, CheckpointError, ConfigError, FetchError, ProviderError, Result, RollbackError,
};

pub use models::{
    AliasName, AliasOutcome, CheckpointReport, FunctionCode, FunctionName, RestoreReport,
    Version, CHECKPOINT_ALIAS_SUFFIX,
};

pub use config::{AliasFallback, Settings, Target};

pub use provider::{AwsLambdaProvider, ContentFetcher, FunctionApi, HttpContentFetcher};

pub use orchestrator::{
    CheckpointPublisher, ExecutorPhase, PublisherPhase, RollbackExecutor, RollbackService,
};

pub use hooks::{HookOptions, HookOutcome, LifecycleEvent};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
