use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use function_rollback::config::loader;
use function_rollback::hooks::{self, HookOptions, HookOutcome, LifecycleEvent};
use function_rollback::{AppError, AwsLambdaProvider, HttpContentFetcher, RollbackService};

/// Checkpoint and roll back serverless functions.
#[derive(Debug, Parser)]
#[command(name = "function_rollback", version, about)]
struct Cli {
    /// Settings file (.toml or .json); defaults to ./rollback.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase diagnostic output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Publish the live code and point the rollback alias at it (pre-deploy)
    Checkpoint(FunctionArgs),

    /// Rollback commands
    Rollback {
        #[command(subcommand)]
        target: RollbackTarget,
    },

    /// Run the handler bound to a host lifecycle event
    Hook {
        /// e.g. before:deploy:function:deploy
        event: String,

        #[command(flatten)]
        args: FunctionArgs,
    },
}

#[derive(Debug, Subcommand)]
enum RollbackTarget {
    /// Rollback the function to the previous version
    Function(FunctionArgs),
}

#[derive(Debug, Clone, Args)]
struct FunctionArgs {
    /// Name of the function
    #[arg(short = 'f', long)]
    function: String,

    /// Stage of the function
    #[arg(short, long)]
    stage: Option<String>,

    /// Region of the function
    #[arg(short, long)]
    region: Option<String>,
}

impl From<FunctionArgs> for HookOptions {
    fn from(args: FunctionArgs) -> Self {
        HookOptions {
            function: args.function,
            stage: args.stage,
            region: args.region,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = function_rollback::logging::init_logging(cli.verbose) {
        eprintln!("[Main] WARNING: Failed to install logger: {}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<AppError>() {
                Some(app_error) => log::error!("{}", app_error.user_message()),
                None => log::error!("{:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let (event, args) = match cli.command {
        Command::Checkpoint(args) => (LifecycleEvent::BeforeDeployFunction, args),
        Command::Rollback {
            target: RollbackTarget::Function(args),
        } => (LifecycleEvent::RollbackFunction, args),
        Command::Hook { event, args } => (event.parse::<LifecycleEvent>()?, args),
    };

    let path = loader::locate_settings(cli.config.as_deref()).map_err(AppError::from)?;
    let settings = loader::load_settings_from_file(&path)
        .map_err(AppError::from)
        .with_context(|| format!("loading {}", path.display()))?;

    let target = hooks::validate(&settings, &HookOptions::from(args))?;

    let api = AwsLambdaProvider::connect(&settings.provider, &target.region).await;
    let service = RollbackService::new(
        Arc::new(api),
        Arc::new(HttpContentFetcher::new()),
        &settings.rollback,
    );

    match hooks::dispatch(event, &service, &target).await? {
        HookOutcome::Checkpointed(report) => log::info!(
            "[Main] Checkpoint of {} complete: {} -> {}",
            report.function,
            report.alias,
            report.target
        ),
        HookOutcome::RolledBack(report) => log::info!(
            "[Main] Rollback of {} complete ({} bytes)",
            report.function,
            report.bytes_uploaded
        ),
    }

    Ok(())
}
