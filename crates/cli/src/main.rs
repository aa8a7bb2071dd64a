//! Patcher - patch compliance reports for Jamf Pro
//!
//! Entry point: loads configuration, initializes logging, runs one command
//! and prints any error once before exiting non-zero.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use patcher_core::ReportRequest;
use patcher_domain::Result;
use patcher_infra::config::{self, LoadedConfig};
use patcher_infra::{SetupOptions, SetupOutcome};
use tracing::{debug, error, info};

mod cli;
mod context;
mod logging;
mod prompt;

use cli::{Cli, Command, ReportArgs};
use context::AppContext;
use prompt::TerminalPrompter;

const GREETING: &str = "Thanks for downloading Patcher!

It looks like this is your first time using the tool. The setup assistant will
prompt you for your Jamf Pro URL, username and password. They are only used to
create an API role and client on your behalf and are never stored. The client
credentials and bearer token are kept in your keychain.
";

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let LoadedConfig { config, path: config_path } = match config::load(cli.config.clone()) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match logging::init(cli.debug, &config.paths.log_dir()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Failed to initialize logging: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(e) => debug!(error = %e, "No .env file loaded"),
    }

    let result = match AppContext::new(config, config_path) {
        Ok(mut ctx) => run(cli.command, &mut ctx).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(kind = err.kind(), details = ?err.details(), "{err}");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, ctx: &mut AppContext) -> Result<()> {
    match command {
        Command::Report(args) => report(args, ctx).await,
        Command::Setup => match setup(ctx, SetupOptions::default()).await? {
            SetupOutcome::AlreadyComplete => {
                println!("Setup has already been completed. Use `patcher reset` to start over.");
                Ok(())
            }
            SetupOutcome::Completed | SetupOutcome::Declined => Ok(()),
        },
        Command::Reset => {
            ctx.setup(Arc::new(TerminalPrompter))?.reset()?;
            println!("Stored credentials removed. Restarting setup.");
            setup(ctx, SetupOptions { confirm: false }).await.map(|_| ())
        }
    }
}

/// Run setup and adopt the settings it captured.
async fn setup(ctx: &mut AppContext, options: SetupOptions) -> Result<SetupOutcome> {
    let mut orchestrator = ctx.setup(Arc::new(TerminalPrompter))?;
    if options.confirm && !orchestrator.is_complete()? {
        println!("{GREETING}");
    }

    let outcome = orchestrator.run(options).await?;
    match outcome {
        SetupOutcome::Completed => {
            ctx.config = orchestrator.config().clone();
            println!("Setup complete.");
        }
        SetupOutcome::Declined => println!("We'll be ready when you are!"),
        SetupOutcome::AlreadyComplete => {}
    }
    Ok(outcome)
}

async fn report(args: ReportArgs, ctx: &mut AppContext) -> Result<()> {
    match setup(ctx, SetupOptions::default()).await? {
        SetupOutcome::Declined => return Ok(()),
        SetupOutcome::Completed | SetupOutcome::AlreadyComplete => {}
    }

    let request = ReportRequest {
        path: cli::expand_home(&args.path),
        sort: args.sort,
        omit: args.omit,
        ios: args.ios,
    };

    let written = ctx.report_service()?.process_reports(&request).await?;

    println!("Report saved to {}", written.display());
    Ok(())
}
