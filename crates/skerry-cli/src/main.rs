//! Skerry CLI binary entrypoint.
//!
//! This is the main entry point for the `skerry` command-line tool.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use skerry_cli::cli::{Cli, Commands};
use skerry_cli::commands::{ConfigCommand, ScriptCommand, ServiceCommand, TableCommand};
use skerry_cli::output::OutputFormat;
use skerry_client::HttpTransport;

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Run async runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), skerry_cli::CliError> {
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    let mut transport = HttpTransport::new(&cli.endpoint)
        .map_err(|e| skerry_cli::CliError::Config(e.to_string()))?;
    if let Some(token) = &cli.token {
        transport = transport.with_token(token.clone());
    }

    match cli.command {
        Commands::Service { command } => {
            let cmd = ServiceCommand::new(transport);
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::Config { command } => {
            let cmd = ConfigCommand::new(transport);
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::Table { command } => {
            let cmd = TableCommand::new(transport);
            cmd.execute(&mut stdout, &format, &command).await?;
        }
        Commands::Script { command } => {
            let cmd = ScriptCommand::new(transport);
            cmd.execute(&mut stdout, &format, &command).await?;
        }
    }

    Ok(())
}
