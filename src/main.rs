//! sceneqa - Quality checks for 3D scene graphs
//!
//! This is the main entry point for the CLI application.

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sceneqa::cli::{self, exit_codes, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    if let Some(dir) = &cli.directory {
        if let Err(e) = std::env::set_current_dir(dir) {
            eprintln!(
                "{} Cannot change to {}: {}",
                "Error:".red().bold(),
                dir.display(),
                e
            );
            std::process::exit(exit_codes::INVALID_ARGS);
        }
    }

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Init(args) => cli::commands::init::execute(args).await,
        Commands::List(args) => cli::commands::list::execute(args, config).await,
        Commands::Collections(args) => cli::commands::collections::execute(args, config).await,
        Commands::Explain(args) => cli::commands::explain::execute(args, config).await,
        Commands::Audit(args) => cli::commands::audit::execute(args, config).await,
        Commands::Fix(args) => cli::commands::fix::execute(args, config).await,
    };

    // Exit codes are the CI contract
    match result {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(exit_codes::ERROR);
        }
    }
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}
