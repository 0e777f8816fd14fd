//! multeq-cli
//!
//! Command-line interface for extracting and editing MultEQ ady files.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{error, info};

use multeq::cli::{AdyTool, Cli, ToolConfig};
use multeq::AdyError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logger
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    info!("multeq-cli v{}", env!("CARGO_PKG_VERSION"));

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            if let Some(hint) = e
                .downcast_ref::<AdyError>()
                .and_then(AdyError::recovery_suggestion)
            {
                eprintln!("hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let tool = AdyTool::new(ToolConfig::from(cli));

    let output = tool
        .process(&cli.input, cli.output.as_deref())
        .with_context(|| format!("failed to process {}", cli.input.display()))?;

    println!("output file: {}", output.display());
    Ok(())
}
