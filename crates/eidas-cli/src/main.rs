//! # eIDAS CLI
//!
//! Command-line tools for eIDAS node operators.

#![forbid(unsafe_code)]

use clap::Parser;
use eidas_cli::{
    cli::{Cli, Command},
    commands::{run_attributes, run_check_config, run_inspect_cert, run_loa},
    output::error,
};
use tracing_subscriber::EnvFilter;

fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::CheckConfig { file } => run_check_config(&file, cli.output),
        Command::InspectCert(args) => run_inspect_cert(&args, cli.output),
        Command::Attributes(args) => run_attributes(&args, cli.output),
        Command::Loa(cmd) => run_loa(cmd, cli.output),
    };

    if let Err(e) = result {
        error(&e.to_string());
        std::process::exit(1);
    }
}
