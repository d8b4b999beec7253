//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// eIDAS node operator tool.
#[derive(Debug, Parser)]
#[command(name = "eidas")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format.
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub output: OutputFormat,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load and validate a node configuration file.
    CheckConfig {
        /// TOML configuration file.
        #[arg(env = "EIDAS_CONFIG")]
        file: PathBuf,
    },

    /// Run the signer certificate checks against a PEM file.
    InspectCert(InspectCertArgs),

    /// List the registered attribute definitions.
    Attributes(AttributesArgs),

    /// Level of assurance rules.
    #[command(subcommand)]
    Loa(LoaCommand),
}

/// Certificate inspection arguments.
#[derive(Debug, clap::Args)]
pub struct InspectCertArgs {
    /// PEM file holding the signer certificate first, then its chain.
    pub pem: PathBuf,

    /// Node configuration supplying the trust policy and anchors.
    #[arg(short, long, env = "EIDAS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Country the certificate must be issued for.
    #[arg(long)]
    pub country: Option<String>,
}

/// Attribute listing arguments.
#[derive(Debug, clap::Args)]
pub struct AttributesArgs {
    /// Only list attributes of this person type (e.g. NaturalPerson).
    #[arg(long)]
    pub person_type: Option<String>,

    /// Only list mandatory attributes.
    #[arg(long)]
    pub required: bool,
}

/// Level of assurance commands.
#[derive(Debug, Subcommand)]
pub enum LoaCommand {
    /// Evaluate requested, published and asserted levels against each other.
    ///
    /// Levels are URIs or one of the shorthands low, substantial and high.
    Check {
        /// Requested levels, in request order.
        #[arg(short, long = "requested", required = true, num_args = 1..)]
        requested: Vec<String>,

        /// Levels published by the ProxyService.
        #[arg(short, long = "published", num_args = 1..)]
        published: Vec<String>,

        /// Level asserted in a response.
        #[arg(short = 'a', long)]
        asserted: Option<String>,

        /// Protocol version of the ProxyService.
        #[arg(long, default_value = "1.2")]
        protocol_version: String,
    },

    /// Show the levels a Connector would send to a target.
    Wire {
        /// Requested levels, in request order.
        #[arg(required = true)]
        levels: Vec<String>,

        /// Protocol versions published by the target.
        #[arg(short, long = "target-version", num_args = 1..)]
        target_versions: Vec<String>,
    },
}
