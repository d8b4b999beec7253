//! # eidas-cli
//!
//! Operator tools for an eIDAS node.
//!
//! This crate provides command-line utilities for:
//! - Checking a node configuration file before deployment
//! - Running the signer certificate trust checks against a PEM file
//! - Listing the registered attribute definitions
//! - Evaluating the level of assurance rules

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use error::{CliError, CliResult};
