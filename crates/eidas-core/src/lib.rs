//! # eidas-core
//!
//! Configuration, error catalog and audit events shared by every eIDAS node crate.
//!
//! ## Contents
//!
//! - [`config`]: TOML-backed node configuration for the Connector and ProxyService roles
//! - [`catalog`]: the fixed table of `(code, message)` pairs surfaced to counter-parties
//! - [`error`]: configuration and I/O errors raised while bootstrapping a node
//! - [`event`]: structured audit events emitted by the protocol pipeline

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod event;

pub use catalog::ErrorKey;
pub use config::NodeConfig;
pub use error::{Error, Result};
