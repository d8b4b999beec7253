//! eIDAS protocol pipeline.
//!
//! This crate implements the security-bearing core of an eIDAS node:
//!
//! - **Level of Assurance reconciliation** between requested, published and
//!   asserted levels across protocol generations 1.1 and 1.2
//! - **Trust validation** of signing certificates and algorithms
//! - **Message processing** for both node roles: the Connector generates
//!   requests and validates responses, the ProxyService validates requests
//!   and generates responses
//! - **Attribute catalogs** with uniqueness invariants and transliteration
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`types`] - Requests, responses, status codes and protocol constants
//! - [`attribute`] - Attribute definitions, values, codecs and catalogs
//! - [`loa`] - Levels of assurance and the reconciliation rules
//! - [`trust`] - Certificate and signature trust checks
//! - [`metadata`] - Counter-party metadata contract
//! - [`engine`] - Wire-level engine contract (XML marshalling and signing)
//! - [`processor`] - Connector and ProxyService half-flows
//! - [`error`] - Error types for protocol operations
//!
//! # Example
//!
//! ```rust,ignore
//! use eidas_protocol::processor::{ConnectorProcessor, RequestContext};
//! use eidas_protocol::types::HttpMethod;
//!
//! let ctx = RequestContext::new(HttpMethod::Post).with_remote_ip("10.0.0.7");
//! let outbound = connector.process_sp_request(&ctx, sp_request).await?;
//! // hand outbound.bytes to the browser, addressed to outbound.destination
//! ```
//!
//! XML (de)serialisation, XML-DSig computation, metadata retrieval and cache
//! storage are consumed through the traits in [`engine`], [`metadata`] and
//! `eidas-cache`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod attribute;
pub mod engine;
pub mod error;
pub mod loa;
pub mod metadata;
pub mod processor;
pub mod trust;
pub mod types;

pub use error::{ErrorCategory, FailureReply, ProtocolError, ProtocolResult};
pub use types::*;
