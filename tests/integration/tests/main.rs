//! End-to-End Integration Tests
//!
//! A Connector and a ProxyService exchange messages through a loopback wire
//! engine. Both nodes use in-memory caches and static metadata.

mod common;
mod failures;
mod flows;
