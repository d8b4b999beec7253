//! # eidas-cache
//!
//! Cache contracts consumed by the protocol pipeline.
//!
//! ## Caches
//!
//! - [`CorrelationStore`] - Maps a wire-level request id to what is needed to
//!   validate the response that answers it
//! - [`AntiReplayCache`] - Records message ids per country scope and reports
//!   whether an id was seen before
//!
//! [`memory`] provides process-local implementations backed by `dashmap`,
//! suitable for a single node or for tests. Clustered deployments plug in
//! their own implementations of the same traits.
//!
//! ## Example
//!
//! ```ignore
//! use eidas_cache::{AntiReplayCache, CacheResult};
//!
//! async fn first_sighting(cache: &impl AntiReplayCache, id: &str) -> CacheResult<bool> {
//!     cache.check_and_record(id, "ES").await
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod correlation;
pub mod error;
pub mod memory;
pub mod replay;

pub use correlation::CorrelationStore;
pub use error::{CacheError, CacheResult};
pub use memory::{InMemoryAntiReplayCache, InMemoryCorrelationStore};
pub use replay::AntiReplayCache;
