//! eIDAS message types.
//!
//! Requests and responses are immutable values; every change produces a new
//! value through a `with_*` transform.

mod constants;
mod name_id;
mod request;
mod response;
mod status;

pub use constants::*;
pub use name_id::*;
pub use request::*;
pub use response::*;
pub use status::*;

pub use eidas_core::config::SpType;

/// Generates a fresh message id.
#[must_use]
pub fn new_message_id() -> String {
    format!("_{}", uuid::Uuid::new_v4().simple())
}
