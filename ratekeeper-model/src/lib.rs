//! Core data model definitions shared across ratekeeper crates.
#![allow(missing_docs)]

pub mod error;
pub mod message;
pub mod rate;
pub mod ready;

pub use error::{ModelError, Result as ModelResult};
pub use message::{SyncRequest, SyncResponse};
pub use rate::{
    DEFAULT_RATE, MAX_RATE, MIN_RATE, RATE_STEP, RATE_TOLERANCE, RateValue,
    format_rate,
};
pub use ready::ReadyState;
