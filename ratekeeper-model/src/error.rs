use thiserror::Error;

use crate::rate::{MAX_RATE, MIN_RATE};

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("rate {requested} is outside [{min}, {max}]", min = MIN_RATE, max = MAX_RATE)]
    OutOfRange { requested: f64 },

    #[error("'{0}' is not a number")]
    NotANumber(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
