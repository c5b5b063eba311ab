use ratekeeper_model::{MAX_RATE, MIN_RATE, ModelError, format_rate};
use thiserror::Error;

/// Failures talking to the store, the page, or the resident agent.
///
/// These never reach the user directly; callers fall back to defaults or
/// treat the call as a no-op unless it was the final write of an apply.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection to {0} was lost")]
    Disconnected(&'static str),

    #[error("no listener is attached on the page")]
    NoListener,

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors surfaced by the control panel to the user.
#[derive(Error, Debug)]
pub enum PanelError {
    #[error("no eligible video page is active")]
    NoTarget,

    #[error("requested rate {requested} is outside [{min}, {max}]", min = MIN_RATE, max = MAX_RATE)]
    Validation { requested: f64 },

    #[error("unreadable rate input '{0}'")]
    InvalidInput(String),

    #[error("failed to write playback rate: {0}")]
    WriteFailed(#[source] TransportError),
}

impl PanelError {
    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            PanelError::NoTarget => "Please navigate to a video page".to_string(),
            PanelError::Validation { .. } | PanelError::InvalidInput(_) => format!(
                "Speed must be between {}x and {}x",
                format_rate(MIN_RATE),
                format_rate(MAX_RATE)
            ),
            PanelError::WriteFailed(_) => {
                "Error setting playback speed. Please refresh the page and try again."
                    .to_string()
            }
        }
    }
}

impl From<ModelError> for PanelError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::OutOfRange { requested } => PanelError::Validation { requested },
            ModelError::NotANumber(input) => PanelError::InvalidInput(input),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
