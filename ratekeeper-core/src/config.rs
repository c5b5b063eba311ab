//! Runtime settings shared by the agent and the panel.

use std::path::Path;

use ratekeeper_model::{RateValue, ReadyState};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage key used by previously shipped builds.
pub const DEFAULT_STORAGE_KEY: &str = "youtubeSpeed";
pub const DEFAULT_URL_FRAGMENT: &str = "youtube.com/watch";
pub const ENV_PREFIX: &str = "RATEKEEPER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("preset {0} is outside the playable rate range")]
    InvalidPreset(f64),

    #[error("drift tolerance must be positive, got {0}")]
    InvalidTolerance(f64),

    #[error("storage key must not be empty")]
    EmptyStorageKey,

    #[error("eligible URL fragment must not be empty")]
    EmptyUrlFragment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Key the persisted rate lives under.
    pub storage_key: String,
    /// Substring that marks a page URL as hosting a watchable video.
    pub eligible_url_fragment: String,
    /// Minimum buffering before the agent binds to a video.
    pub ready_threshold: ReadyState,
    /// Rates offered as one-click buttons, in display order.
    pub presets: Vec<f64>,
    /// Live and persisted rates further apart than this are reconciled.
    pub drift_tolerance: f64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            eligible_url_fragment: DEFAULT_URL_FRAGMENT.to_string(),
            ready_threshold: ReadyState::HaveMetadata,
            presets: vec![0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0, 2.5, 3.0],
            drift_tolerance: ratekeeper_model::RATE_TOLERANCE,
        }
    }
}

impl SyncConfig {
    /// Defaults, then the optional file, then `RATEKEEPER_*` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env = config::Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("presets");
        Self::build(path, Some(env))
    }

    /// Defaults plus the file, ignoring the environment.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::build(Some(path), None)
    }

    fn build(
        path: Option<&Path>,
        env: Option<config::Environment>,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        if let Some(env) = env {
            builder = builder.add_source(env);
        }

        let loaded: SyncConfig = builder.build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::EmptyStorageKey);
        }
        if self.eligible_url_fragment.trim().is_empty() {
            return Err(ConfigError::EmptyUrlFragment);
        }
        if !(self.drift_tolerance.is_finite() && self.drift_tolerance > 0.0) {
            return Err(ConfigError::InvalidTolerance(self.drift_tolerance));
        }
        if let Some(bad) = self
            .presets
            .iter()
            .copied()
            .find(|preset| RateValue::new(*preset).is_err())
        {
            return Err(ConfigError::InvalidPreset(bad));
        }
        Ok(())
    }
}
