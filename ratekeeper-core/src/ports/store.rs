use std::sync::Arc;

use async_trait::async_trait;
use ratekeeper_model::RateValue;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;

/// Durable key-value storage shared by the agent and the panel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// The one persisted rate, read and written under a fixed key.
#[derive(Clone)]
pub struct PersistedRate {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl std::fmt::Debug for PersistedRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedRate")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl PersistedRate {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the stored rate, propagating transport failures.
    ///
    /// A stored value that is not a positive finite number counts as absent.
    /// Positive values outside the rate range are clamped.
    pub async fn try_load(&self) -> Result<Option<RateValue>> {
        let Some(value) = self.store.get(&self.key).await? else {
            return Ok(None);
        };
        match value.as_f64().and_then(RateValue::from_observed) {
            Some(rate) => Ok(Some(rate)),
            None => {
                warn!(key = %self.key, %value, "ignoring malformed persisted rate");
                Ok(None)
            }
        }
    }

    /// Read the stored rate, treating a failed read as absent.
    pub async fn load(&self) -> Option<RateValue> {
        match self.try_load().await {
            Ok(rate) => rate,
            Err(e) => {
                debug!(key = %self.key, "persisted rate read failed: {}", e);
                None
            }
        }
    }

    /// Read the stored rate or fall back to the default rate.
    pub async fn load_or_default(&self) -> RateValue {
        self.load().await.unwrap_or_default()
    }

    pub async fn save(&self, rate: RateValue) -> Result<()> {
        self.store.set(&self.key, Value::from(rate.get())).await
    }
}
