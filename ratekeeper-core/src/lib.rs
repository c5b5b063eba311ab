//! # Ratekeeper Core
//!
//! Keeps a user-chosen video playback rate consistent between three places:
//! the persisted rate in a key-value store, the live video element on the
//! page, and the rate shown by the control panel.
//!
//! ## Architecture
//!
//! - [`ports`]: the traits every collaborator is reached through
//! - [`observer`]: the page-resident [`ObserverAgent`], a single tokio task
//!   that binds each new video, restores the persisted rate onto it and
//!   writes native rate changes back
//! - [`panel`]: the transient [`ControlPanel`] that reconciles on open and
//!   applies user-chosen rates
//! - [`infra`]: the durable [`JsonFileStore`]
//! - [`local`]: in-process page, tab and store implementations
//! - [`config`]: [`SyncConfig`] loading and validation
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ratekeeper_core::{
//!     ControlPanel, ObserverAgent, SyncConfig,
//!     local::{LocalBridge, LocalDocument, LocalVideo, MemoryStore},
//! };
//!
//! # async fn demo() {
//! let config = SyncConfig::default();
//! let store = Arc::new(MemoryStore::new());
//! let document = LocalDocument::with_video(LocalVideo::playable(1.0));
//!
//! let (agent, _task) = ObserverAgent::spawn(&config, store.clone(), document.clone());
//! let bridge = LocalBridge::with_page("https://www.youtube.com/watch?v=abc", document);
//! bridge.attach_agent(agent);
//!
//! let mut panel = ControlPanel::new(config, store, Arc::new(bridge));
//! panel.reconcile_on_open().await;
//! panel.apply_rate(1.5).await.ok();
//! # }
//! ```

#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod infra;
pub mod local;
pub mod observer;
pub mod panel;
pub mod ports;

pub use config::{ConfigError, SyncConfig};
pub use error::{PanelError, Result, TransportError};
pub use infra::JsonFileStore;
pub use observer::{AgentHandle, Detection, ObserverAgent};
pub use panel::{ControlPanel, Notice, PanelControls, Reconciliation};
pub use ports::{KeyValueStore, PageBridge, PageTarget, PersistedRate};
