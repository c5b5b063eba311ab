//! The page-resident side of rate synchronization.
//!
//! [`ObserverAgent`] runs as a single tokio task. Three inbound edges feed
//! it: document mutations (coalesced through a [`tokio::sync::Notify`]),
//! rate-change events from the bound element, and sync requests from the
//! panel delivered through an [`AgentHandle`].

mod agent;
mod binding;
mod handle;

pub use agent::{Detection, ObserverAgent};
pub use binding::VideoBinding;
pub use handle::{AgentEvent, AgentHandle};
