//! Trait surfaces for the collaborators the sync protocol depends on.
//!
//! The store and the page bridge are asynchronous request/response seams.
//! Video elements and the document are synchronous handles because the page
//! exposes them as live objects.

pub mod bridge;
pub mod document;
pub mod store;
pub mod video;

pub use bridge::{PageBridge, PageTarget};
pub use document::{Document, MutationListener};
pub use store::{KeyValueStore, PersistedRate};
pub use video::{ListenerId, RateListener, VideoHandle, VideoId};
