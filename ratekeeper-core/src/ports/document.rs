use std::sync::Arc;

use super::video::{ListenerId, VideoHandle};

/// Callback fired on any structural change anywhere in the document.
pub type MutationListener = Box<dyn Fn() + Send + Sync>;

/// The host page's content tree, reduced to what the agent needs.
pub trait Document: Send + Sync {
    /// The page's video element, if one is present.
    fn video(&self) -> Option<Arc<dyn VideoHandle>>;
    /// Register for subtree insert/remove notifications.
    fn observe_mutations(&self, listener: MutationListener) -> ListenerId;
    fn unobserve_mutations(&self, listener: ListenerId);
}
