use std::fmt;

use ratekeeper_model::ReadyState;

/// Identity of one concrete video element instance.
///
/// A replaced element gets a new id even if it sits at the same place in the
/// document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VideoId(pub u64);

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "video#{}", self.0)
    }
}

/// Token returned when a rate listener is attached, used to detach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Callback fired after the element's rate has actually changed.
pub type RateListener = Box<dyn Fn() + Send + Sync>;

/// A live video element.
pub trait VideoHandle: Send + Sync {
    fn id(&self) -> VideoId;
    fn ready_state(&self) -> ReadyState;
    fn rate(&self) -> f64;
    fn set_rate(&self, rate: f64);
    /// Attach a listener. It fires for native and programmatic changes alike.
    fn add_rate_listener(&self, listener: RateListener) -> ListenerId;
    fn remove_rate_listener(&self, listener: ListenerId);
}

impl fmt::Debug for dyn VideoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoHandle")
            .field("id", &self.id())
            .field("ready_state", &self.ready_state())
            .field("rate", &self.rate())
            .finish()
    }
}
