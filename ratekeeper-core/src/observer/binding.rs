use std::sync::Arc;

use crate::ports::{ListenerId, RateListener, VideoHandle, VideoId};

/// The agent's attachment to one concrete video element.
///
/// Holds the element and the one rate listener registered on it. Dropping
/// the binding detaches the listener.
#[derive(Debug)]
pub struct VideoBinding {
    video: Arc<dyn VideoHandle>,
    listener: ListenerId,
}

impl VideoBinding {
    pub fn attach(video: Arc<dyn VideoHandle>, listener: RateListener) -> Self {
        let listener = video.add_rate_listener(listener);
        Self { video, listener }
    }

    pub fn video_id(&self) -> VideoId {
        self.video.id()
    }

    pub fn video(&self) -> &Arc<dyn VideoHandle> {
        &self.video
    }

    pub fn is_bound_to(&self, video: &dyn VideoHandle) -> bool {
        self.video_id() == video.id()
    }
}

impl Drop for VideoBinding {
    fn drop(&mut self) {
        self.video.remove_rate_listener(self.listener);
    }
}
