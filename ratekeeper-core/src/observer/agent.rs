use std::sync::Arc;

use ratekeeper_model::{RateValue, ReadyState, SyncRequest, SyncResponse};
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::binding::VideoBinding;
use super::handle::{AgentEvent, AgentHandle};
use crate::config::SyncConfig;
use crate::ports::{
    Document, KeyValueStore, ListenerId, PersistedRate, VideoHandle, VideoId,
};

/// Result of one detection pass over the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// No video on the page and nothing bound.
    NoVideo,
    /// A video is present but has not buffered enough yet.
    NotReady(VideoId),
    /// The present video is the one already bound.
    Unchanged(VideoId),
    /// A new binding was established.
    Bound(VideoId),
    /// The bound video left the page; the binding was dropped.
    Released(VideoId),
}

/// Page-resident agent that restores the persisted rate onto each new video
/// and writes back rate changes made through the native player.
pub struct ObserverAgent {
    rate: PersistedRate,
    document: Arc<dyn Document>,
    ready_threshold: ReadyState,
    binding: Option<VideoBinding>,
    observer: Option<ListenerId>,
    events: mpsc::UnboundedSender<AgentEvent>,
}

impl std::fmt::Debug for ObserverAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverAgent")
            .field("rate", &self.rate)
            .field("ready_threshold", &self.ready_threshold)
            .field("bound", &self.bound_video())
            .finish()
    }
}

impl ObserverAgent {
    /// Build an agent without starting it.
    ///
    /// The returned receiver carries the events raised by the listeners the
    /// agent attaches; pass it to [`ObserverAgent::run`].
    pub fn new(
        config: &SyncConfig,
        store: Arc<dyn KeyValueStore>,
        document: Arc<dyn Document>,
    ) -> (Self, mpsc::UnboundedReceiver<AgentEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let agent = Self {
            rate: PersistedRate::new(store, config.storage_key.clone()),
            document,
            ready_threshold: config.ready_threshold,
            binding: None,
            observer: None,
            events,
        };
        (agent, receiver)
    }

    /// Build the agent, subscribe it to document mutations and run it on the
    /// current tokio runtime.
    pub fn spawn(
        config: &SyncConfig,
        store: Arc<dyn KeyValueStore>,
        document: Arc<dyn Document>,
    ) -> (AgentHandle, JoinHandle<()>) {
        let (mut agent, receiver) = Self::new(config, store, document);
        let mutations = Arc::new(Notify::new());

        let notify = Arc::clone(&mutations);
        agent.observer = Some(
            agent
                .document
                .observe_mutations(Box::new(move || notify.notify_one())),
        );

        let handle = AgentHandle {
            events: agent.events.clone(),
        };
        let task = tokio::spawn(agent.run(receiver, mutations));
        (handle, task)
    }

    /// Event loop. Runs an initial detection pass, then serves coalesced
    /// mutation notifications and queued events until shut down. Neither
    /// source is preferred over the other.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<AgentEvent>,
        mutations: Arc<Notify>,
    ) {
        info!(key = %self.rate.key(), "observer agent started");
        self.detect().await;

        loop {
            tokio::select! {
                _ = mutations.notified() => {
                    self.detect().await;
                }
                event = events.recv() => match event {
                    Some(AgentEvent::Shutdown) | None => break,
                    Some(event) => self.handle_event(event).await,
                },
            }
        }

        self.binding = None;
        if let Some(observer) = self.observer.take() {
            self.document.unobserve_mutations(observer);
        }
        info!("observer agent stopped");
    }

    async fn handle_event(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::RateChanged(video) => {
                if self.bound_video() == Some(video) {
                    self.on_rate_changed().await;
                } else {
                    debug!(%video, "dropping rate change from unbound video");
                }
            }
            AgentEvent::SetSpeed { request, reply } => {
                let response = match request {
                    SyncRequest::SetSpeed { speed } => self.on_external_set_speed(speed).await,
                };
                if reply.send(response).is_err() {
                    debug!("sync requester went away before the acknowledgement");
                }
            }
            AgentEvent::Barrier(done) => {
                // Catch up with mutations that raced ahead of the barrier.
                self.detect().await;
                let _ = done.send(());
            }
            AgentEvent::Shutdown => {}
        }
    }

    pub fn bound_video(&self) -> Option<VideoId> {
        self.binding.as_ref().map(VideoBinding::video_id)
    }

    /// One level-triggered pass: find the page's video and bind it if it is
    /// ready and not already bound.
    pub async fn detect(&mut self) -> Detection {
        let Some(video) = self.document.video() else {
            return match self.binding.take() {
                Some(stale) => {
                    let id = stale.video_id();
                    debug!(video = %id, "bound video left the page");
                    Detection::Released(id)
                }
                None => Detection::NoVideo,
            };
        };

        if let Some(binding) = &self.binding
            && binding.is_bound_to(video.as_ref())
        {
            return Detection::Unchanged(binding.video_id());
        }

        let id = video.id();
        if let Some(stale) = self.binding.take() {
            debug!(old = %stale.video_id(), new = %id, "video element replaced");
        }

        if video.ready_state() < self.ready_threshold {
            return Detection::NotReady(id);
        }

        let events = self.events.clone();
        self.binding = Some(VideoBinding::attach(
            Arc::clone(&video),
            Box::new(move || {
                let _ = events.send(AgentEvent::RateChanged(id));
            }),
        ));
        info!(video = %id, "bound video element");

        self.on_video_ready(video.as_ref()).await;
        Detection::Bound(id)
    }

    /// Restore the persisted rate onto `video`. Returns whether the rate was
    /// changed.
    pub async fn on_video_ready(&self, video: &dyn VideoHandle) -> bool {
        let target = self.rate.load_or_default().await;
        if video.rate() == target.get() {
            return false;
        }
        debug!(video = %video.id(), rate = %target, "restoring persisted rate");
        video.set_rate(target.get());
        true
    }

    /// Persist the bound video's current rate.
    pub async fn on_rate_changed(&self) {
        let Some(binding) = &self.binding else {
            return;
        };
        let observed = binding.video().rate();
        let Some(rate) = RateValue::from_observed(observed) else {
            debug!(rate = observed, "ignoring non-positive rate reading");
            return;
        };
        if let Err(e) = self.rate.save(rate).await {
            warn!(rate = %rate, "failed to persist native rate change: {}", e);
        }
    }

    /// Apply and persist a rate pushed by the panel. Always acknowledged.
    pub async fn on_external_set_speed(&self, requested: f64) -> SyncResponse {
        let rate = RateValue::clamped(requested);
        match self.document.video() {
            Some(video) => {
                if video.rate() != rate.get() {
                    video.set_rate(rate.get());
                }
                if let Err(e) = self.rate.save(rate).await {
                    warn!(rate = %rate, "failed to persist pushed rate: {}", e);
                }
            }
            None => debug!(rate = %rate, "no video for pushed rate"),
        }
        SyncResponse::ack()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::{LocalDocument, LocalVideo, MemoryStore};
    use serde_json::json;

    const KEY: &str = "youtubeSpeed";

    fn agent_for(
        store: &MemoryStore,
        document: &Arc<LocalDocument>,
    ) -> (ObserverAgent, mpsc::UnboundedReceiver<AgentEvent>) {
        ObserverAgent::new(
            &SyncConfig::default(),
            Arc::new(store.clone()),
            Arc::clone(document) as Arc<dyn Document>,
        )
    }

    #[tokio::test]
    async fn on_video_ready_is_idempotent() {
        let store = MemoryStore::with_value(KEY, json!(1.5));
        let video = LocalVideo::playable(1.0);
        let document = LocalDocument::with_video(Arc::clone(&video));
        let (agent, _events) = agent_for(&store, &document);

        assert!(agent.on_video_ready(video.as_ref()).await);
        assert!(!agent.on_video_ready(video.as_ref()).await);

        assert_eq!(video.programmatic_sets(), 1);
        assert_eq!(video.rate(), 1.5);
    }

    #[tokio::test]
    async fn absent_rate_restores_default() {
        let store = MemoryStore::new();
        let video = LocalVideo::playable(2.0);
        let document = LocalDocument::with_video(Arc::clone(&video));
        let (agent, _events) = agent_for(&store, &document);

        agent.on_video_ready(video.as_ref()).await;
        assert_eq!(video.rate(), 1.0);
    }

    #[tokio::test]
    async fn failed_read_applies_default() {
        let store = MemoryStore::with_value(KEY, json!(2.0));
        store.set_fail_reads(true);
        let video = LocalVideo::playable(1.5);
        let document = LocalDocument::with_video(Arc::clone(&video));
        let (agent, _events) = agent_for(&store, &document);

        agent.on_video_ready(video.as_ref()).await;
        assert_eq!(video.rate(), 1.0);
    }

    #[tokio::test]
    async fn repeated_detection_binds_once() {
        let store = MemoryStore::new();
        let video = LocalVideo::playable(1.0);
        let document = LocalDocument::with_video(Arc::clone(&video));
        let (mut agent, _events) = agent_for(&store, &document);

        assert_eq!(agent.detect().await, Detection::Bound(video.id()));
        for _ in 0..5 {
            assert_eq!(agent.detect().await, Detection::Unchanged(video.id()));
        }
        assert_eq!(video.listener_count(), 1);
    }

    #[tokio::test]
    async fn waits_for_metadata_before_binding() {
        let store = MemoryStore::with_value(KEY, json!(2.0));
        let video = LocalVideo::new(1.0, ReadyState::HaveNothing);
        let document = LocalDocument::with_video(Arc::clone(&video));
        let (mut agent, _events) = agent_for(&store, &document);

        assert_eq!(agent.detect().await, Detection::NotReady(video.id()));
        assert_eq!(video.listener_count(), 0);

        video.set_ready_state(ReadyState::HaveMetadata);
        assert_eq!(agent.detect().await, Detection::Bound(video.id()));
        assert_eq!(video.rate(), 2.0);
    }

    #[tokio::test]
    async fn replaced_video_is_rebound() {
        let store = MemoryStore::new();
        let first = LocalVideo::playable(1.0);
        let document = LocalDocument::with_video(Arc::clone(&first));
        let (mut agent, mut events) = agent_for(&store, &document);
        agent.detect().await;

        document.remove_video();
        assert_eq!(agent.detect().await, Detection::Released(first.id()));
        assert_eq!(first.listener_count(), 0);

        let second = LocalVideo::playable(1.0);
        document.insert_video(Arc::clone(&second));
        assert_eq!(agent.detect().await, Detection::Bound(second.id()));
        assert_eq!(second.listener_count(), 1);

        second.native_set_rate(1.75);
        match events.try_recv() {
            Ok(AgentEvent::RateChanged(id)) => assert_eq!(id, second.id()),
            other => panic!("expected rate change event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_change_is_persisted_and_clamped() {
        let store = MemoryStore::new();
        let video = LocalVideo::playable(1.0);
        let document = LocalDocument::with_video(Arc::clone(&video));
        let (mut agent, _events) = agent_for(&store, &document);
        agent.detect().await;

        video.native_set_rate(2.5);
        agent.on_rate_changed().await;
        assert_eq!(store.value(KEY), Some(json!(2.5)));

        video.native_set_rate(16.0);
        agent.on_rate_changed().await;
        assert_eq!(store.value(KEY), Some(json!(4.0)));
    }

    #[tokio::test]
    async fn stale_rate_change_is_ignored() {
        let store = MemoryStore::new();
        let video = LocalVideo::playable(1.0);
        let document = LocalDocument::with_video(Arc::clone(&video));
        let (mut agent, _events) = agent_for(&store, &document);
        agent.detect().await;
        let writes = store.write_count();

        agent.handle_event(AgentEvent::RateChanged(VideoId(u64::MAX))).await;
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn failed_write_is_dropped() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        let video = LocalVideo::playable(1.0);
        let document = LocalDocument::with_video(Arc::clone(&video));
        let (mut agent, _events) = agent_for(&store, &document);
        agent.detect().await;

        video.native_set_rate(2.0);
        agent.on_rate_changed().await;
        assert_eq!(store.value(KEY), None);
    }

    #[tokio::test]
    async fn external_speed_is_clamped_applied_and_persisted() {
        let store = MemoryStore::new();
        let video = LocalVideo::playable(1.0);
        let document = LocalDocument::with_video(Arc::clone(&video));
        let (agent, _events) = agent_for(&store, &document);

        let response = agent.on_external_set_speed(9.0).await;
        assert!(response.success);
        assert_eq!(video.rate(), 4.0);
        assert_eq!(store.value(KEY), Some(json!(4.0)));
    }

    #[tokio::test]
    async fn external_speed_without_video_is_acknowledged_no_op() {
        let store = MemoryStore::new();
        let document = LocalDocument::new();
        let (agent, _events) = agent_for(&store, &document);

        let response = agent.on_external_set_speed(1.5).await;
        assert!(response.success);
        assert_eq!(store.write_count(), 0);
    }
}
