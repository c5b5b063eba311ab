use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;
use ratekeeper_model::ReadyState;

use crate::ports::{
    Document, ListenerId, MutationListener, RateListener, VideoHandle, VideoId,
};

static NEXT_VIDEO_ID: AtomicU64 = AtomicU64::new(1);

type SharedCallback = Arc<dyn Fn() + Send + Sync>;

struct VideoState {
    rate: f64,
    ready: ReadyState,
    listeners: Vec<(ListenerId, SharedCallback)>,
    next_listener: u64,
    programmatic_sets: usize,
}

/// A video element living in a [`LocalDocument`].
pub struct LocalVideo {
    id: VideoId,
    state: Mutex<VideoState>,
}

impl std::fmt::Debug for LocalVideo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LocalVideo")
            .field("id", &self.id)
            .field("rate", &state.rate)
            .field("ready", &state.ready)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl LocalVideo {
    pub fn new(rate: f64, ready: ReadyState) -> Arc<Self> {
        Arc::new(Self {
            id: VideoId(NEXT_VIDEO_ID.fetch_add(1, Ordering::Relaxed)),
            state: Mutex::new(VideoState {
                rate,
                ready,
                listeners: Vec::new(),
                next_listener: 1,
                programmatic_sets: 0,
            }),
        })
    }

    /// A video that has buffered enough to play.
    pub fn playable(rate: f64) -> Arc<Self> {
        Self::new(rate, ReadyState::HaveEnoughData)
    }

    /// Simulate the user changing speed through the player's own menu.
    pub fn native_set_rate(&self, rate: f64) {
        self.change_rate(rate);
    }

    pub fn set_ready_state(&self, ready: ReadyState) {
        self.state.lock().ready = ready;
    }

    /// Number of `set_rate` calls made through [`VideoHandle`].
    pub fn programmatic_sets(&self) -> usize {
        self.state.lock().programmatic_sets
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    fn change_rate(&self, rate: f64) {
        // Listeners run after the lock is released.
        let listeners: Vec<SharedCallback> = {
            let mut state = self.state.lock();
            if state.rate == rate {
                return;
            }
            state.rate = rate;
            state.listeners.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };
        for listener in listeners {
            listener();
        }
    }
}

impl VideoHandle for LocalVideo {
    fn id(&self) -> VideoId {
        self.id
    }

    fn ready_state(&self) -> ReadyState {
        self.state.lock().ready
    }

    fn rate(&self) -> f64 {
        self.state.lock().rate
    }

    fn set_rate(&self, rate: f64) {
        self.state.lock().programmatic_sets += 1;
        self.change_rate(rate);
    }

    fn add_rate_listener(&self, listener: RateListener) -> ListenerId {
        let mut state = self.state.lock();
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;
        state.listeners.push((id, Arc::from(listener)));
        id
    }

    fn remove_rate_listener(&self, listener: ListenerId) {
        self.state.lock().listeners.retain(|(id, _)| *id != listener);
    }
}

/// A page content tree holding at most one video element.
#[derive(Default)]
pub struct LocalDocument {
    video: Mutex<Option<Arc<LocalVideo>>>,
    observers: Mutex<Vec<(ListenerId, SharedCallback)>>,
    next_observer: AtomicU64,
    video_lookups: AtomicUsize,
}

impl std::fmt::Debug for LocalDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalDocument")
            .field("video", &*self.video.lock())
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl LocalDocument {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_video(video: Arc<LocalVideo>) -> Arc<Self> {
        let document = Self::default();
        *document.video.lock() = Some(video);
        Arc::new(document)
    }

    /// Insert a video, replacing any existing one.
    pub fn insert_video(&self, video: Arc<LocalVideo>) {
        *self.video.lock() = Some(video);
        self.mutated();
    }

    pub fn remove_video(&self) -> Option<Arc<LocalVideo>> {
        let removed = self.video.lock().take();
        self.mutated();
        removed
    }

    /// A structural change that does not involve the video.
    pub fn touch(&self) {
        self.mutated();
    }

    pub fn current_video(&self) -> Option<Arc<LocalVideo>> {
        self.video.lock().clone()
    }

    /// Registered mutation observers.
    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    /// How many times the video element has been looked up.
    pub fn video_lookups(&self) -> usize {
        self.video_lookups.load(Ordering::SeqCst)
    }

    fn mutated(&self) {
        let observers: Vec<SharedCallback> =
            self.observers.lock().iter().map(|(_, cb)| Arc::clone(cb)).collect();
        for observer in observers {
            observer();
        }
    }
}

impl Document for LocalDocument {
    fn video(&self) -> Option<Arc<dyn VideoHandle>> {
        self.video_lookups.fetch_add(1, Ordering::SeqCst);
        self.video
            .lock()
            .clone()
            .map(|video| video as Arc<dyn VideoHandle>)
    }

    fn observe_mutations(&self, listener: MutationListener) -> ListenerId {
        let id = ListenerId(self.next_observer.fetch_add(1, Ordering::Relaxed));
        self.observers.lock().push((id, Arc::from(listener)));
        id
    }

    fn unobserve_mutations(&self, listener: ListenerId) {
        self.observers.lock().retain(|(id, _)| *id != listener);
    }
}
