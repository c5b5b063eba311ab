use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use ratekeeper_model::{DEFAULT_RATE, SyncRequest, SyncResponse};

use super::page::LocalDocument;
use crate::error::{Result, TransportError};
use crate::observer::AgentHandle;
use crate::ports::{Document, PageBridge, PageTarget};

#[derive(Debug, Clone)]
struct LocalTab {
    target: PageTarget,
    document: Arc<LocalDocument>,
    agent: Option<AgentHandle>,
}

#[derive(Debug, Default)]
struct BridgeState {
    tab: Option<LocalTab>,
    disconnected: bool,
    injected_writes: usize,
    messages_sent: usize,
}

/// A single browser tab reachable from the panel, backed by a
/// [`LocalDocument`] and optionally a running agent.
#[derive(Debug, Clone, Default)]
pub struct LocalBridge {
    state: Arc<Mutex<BridgeState>>,
}

impl LocalBridge {
    /// A bridge with no active tab.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(url: impl Into<String>, document: Arc<LocalDocument>) -> Self {
        let bridge = Self::new();
        bridge.open_page(url, document);
        bridge
    }

    /// Make `url` the active tab, detaching any previous agent.
    pub fn open_page(&self, url: impl Into<String>, document: Arc<LocalDocument>) {
        let mut state = self.state.lock();
        let tab_id = state.tab.as_ref().map_or(1, |tab| tab.target.tab_id + 1);
        state.tab = Some(LocalTab {
            target: PageTarget::new(tab_id, url),
            document,
            agent: None,
        });
    }

    /// Connect the page-resident agent that receives sync messages.
    pub fn attach_agent(&self, agent: AgentHandle) {
        if let Some(tab) = self.state.lock().tab.as_mut() {
            tab.agent = Some(agent);
        }
    }

    /// Make every page call fail as a lost connection.
    pub fn set_disconnected(&self, disconnected: bool) {
        self.state.lock().disconnected = disconnected;
    }

    /// Rate writes performed by script injection.
    pub fn injected_writes(&self) -> usize {
        self.state.lock().injected_writes
    }

    /// Sync messages delivered to an attached agent.
    pub fn messages_sent(&self) -> usize {
        self.state.lock().messages_sent
    }

    fn tab_for(&self, page: &PageTarget) -> Result<LocalTab> {
        let state = self.state.lock();
        if state.disconnected {
            return Err(TransportError::Disconnected("tab"));
        }
        match &state.tab {
            Some(tab) if tab.target == *page => Ok(tab.clone()),
            _ => Err(TransportError::Disconnected("tab")),
        }
    }
}

#[async_trait]
impl PageBridge for LocalBridge {
    async fn active_page(&self) -> Result<Option<PageTarget>> {
        Ok(self.state.lock().tab.as_ref().map(|tab| tab.target.clone()))
    }

    async fn query_rate(&self, page: &PageTarget) -> Result<f64> {
        let tab = self.tab_for(page)?;
        Ok(tab
            .document
            .video()
            .map_or(DEFAULT_RATE, |video| video.rate()))
    }

    async fn apply_rate(&self, page: &PageTarget, rate: f64) -> Result<()> {
        let tab = self.tab_for(page)?;
        if let Some(video) = tab.document.video() {
            video.set_rate(rate);
        }
        self.state.lock().injected_writes += 1;
        Ok(())
    }

    async fn send_message(
        &self,
        page: &PageTarget,
        request: SyncRequest,
    ) -> Result<SyncResponse> {
        let tab = self.tab_for(page)?;
        let agent = tab.agent.ok_or(TransportError::NoListener)?;
        self.state.lock().messages_sent += 1;
        agent.request(request).await
    }
}
