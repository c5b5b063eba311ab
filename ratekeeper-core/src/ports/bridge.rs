use async_trait::async_trait;
use ratekeeper_model::{SyncRequest, SyncResponse};

use crate::error::Result;

/// The page the panel was opened against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTarget {
    pub tab_id: u64,
    pub url: String,
}

impl PageTarget {
    pub fn new(tab_id: u64, url: impl Into<String>) -> Self {
        Self {
            tab_id,
            url: url.into(),
        }
    }

    /// Whether this page hosts a watchable video, judged by URL.
    pub fn is_eligible(&self, url_fragment: &str) -> bool {
        self.url.contains(url_fragment)
    }
}

/// Script injection and messaging from the panel into the active page.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageBridge: Send + Sync {
    /// The active tab, if any.
    async fn active_page(&self) -> Result<Option<PageTarget>>;

    /// Read-only query of the live rate. Pages without a video answer with
    /// the default rate.
    async fn query_rate(&self, page: &PageTarget) -> Result<f64>;

    /// Set the rate on the page's video, if it has one.
    async fn apply_rate(&self, page: &PageTarget, rate: f64) -> Result<()>;

    /// Deliver a message to the page-resident agent.
    async fn send_message(
        &self,
        page: &PageTarget,
        request: SyncRequest,
    ) -> Result<SyncResponse>;
}
