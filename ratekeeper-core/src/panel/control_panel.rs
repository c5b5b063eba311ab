use std::sync::Arc;

use ratekeeper_model::{DEFAULT_RATE, RATE_STEP, RateValue, SyncRequest};
use tracing::{debug, info, warn};

use super::controls::{Notice, PanelControls};
use crate::config::SyncConfig;
use crate::error::PanelError;
use crate::ports::{KeyValueStore, PageBridge, PageTarget, PersistedRate};

/// What the panel found and did when it opened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconciliation {
    pub displayed: RateValue,
    pub persisted: Option<RateValue>,
    pub live: Option<RateValue>,
    /// The persisted rate was pushed onto a drifted live video.
    pub corrected: bool,
}

/// User-facing surface for choosing a playback rate.
///
/// Every mutating call persists first, then writes the live video, then
/// notifies the page agent on a best-effort basis.
pub struct ControlPanel {
    config: SyncConfig,
    rate: PersistedRate,
    bridge: Arc<dyn PageBridge>,
    controls: PanelControls,
}

impl std::fmt::Debug for ControlPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlPanel")
            .field("rate", &self.rate)
            .field("controls", &self.controls)
            .finish_non_exhaustive()
    }
}

impl ControlPanel {
    pub fn new(
        config: SyncConfig,
        store: Arc<dyn KeyValueStore>,
        bridge: Arc<dyn PageBridge>,
    ) -> Self {
        let controls = PanelControls::resolve(&config.presets);
        let rate = PersistedRate::new(store, config.storage_key.clone());
        Self {
            config,
            rate,
            bridge,
            controls,
        }
    }

    pub fn controls(&self) -> &PanelControls {
        &self.controls
    }

    /// Read both rates, pick what to display and correct a drifted video.
    ///
    /// Never fails: without an eligible page the panel shows the persisted
    /// rate and disables the live controls.
    pub async fn reconcile_on_open(&mut self) -> Reconciliation {
        let (persisted, (page, live)) = tokio::join!(self.rate.load(), self.read_live());

        self.controls.live_controls_enabled = page.is_some();
        let mut displayed = live.or(persisted).unwrap_or_default();
        let mut corrected = false;

        if let (Some(page), Some(live), Some(persisted)) = (&page, live, persisted)
            && (live.get() - persisted.get()).abs() > self.config.drift_tolerance
        {
            info!(live = %live, persisted = %persisted, "correcting drifted live rate");
            match self.push_live(page, persisted).await {
                Ok(()) => {
                    displayed = persisted;
                    corrected = true;
                }
                Err(e) => warn!("failed to correct live rate: {}", e),
            }
        }

        self.controls.show_rate(displayed);
        Reconciliation {
            displayed,
            persisted,
            live,
            corrected,
        }
    }

    /// Validate, persist and apply `requested`.
    pub async fn apply_rate(&mut self, requested: f64) -> Result<RateValue, PanelError> {
        let outcome = self.try_apply(requested).await;
        self.settle(&outcome);
        outcome
    }

    /// Move the effective rate by `delta`, clamped to range.
    pub async fn adjust_by(&mut self, delta: f64) -> Result<RateValue, PanelError> {
        let live = match self.eligible_page().await {
            Some(page) => self.live_rate(&page).await,
            None => None,
        };
        let current = match live {
            Some(rate) => rate,
            None => self.rate.load_or_default().await,
        };
        self.apply_rate(current.offset(delta).get()).await
    }

    pub async fn step_up(&mut self) -> Result<RateValue, PanelError> {
        self.adjust_by(RATE_STEP).await
    }

    pub async fn step_down(&mut self) -> Result<RateValue, PanelError> {
        self.adjust_by(-RATE_STEP).await
    }

    pub async fn reset_to_default(&mut self) -> Result<RateValue, PanelError> {
        self.apply_rate(DEFAULT_RATE).await
    }

    /// Apply the free-form input text. Unreadable or out-of-range input is
    /// rejected before anything is written.
    pub async fn apply_custom_input(&mut self, input: &str) -> Result<RateValue, PanelError> {
        self.controls.custom_input = input.to_string();
        match RateValue::parse_input(input) {
            Ok(rate) => self.apply_rate(rate.get()).await,
            Err(e) => {
                let outcome = Err(PanelError::from(e));
                self.settle(&outcome);
                outcome
            }
        }
    }

    async fn try_apply(&self, requested: f64) -> Result<RateValue, PanelError> {
        let rate = RateValue::new(requested)?;
        let page = self.eligible_page().await.ok_or(PanelError::NoTarget)?;

        self.rate.save(rate).await.map_err(PanelError::WriteFailed)?;
        self.push_live(&page, rate)
            .await
            .map_err(PanelError::WriteFailed)?;
        debug!(rate = %rate, "applied playback rate");
        Ok(rate)
    }

    fn settle(&mut self, outcome: &Result<RateValue, PanelError>) {
        match outcome {
            Ok(rate) => {
                self.controls.show_rate(*rate);
                self.controls.notice = None;
            }
            Err(e) => {
                debug!("rate change rejected: {}", e);
                self.controls.notice = Some(Notice::for_error(e));
            }
        }
    }

    /// Write the live video, then tell the agent. The notification is
    /// best-effort since the direct write already landed.
    async fn push_live(
        &self,
        page: &PageTarget,
        rate: RateValue,
    ) -> crate::error::Result<()> {
        self.bridge.apply_rate(page, rate.get()).await?;

        let request = SyncRequest::SetSpeed { speed: rate.get() };
        match self.bridge.send_message(page, request).await {
            Ok(response) if !response.success => {
                debug!(rate = %rate, "page agent declined the rate push");
            }
            Ok(_) => {}
            Err(e) => debug!(rate = %rate, "page agent not reachable: {}", e),
        }
        Ok(())
    }

    async fn eligible_page(&self) -> Option<PageTarget> {
        match self.bridge.active_page().await {
            Ok(Some(page)) if page.is_eligible(&self.config.eligible_url_fragment) => {
                Some(page)
            }
            Ok(_) => None,
            Err(e) => {
                debug!("active page lookup failed: {}", e);
                None
            }
        }
    }

    async fn live_rate(&self, page: &PageTarget) -> Option<RateValue> {
        match self.bridge.query_rate(page).await {
            Ok(rate) => RateValue::from_observed(rate),
            Err(e) => {
                debug!("live rate query failed: {}", e);
                None
            }
        }
    }

    async fn read_live(&self) -> (Option<PageTarget>, Option<RateValue>) {
        let Some(page) = self.eligible_page().await else {
            return (None, None);
        };
        let live = self.live_rate(&page).await;
        (Some(page), live)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::local::MemoryStore;
    use crate::ports::bridge::MockPageBridge;
    use mockall::predicate::{always, eq};
    use ratekeeper_model::SyncResponse;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};

    const KEY: &str = "youtubeSpeed";
    const WATCH_URL: &str = "https://www.youtube.com/watch?v=abc";

    fn watch_page() -> PageTarget {
        PageTarget::new(7, WATCH_URL)
    }

    fn panel(store: &MemoryStore, bridge: MockPageBridge) -> ControlPanel {
        ControlPanel::new(
            SyncConfig::default(),
            Arc::new(store.clone()),
            Arc::new(bridge),
        )
    }

    #[tokio::test]
    async fn out_of_range_rate_touches_nothing() {
        let store = MemoryStore::with_value(KEY, json!(1.5));
        let mut bridge = MockPageBridge::new();
        bridge.expect_active_page().times(0);
        bridge.expect_apply_rate().times(0);
        bridge.expect_send_message().times(0);
        let mut panel = panel(&store, bridge);

        for bad in [0.0, 0.2, 4.25, 10.0, f64::NAN] {
            let err = panel.apply_rate(bad).await.unwrap_err();
            assert!(matches!(err, PanelError::Validation { .. }));
        }
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.value(KEY), Some(json!(1.5)));
        assert_eq!(
            panel.controls().notice,
            Some(Notice::Error("Speed must be between 0.25x and 4x".into()))
        );
    }

    #[tokio::test]
    async fn apply_without_eligible_page_reports_no_target() {
        let store = MemoryStore::new();
        let mut bridge = MockPageBridge::new();
        bridge
            .expect_active_page()
            .returning(|| Ok(Some(PageTarget::new(1, "https://example.com/"))));
        bridge.expect_apply_rate().times(0);
        let mut panel = panel(&store, bridge);

        let err = panel.apply_rate(1.5).await.unwrap_err();
        assert!(matches!(err, PanelError::NoTarget));
        assert_eq!(store.write_count(), 0);
        assert_eq!(
            panel.controls().notice,
            Some(Notice::Info("Please navigate to a video page".into()))
        );
    }

    #[tokio::test]
    async fn persists_before_writing_live_video() {
        let store = MemoryStore::new();
        let persisted_first = Arc::new(AtomicBool::new(false));

        let mut bridge = MockPageBridge::new();
        bridge.expect_active_page().returning(|| Ok(Some(watch_page())));
        let seen = store.clone();
        let flag = Arc::clone(&persisted_first);
        bridge
            .expect_apply_rate()
            .with(eq(watch_page()), eq(2.0))
            .times(1)
            .returning(move |_, _| {
                flag.store(seen.value(KEY) == Some(json!(2.0)), Ordering::SeqCst);
                Ok(())
            });
        bridge
            .expect_send_message()
            .with(always(), eq(SyncRequest::SetSpeed { speed: 2.0 }))
            .times(1)
            .returning(|_, _| Ok(SyncResponse::ack()));
        let mut panel = panel(&store, bridge);

        let applied = panel.apply_rate(2.0).await.unwrap();
        assert_eq!(applied.get(), 2.0);
        assert!(persisted_first.load(Ordering::SeqCst));
        assert_eq!(panel.controls().current_display, "2");
        assert_eq!(panel.controls().notice, None);
    }

    #[tokio::test]
    async fn missing_agent_listener_is_not_an_error() {
        let store = MemoryStore::new();
        let mut bridge = MockPageBridge::new();
        bridge.expect_active_page().returning(|| Ok(Some(watch_page())));
        bridge.expect_apply_rate().returning(|_, _| Ok(()));
        bridge
            .expect_send_message()
            .returning(|_, _| Err(TransportError::NoListener));
        let mut panel = panel(&store, bridge);

        assert!(panel.apply_rate(1.25).await.is_ok());
        assert_eq!(store.value(KEY), Some(json!(1.25)));
    }

    #[tokio::test]
    async fn failed_persist_surfaces_retry_message() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        let mut bridge = MockPageBridge::new();
        bridge.expect_active_page().returning(|| Ok(Some(watch_page())));
        bridge.expect_apply_rate().times(0);
        let mut panel = panel(&store, bridge);

        let err = panel.apply_rate(1.5).await.unwrap_err();
        assert!(matches!(err, PanelError::WriteFailed(_)));
        assert_eq!(
            panel.controls().notice.as_ref().map(Notice::text),
            Some("Error setting playback speed. Please refresh the page and try again.")
        );
    }

    #[tokio::test]
    async fn failed_live_write_surfaces_retry_message() {
        let store = MemoryStore::new();
        let mut bridge = MockPageBridge::new();
        bridge.expect_active_page().returning(|| Ok(Some(watch_page())));
        bridge
            .expect_apply_rate()
            .returning(|_, _| Err(TransportError::Disconnected("tab")));
        bridge.expect_send_message().times(0);
        let mut panel = panel(&store, bridge);

        let err = panel.apply_rate(1.5).await.unwrap_err();
        assert!(matches!(err, PanelError::WriteFailed(_)));
    }

    #[tokio::test]
    async fn open_without_page_is_read_only() {
        let store = MemoryStore::with_value(KEY, json!(1.75));
        let mut bridge = MockPageBridge::new();
        bridge.expect_active_page().returning(|| Ok(None));
        bridge.expect_query_rate().times(0);
        bridge.expect_apply_rate().times(0);
        let mut panel = panel(&store, bridge);

        let outcome = panel.reconcile_on_open().await;
        assert_eq!(outcome.displayed.get(), 1.75);
        assert_eq!(outcome.live, None);
        assert!(!outcome.corrected);
        assert!(!panel.controls().live_controls_enabled);
        assert_eq!(panel.controls().current_display, "1.75");
    }

    #[tokio::test]
    async fn failed_live_query_falls_back_to_persisted() {
        let store = MemoryStore::with_value(KEY, json!(2.5));
        let mut bridge = MockPageBridge::new();
        bridge.expect_active_page().returning(|| Ok(Some(watch_page())));
        bridge
            .expect_query_rate()
            .returning(|_| Err(TransportError::Disconnected("tab")));
        bridge.expect_apply_rate().times(0);
        let mut panel = panel(&store, bridge);

        let outcome = panel.reconcile_on_open().await;
        assert_eq!(outcome.displayed.get(), 2.5);
        assert!(panel.controls().live_controls_enabled);
    }

    #[tokio::test]
    async fn small_drift_is_left_alone() {
        let store = MemoryStore::with_value(KEY, json!(1.5));
        let mut bridge = MockPageBridge::new();
        bridge.expect_active_page().returning(|| Ok(Some(watch_page())));
        bridge.expect_query_rate().returning(|_| Ok(1.504));
        bridge.expect_apply_rate().times(0);
        let mut panel = panel(&store, bridge);

        let outcome = panel.reconcile_on_open().await;
        assert!(!outcome.corrected);
        assert_eq!(outcome.displayed.get(), 1.504);
        assert_eq!(panel.controls().current_display, "1.5");
    }

    #[tokio::test]
    async fn unreadable_custom_input_is_rejected() {
        let store = MemoryStore::new();
        let mut bridge = MockPageBridge::new();
        bridge.expect_active_page().times(0);
        let mut panel = panel(&store, bridge);

        let err = panel.apply_custom_input("fast").await.unwrap_err();
        assert!(matches!(err, PanelError::InvalidInput(_)));
        assert_eq!(panel.controls().custom_input, "fast");
        assert_eq!(store.write_count(), 0);
    }
}
