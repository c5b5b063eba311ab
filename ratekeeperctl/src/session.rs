use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use ratekeeper_core::local::{LocalBridge, LocalDocument, LocalVideo};
use ratekeeper_core::ports::VideoHandle;
use ratekeeper_core::{AgentHandle, ControlPanel, JsonFileStore, ObserverAgent, SyncConfig};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cli::Cli;

const STORE_FILE: &str = "store.json";

/// Resolve the store path: `--store` wins, then the platform data directory.
pub fn store_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    let dirs = ProjectDirs::from("", "ratekeeper", "ratekeeper")
        .context("could not determine a data directory; pass --store")?;
    Ok(dirs.data_dir().join(STORE_FILE))
}

/// A durable store plus the simulated tab one command runs against.
#[derive(Debug)]
pub struct Session {
    pub config: SyncConfig,
    pub store: Arc<JsonFileStore>,
    pub bridge: Arc<LocalBridge>,
    pub document: Option<Arc<LocalDocument>>,
    agent: Option<(AgentHandle, JoinHandle<()>)>,
}

impl Session {
    pub async fn open(cli: &Cli) -> Result<Self> {
        let config = SyncConfig::load(cli.config.as_deref()).context("loading settings")?;
        let path = store_path(cli.store.clone())?;
        debug!("using store {:?}", path);
        let store = Arc::new(JsonFileStore::new(path));

        let bridge = Arc::new(LocalBridge::new());
        let mut document = None;
        let mut agent = None;

        if let Some(url) = &cli.url {
            let page = LocalDocument::with_video(LocalVideo::playable(cli.live_rate));
            bridge.open_page(url.clone(), Arc::clone(&page));

            if cli.agent {
                let (handle, task) =
                    ObserverAgent::spawn(&config, store.clone(), page.clone());
                bridge.attach_agent(handle.clone());
                handle.flush().await?;
                handle.flush().await?;
                agent = Some((handle, task));
            }
            document = Some(page);
        }

        Ok(Self {
            config,
            store,
            bridge,
            document,
            agent,
        })
    }

    pub fn panel(&self) -> ControlPanel {
        ControlPanel::new(self.config.clone(), self.store.clone(), self.bridge.clone())
    }

    /// Rate of the simulated video, if the tab has one.
    pub fn live_video_rate(&self) -> Option<f64> {
        self.document
            .as_ref()
            .and_then(|document| document.current_video())
            .map(|video| video.rate())
    }

    /// Let the agent finish outstanding work, then stop it.
    pub async fn close(self) -> Result<()> {
        if let Some((handle, task)) = self.agent {
            if let Err(e) = handle.flush().await {
                warn!("page agent did not drain: {}", e);
            }
            handle.shutdown();
            task.await.context("page agent panicked")?;
        }
        Ok(())
    }
}
