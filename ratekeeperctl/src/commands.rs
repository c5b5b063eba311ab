use std::sync::Arc;

use anyhow::{Context, Result};
use ratekeeper_core::local::{LocalBridge, LocalDocument, LocalVideo};
use ratekeeper_core::ports::VideoHandle;
use ratekeeper_core::{AgentHandle, ControlPanel, ObserverAgent};
use ratekeeper_model::{RateValue, ReadyState, format_rate};
use serde::Serialize;
use tracing::info;

use crate::session::Session;

const SIMULATED_URL: &str = "https://www.youtube.com/watch?v=ratekeeper";

#[derive(Debug, Serialize)]
struct PresetReport {
    label: String,
    active: bool,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    displayed: String,
    persisted: Option<f64>,
    live: Option<f64>,
    corrected: bool,
    live_controls: bool,
    presets: Vec<PresetReport>,
}

pub async fn status(session: &Session, json: bool) -> Result<()> {
    let mut panel = session.panel();
    let outcome = panel.reconcile_on_open().await;
    let controls = panel.controls();

    let report = StatusReport {
        displayed: controls.current_display.clone(),
        persisted: outcome.persisted.map(RateValue::get),
        live: outcome.live.map(RateValue::get),
        corrected: outcome.corrected,
        live_controls: controls.live_controls_enabled,
        presets: controls
            .presets
            .iter()
            .map(|preset| PresetReport {
                label: preset.label.clone(),
                active: preset.active,
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("rate: {}x", report.displayed);
    println!("persisted: {}", describe(report.persisted, "none"));
    if report.live_controls {
        println!("live: {}", describe(report.live, "unknown"));
    } else {
        println!("live: no video page");
    }
    if report.corrected {
        println!("corrected live video to {}", report.displayed);
    }
    let presets: Vec<String> = report
        .presets
        .iter()
        .map(|preset| {
            if preset.active {
                format!("[{}]", preset.label)
            } else {
                preset.label.clone()
            }
        })
        .collect();
    println!("presets: {}", presets.join(" "));
    Ok(())
}

fn describe(rate: Option<f64>, missing: &str) -> String {
    rate.map_or_else(|| missing.to_string(), |rate| format!("{}x", format_rate(rate)))
}

/// A mutating panel action.
#[derive(Debug, Clone)]
pub enum Action {
    Set(String),
    Up,
    Down,
    Reset,
}

/// Run one mutating panel action and report the applied rate.
pub async fn apply(session: &Session, action: Action) -> Result<()> {
    let mut panel = session.panel();
    panel.reconcile_on_open().await;

    let outcome = match &action {
        Action::Set(input) => panel.apply_custom_input(input).await,
        Action::Up => panel.step_up().await,
        Action::Down => panel.step_down().await,
        Action::Reset => panel.reset_to_default().await,
    };

    match outcome {
        Ok(rate) => {
            println!("rate set to {rate}x");
            if let Some(live) = session.live_video_rate() {
                info!(live = %format_rate(live), "simulated video updated");
            }
            Ok(())
        }
        Err(e) => {
            let message = panel
                .controls()
                .notice
                .as_ref()
                .map_or_else(|| e.user_message(), |notice| notice.text().to_string());
            Err(anyhow::Error::new(e).context(message))
        }
    }
}

/// Drive a page agent through bind, native change and navigation, printing
/// what it did at each step.
pub async fn simulate(
    session: &Session,
    url: Option<&str>,
    live_rate: f64,
    native_rate: Option<f64>,
    navigations: u32,
) -> Result<()> {
    let document = LocalDocument::new();
    let (agent, task) =
        ObserverAgent::spawn(&session.config, session.store.clone(), document.clone());

    let first = LocalVideo::playable(live_rate);
    document.insert_video(first.clone());
    settle(&agent).await?;
    println!(
        "{} bound at {}x (was {}x)",
        first.id(),
        format_rate(first.rate()),
        format_rate(live_rate)
    );

    if let Some(rate) = native_rate {
        first.native_set_rate(rate);
        settle(&agent).await?;
        println!("{} native change to {}x persisted", first.id(), format_rate(rate));
    }

    for step in 1..=navigations {
        let next = LocalVideo::new(1.0, ReadyState::HaveNothing);
        document.insert_video(next.clone());
        settle(&agent).await?;
        next.set_ready_state(ReadyState::HaveMetadata);
        document.touch();
        settle(&agent).await?;
        println!(
            "navigation {step}: {} restored to {}x",
            next.id(),
            format_rate(next.rate())
        );
    }

    let bridge = LocalBridge::with_page(url.unwrap_or(SIMULATED_URL), document.clone());
    bridge.attach_agent(agent.clone());
    let mut panel = ControlPanel::new(
        session.config.clone(),
        session.store.clone(),
        Arc::new(bridge),
    );
    let outcome = panel.reconcile_on_open().await;
    println!("panel shows {}x", outcome.displayed);

    document.remove_video();
    settle(&agent).await?;

    agent.shutdown();
    task.await.context("page agent panicked")?;
    Ok(())
}

async fn settle(agent: &AgentHandle) -> Result<()> {
    agent.flush().await?;
    agent.flush().await?;
    Ok(())
}
