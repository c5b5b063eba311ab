use ratekeeper_model::RateValue;

use crate::error::PanelError;

/// A message shown to the user in the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn for_error(error: &PanelError) -> Self {
        match error {
            PanelError::NoTarget => Notice::Info(error.user_message()),
            _ => Notice::Error(error.user_message()),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Notice::Info(text) | Notice::Error(text) => text,
        }
    }
}

/// One-click preset button.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetControl {
    pub rate: RateValue,
    pub label: String,
    pub active: bool,
}

/// The panel's resolved controls, built once when the panel opens.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelControls {
    /// Current rate as displayed, e.g. `1.5`.
    pub current_display: String,
    /// Contents of the free-form rate input.
    pub custom_input: String,
    pub presets: Vec<PresetControl>,
    /// Step, preset, custom and reset controls need a live page.
    pub live_controls_enabled: bool,
    pub notice: Option<Notice>,
}

impl PanelControls {
    /// Invalid preset values are skipped.
    pub fn resolve(presets: &[f64]) -> Self {
        let presets = presets
            .iter()
            .filter_map(|rate| RateValue::new(*rate).ok())
            .map(|rate| PresetControl {
                label: format!("{rate}x"),
                rate,
                active: false,
            })
            .collect();

        let mut controls = Self {
            current_display: String::new(),
            custom_input: String::new(),
            presets,
            live_controls_enabled: false,
            notice: None,
        };
        controls.show_rate(RateValue::DEFAULT);
        controls
    }

    /// Display `rate` and highlight any matching preset.
    pub fn show_rate(&mut self, rate: RateValue) {
        self.current_display = rate.to_string();
        self.custom_input = rate.to_string();
        for preset in &mut self.presets {
            preset.active = preset.rate.approx_eq(rate);
        }
    }

    pub fn active_preset(&self) -> Option<&PresetControl> {
        self.presets.iter().find(|preset| preset.active)
    }
}
