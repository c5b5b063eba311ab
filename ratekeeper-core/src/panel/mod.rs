//! The user-facing side of rate synchronization.

mod control_panel;
mod controls;

pub use control_panel::{ControlPanel, Reconciliation};
pub use controls::{Notice, PanelControls, PresetControl};
