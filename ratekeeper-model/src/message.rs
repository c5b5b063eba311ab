//! Messages sent from the control panel to the page-resident agent.

/// Request half of the one-shot panel → agent exchange.
///
/// On the wire this is `{"action": "setSpeed", "speed": 1.5}`. The speed is
/// carried raw; the receiving agent clamps it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "action", rename_all = "camelCase")
)]
pub enum SyncRequest {
    SetSpeed { speed: f64 },
}

/// Acknowledgement half: `{"success": true}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SyncResponse {
    pub success: bool,
}

impl SyncResponse {
    pub fn ack() -> Self {
        Self { success: true }
    }
}
