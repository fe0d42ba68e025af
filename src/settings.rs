//! Player and debug preferences
//!
//! Persisted by the host separately from tuning; the simulation only reads them.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_CATCHUP_FRAMES, MESSAGE_DURATION_MS};
use crate::tuning::TuningError;

/// Preferences that shape presentation requests, never scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Cursor sprite sits directly on the pointer (initial value of the debug toggle)
    pub center_mode: bool,
    /// Honor debug key presses (center toggle, torch upgrade toggle)
    pub debug_keys: bool,
    /// Ask the scene for particle bursts
    pub particles: bool,
    /// Lifetime of transient banner messages
    pub message_duration_ms: u64,
    /// Frames run per `advance` before skipping ahead; `None` runs every due frame
    pub max_catchup_frames: Option<u32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            center_mode: false,
            debug_keys: true,
            particles: true,
            message_duration_ms: MESSAGE_DURATION_MS,
            max_catchup_frames: None,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Release builds shipped to players turn the debug keys off and resync after stalls
    pub fn release() -> Self {
        Self {
            debug_keys: false,
            max_catchup_frames: Some(MAX_CATCHUP_FRAMES),
            ..Self::default()
        }
    }
}
