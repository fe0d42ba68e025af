//! Data-driven game balance
//!
//! Every knob defaults to the matching constant in [`crate::consts`]. A host can
//! override any subset from JSON; missing fields keep their defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading or validating tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("torch thresholds must increase strictly in score and scale (entry {index})")]
    ThresholdOrder { index: usize },
    #[error("torch threshold scale must be above 1.0 (entry {index})")]
    ThresholdScale { index: usize },
    #[error("torch smoothing must be in (0, 1], got {0}")]
    Smoothing(f32),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("{0} must not be negative")]
    Negative(&'static str),
}

/// A score at which the torch radius multiplier permanently increases
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorchThreshold {
    pub score: u64,
    pub scale: f32,
}

impl TorchThreshold {
    pub const fn new(score: u64, scale: f32) -> Self {
        Self { score, scale }
    }
}

/// Default progressive torch table
pub const DEFAULT_TORCH_THRESHOLDS: [TorchThreshold; 8] = [
    TorchThreshold::new(400, 1.1),
    TorchThreshold::new(1200, 1.2),
    TorchThreshold::new(3000, 1.3),
    TorchThreshold::new(5000, 1.4),
    TorchThreshold::new(7000, 1.5),
    TorchThreshold::new(9200, 1.6),
    TorchThreshold::new(11000, 1.7),
    TorchThreshold::new(20000, 2.0),
];

/// Entity counts for a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnCounts {
    pub coins: u32,
    pub bombs: u32,
    pub powerups: u32,
    pub keys: u32,
    pub stars: u32,
    pub trees: u32,
}

impl SpawnCounts {
    /// Counts for a freshly started run
    pub fn initial() -> Self {
        Self {
            coins: INITIAL_COINS,
            bombs: INITIAL_BOMBS,
            powerups: INITIAL_POWERUPS,
            keys: INITIAL_KEYS,
            stars: INITIAL_STARS,
            trees: INITIAL_TREES,
        }
    }

    /// Counts after advancing to `level`
    pub fn for_level(level: u32) -> Self {
        Self {
            coins: INITIAL_COINS + level,
            bombs: INITIAL_BOMBS + level / 2,
            powerups: INITIAL_POWERUPS + level / 3,
            keys: INITIAL_KEYS,
            stars: INITIAL_STARS + level * 5,
            trees: INITIAL_TREES + level,
        }
    }
}

/// Game balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Torch upgrade table, ascending
    pub torch_thresholds: Vec<TorchThreshold>,
    pub torch_smoothing: f32,
    pub torch_snap_epsilon: f32,
    pub torch_jitter: f32,

    pub initial_time_secs: i32,
    pub initial_counts: SpawnCounts,

    pub no_collect_timeout_ms: u64,
    pub coin_respawn_delay_ms: u64,
    pub powerup_respawn_delay_ms: u64,
    pub level_complete_delay_ms: u64,
    pub countdown_restart_delay_ms: u64,

    pub spawn_margin: f32,
    pub collision_pad: f32,
    pub magnet_radius: f32,
    pub magnet_speed: f32,

    /// Completing this level wins the run; `None` plays forever
    pub max_level: Option<u32>,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            torch_thresholds: DEFAULT_TORCH_THRESHOLDS.to_vec(),
            torch_smoothing: TORCH_SMOOTHING,
            torch_snap_epsilon: TORCH_SNAP_EPSILON,
            torch_jitter: TORCH_JITTER,

            initial_time_secs: INITIAL_TIME_SECS,
            initial_counts: SpawnCounts::initial(),

            no_collect_timeout_ms: NO_COLLECT_TIMEOUT_MS,
            coin_respawn_delay_ms: COIN_RESPAWN_DELAY_MS,
            powerup_respawn_delay_ms: POWERUP_RESPAWN_DELAY_MS,
            level_complete_delay_ms: LEVEL_COMPLETE_DELAY_MS,
            countdown_restart_delay_ms: COUNTDOWN_RESTART_DELAY_MS,

            spawn_margin: SPAWN_MARGIN,
            collision_pad: COLLISION_PAD,
            magnet_radius: MAGNET_RADIUS,
            magnet_speed: MAGNET_SPEED,

            max_level: None,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from JSON
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the invariants the simulation relies on
    pub fn validate(&self) -> Result<(), TuningError> {
        for (index, t) in self.torch_thresholds.iter().enumerate() {
            if t.scale <= 1.0 {
                return Err(TuningError::ThresholdScale { index });
            }
            if index > 0 {
                let prev = self.torch_thresholds[index - 1];
                if t.score <= prev.score || t.scale <= prev.scale {
                    return Err(TuningError::ThresholdOrder { index });
                }
            }
        }
        if !(self.torch_smoothing > 0.0 && self.torch_smoothing <= 1.0) {
            return Err(TuningError::Smoothing(self.torch_smoothing));
        }
        if self.torch_jitter < 0.0 {
            return Err(TuningError::Negative("torch_jitter"));
        }
        if self.no_collect_timeout_ms == 0 {
            return Err(TuningError::Zero("no_collect_timeout_ms"));
        }
        if self.initial_time_secs <= 0 {
            return Err(TuningError::Zero("initial_time_secs"));
        }
        if self.max_level == Some(0) {
            return Err(TuningError::Zero("max_level"));
        }
        Ok(())
    }
}
