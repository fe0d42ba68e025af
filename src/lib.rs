//! Torch Dash - a cursor-chase arcade game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, torch, power-ups, collisions, session)
//! - `tuning`: Data-driven game balance
//! - `settings`: Player and debug preferences
//!
//! Rendering, audio and menus live outside this crate. The simulation talks to
//! them through the [`sim::Scene`] trait and the [`sim::GameEvent`] stream.

pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::Settings;
pub use tuning::{TorchThreshold, Tuning, TuningError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Frame cadence (60 Hz)
    pub const FRAMES_PER_SECOND: u64 = 60;
    /// Countdown cadence
    pub const COUNTDOWN_INTERVAL_MS: u64 = 1000;
    /// Stall guard for real-time hosts: frames run per `advance` before the clock resyncs
    pub const MAX_CATCHUP_FRAMES: u32 = 8;

    /// Session defaults
    pub const INITIAL_TIME_SECS: i32 = 30;
    pub const INITIAL_COINS: u32 = 8;
    pub const INITIAL_BOMBS: u32 = 4;
    pub const INITIAL_POWERUPS: u32 = 2;
    pub const INITIAL_KEYS: u32 = 1;
    pub const INITIAL_STARS: u32 = 50;
    pub const INITIAL_TREES: u32 = 8;

    /// Anti-idling window: no coin for this long ends the run
    pub const NO_COLLECT_TIMEOUT_MS: u64 = 5000;

    /// Deferred follow-ups
    pub const COIN_RESPAWN_DELAY_MS: u64 = 500;
    pub const POWERUP_RESPAWN_DELAY_MS: u64 = 2000;
    pub const LEVEL_COMPLETE_DELAY_MS: u64 = 500;
    pub const COUNTDOWN_RESTART_DELAY_MS: u64 = 2000;

    /// Spawn area is inset from every edge by this margin
    pub const SPAWN_MARGIN: f32 = 30.0;

    /// Sprite sizes (visual width, used for collision half-width)
    pub const COIN_SIZE: f32 = 30.0;
    pub const BOMB_SIZE: f32 = 40.0;
    pub const POWERUP_SIZE: f32 = 30.0;
    pub const KEY_SIZE: f32 = 36.0;
    /// Extra reach added to every collision test
    pub const COLLISION_PAD: f32 = 6.0;

    /// Magnet pull
    pub const MAGNET_RADIUS: f32 = 300.0;
    pub const MAGNET_SPEED: f32 = 5.0;

    /// Cursor sprite offset from the raw pointer, along a fixed 45 degree heading
    pub const CURSOR_OFFSET: f32 = 60.0;
    pub const MAGNET_CURSOR_OFFSET: f32 = 100.0;
    pub const CURSOR_ANGLE_DEG: f32 = 45.0;

    /// Bombs random-walk from this level on (exclusive)
    pub const BOMB_JITTER_LEVEL: u32 = 2;
    /// Max bomb step per axis per tick
    pub const BOMB_JITTER_STEP: f32 = 1.0;

    /// Torch radius: max(TORCH_MIN_RADIUS, TORCH_BASE_RADIUS - level * TORCH_RADIUS_PER_LEVEL)
    pub const TORCH_BASE_RADIUS: f32 = 180.0;
    pub const TORCH_RADIUS_PER_LEVEL: f32 = 10.0;
    pub const TORCH_MIN_RADIUS: f32 = 100.0;
    /// Fraction of the remaining scale gap closed per tick
    pub const TORCH_SMOOTHING: f32 = 0.12;
    /// Below this gap the animated scale snaps to its target
    pub const TORCH_SNAP_EPSILON: f32 = 0.0005;
    /// Flicker amplitude (symmetric)
    pub const TORCH_JITTER: f32 = 10.0;
    /// Scale used by the debug upgrade toggle
    pub const TORCH_DEBUG_SCALE: f32 = 1.1;

    /// Seconds added by the time power-up
    pub const TIME_POWERUP_BONUS_SECS: i32 = 10;

    /// Level completion bonus weights
    pub const BONUS_PER_SECOND: u64 = 10;
    pub const BONUS_PER_COIN: u64 = 5;
    pub const BONUS_PER_LEVEL: u64 = 100;
    /// timeLeft after a level-up: LEVEL_TIME_BASE + level * LEVEL_TIME_PER_LEVEL
    pub const LEVEL_TIME_BASE: i32 = 25;
    pub const LEVEL_TIME_PER_LEVEL: i32 = 5;

    /// Transient message lifetime
    pub const MESSAGE_DURATION_MS: u64 = 1500;
}

/// Duration of one frame tick in milliseconds (fractional)
#[inline]
pub fn frame_interval_ms() -> f64 {
    1000.0 / consts::FRAMES_PER_SECOND as f64
}

/// Unit vector for a heading in degrees (screen coordinates, y down)
#[inline]
pub fn heading(degrees: f32) -> Vec2 {
    let rad = degrees.to_radians();
    Vec2::new(rad.cos(), rad.sin())
}

/// Torch base radius for a level
#[inline]
pub fn base_radius_for_level(level: u32) -> f32 {
    use consts::*;
    (TORCH_BASE_RADIUS - level as f32 * TORCH_RADIUS_PER_LEVEL).max(TORCH_MIN_RADIUS)
}

/// Step `from` toward `to` by at most `speed` units
#[inline]
pub fn step_toward(from: Vec2, to: Vec2, speed: f32) -> Vec2 {
    let delta = to - from;
    let dist = delta.length();
    if dist <= f32::EPSILON {
        return from;
    }
    from + delta / dist * speed
}
