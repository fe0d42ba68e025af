//! Events emitted while advancing the simulation.
//! The presentation layer consumes these for sound and celebration effects.

use glam::Vec2;

use super::powerup::PowerUpKind;
use super::state::GameResult;

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    CoinCollected { pos: Vec2, points: u32 },
    PowerUpCollected { kind: PowerUpKind },
    PowerUpExpired { kind: PowerUpKind },
    KeyCollected,
    /// Torch scale increased; the audio layer plays the upgrade chime
    TorchUpgraded { scale: f32, score: u64 },
    /// The no-collect watchdog fired but a key or power-up saved the run
    WatchdogSave,
    LevelCompleted { level: u32, bonus: u64 },
    CountdownTick { time_left: i32 },
    GameEnded { result: GameResult, final_score: u64 },
}
