//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Virtual time only (the host passes milliseconds in)
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies; visuals go through [`Scene`]

pub mod clock;
pub mod collision;
pub mod entity;
pub mod event;
pub mod powerup;
pub mod scene;
pub mod state;
pub mod tick;
pub mod torch;

pub use clock::{GameClock, Scheduler, Task};
pub use collision::{completion_bonus, hits, interaction_point};
pub use entity::{Bomb, Coin, EntityId, EntityRegistry, LevelKey, PowerUp, Surface};
pub use event::GameEvent;
pub use powerup::{PowerUpKind, PowerUpTimer};
pub use scene::{NullScene, RecordingScene, Scene, SceneError, Sprite, TorchVisual, VisualHandle};
pub use state::{
    EndReason, GameOutcome, GamePhase, GameResult, GameState, HudSnapshot, SessionState,
};
pub use tick::{DebugKey, PointerEvent};
pub use torch::{TorchEngine, TorchUpgrade};
