//! Rendering collaborator interface
//!
//! The simulation never owns pixels. It asks a [`Scene`] to add, move and
//! remove sprites and keeps the returned [`VisualHandle`]s in a side table,
//! so entity data stays plain and testable without a renderer.

use std::collections::BTreeMap;

use glam::Vec2;
use thiserror::Error;

use super::powerup::PowerUpKind;
use super::state::HudSnapshot;

/// Opaque reference to a visual owned by the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VisualHandle(pub u64);

/// What to draw for an entity, with its kind-specific payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sprite {
    Coin { value: u32 },
    Bomb,
    PowerUp { kind: PowerUpKind },
    Key,
    /// Background twinkle
    Star { size: f32 },
    /// Background silhouette on the bottom edge
    Tree { width: f32, height: f32, shade: u8 },
}

/// Torch overlay parameters for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorchVisual {
    /// Pointer position the torch is centered on
    pub center: Vec2,
    pub radius: f32,
    pub inner_alpha: f32,
    pub outer_alpha: f32,
    pub upgraded: bool,
}

/// A side effect the scene could not perform
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene effect unavailable: {0}")]
    Unavailable(String),
}

/// Colors used for messages and particles (0xRRGGBB)
pub mod colors {
    pub const GOLD: u32 = 0xFFD700;
    pub const YELLOW: u32 = 0xFFFF00;
    pub const GREEN: u32 = 0x00FF00;
    pub const SKY: u32 = 0x00BFFF;
    pub const ORANGE_RED: u32 = 0xFF4500;
    pub const PINK: u32 = 0xFFB6C1;
    pub const GREY: u32 = 0x888888;
}

/// Everything the simulation asks of the presentation layer
///
/// Effect methods may fail; the simulation logs the error and keeps ticking.
pub trait Scene {
    fn add_entity(&mut self, sprite: Sprite, pos: Vec2) -> VisualHandle;
    fn remove_entity(&mut self, handle: VisualHandle);
    fn move_entity(&mut self, handle: VisualHandle, pos: Vec2);

    fn set_torch_visual(&mut self, visual: TorchVisual) -> Result<(), SceneError>;
    /// `None` hides the cursor sprite
    fn set_cursor_visual(&mut self, pos: Option<Vec2>);

    fn show_transient_message(
        &mut self,
        text: &str,
        color: u32,
        duration_ms: u64,
    ) -> Result<(), SceneError>;
    fn show_particle_burst(&mut self, pos: Vec2, count: u32, color: u32)
    -> Result<(), SceneError>;

    /// Called after every state-changing operation
    fn update_hud(&mut self, _hud: &HudSnapshot) {}

    /// Yes/no prompt (exit confirmation)
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// A scene that draws nothing
#[derive(Debug, Default)]
pub struct NullScene {
    next_handle: u64,
}

impl Scene for NullScene {
    fn add_entity(&mut self, _sprite: Sprite, _pos: Vec2) -> VisualHandle {
        self.next_handle += 1;
        VisualHandle(self.next_handle)
    }

    fn remove_entity(&mut self, _handle: VisualHandle) {}

    fn move_entity(&mut self, _handle: VisualHandle, _pos: Vec2) {}

    fn set_torch_visual(&mut self, _visual: TorchVisual) -> Result<(), SceneError> {
        Ok(())
    }

    fn set_cursor_visual(&mut self, _pos: Option<Vec2>) {}

    fn show_transient_message(&mut self, _: &str, _: u32, _: u64) -> Result<(), SceneError> {
        Ok(())
    }

    fn show_particle_burst(&mut self, _: Vec2, _: u32, _: u32) -> Result<(), SceneError> {
        Ok(())
    }
}

/// A scene that remembers every request (headless hosts, tests)
#[derive(Debug, Default)]
pub struct RecordingScene {
    next_handle: u64,
    /// Visuals currently on screen
    pub live: BTreeMap<VisualHandle, (Sprite, Vec2)>,
    /// Removals of handles that were not live (double free / foreign handle)
    pub stray_removals: u32,
    pub messages: Vec<(String, u32)>,
    pub bursts: Vec<(Vec2, u32, u32)>,
    pub torch: Option<TorchVisual>,
    pub cursor: Option<Vec2>,
    pub hud: Option<HudSnapshot>,
    pub hud_updates: u32,
    /// Make every fallible effect fail
    pub fail_effects: bool,
    /// Answer for `confirm`
    pub deny_confirm: bool,
}

impl RecordingScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live visuals matching a predicate
    pub fn count(&self, pred: impl Fn(&Sprite) -> bool) -> usize {
        self.live.values().filter(|(s, _)| pred(s)).count()
    }

    pub fn has_message(&self, needle: &str) -> bool {
        self.messages.iter().any(|(m, _)| m.contains(needle))
    }

    fn effect(&self, what: &str) -> Result<(), SceneError> {
        if self.fail_effects {
            Err(SceneError::Unavailable(what.to_string()))
        } else {
            Ok(())
        }
    }
}

impl Scene for RecordingScene {
    fn add_entity(&mut self, sprite: Sprite, pos: Vec2) -> VisualHandle {
        self.next_handle += 1;
        let handle = VisualHandle(self.next_handle);
        self.live.insert(handle, (sprite, pos));
        handle
    }

    fn remove_entity(&mut self, handle: VisualHandle) {
        if self.live.remove(&handle).is_none() {
            self.stray_removals += 1;
        }
    }

    fn move_entity(&mut self, handle: VisualHandle, pos: Vec2) {
        if let Some(entry) = self.live.get_mut(&handle) {
            entry.1 = pos;
        }
    }

    fn set_torch_visual(&mut self, visual: TorchVisual) -> Result<(), SceneError> {
        self.effect("torch")?;
        self.torch = Some(visual);
        Ok(())
    }

    fn set_cursor_visual(&mut self, pos: Option<Vec2>) {
        self.cursor = pos;
    }

    fn show_transient_message(
        &mut self,
        text: &str,
        color: u32,
        _duration_ms: u64,
    ) -> Result<(), SceneError> {
        self.effect("message")?;
        self.messages.push((text.to_string(), color));
        Ok(())
    }

    fn show_particle_burst(
        &mut self,
        pos: Vec2,
        count: u32,
        color: u32,
    ) -> Result<(), SceneError> {
        self.effect("particles")?;
        self.bursts.push((pos, count, color));
        Ok(())
    }

    fn update_hud(&mut self, hud: &HudSnapshot) {
        self.hud_updates += 1;
        self.hud = Some(hud.clone());
    }

    fn confirm(&mut self, _prompt: &str) -> bool {
        !self.deny_confirm
    }
}
