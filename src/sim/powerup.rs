//! Power-up timing
//!
//! At most one power-up is active. Collecting another overwrites it; there is
//! no stacking and no queue.

use serde::{Deserialize, Serialize};

use crate::consts::TIME_POWERUP_BONUS_SECS;

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// +10 seconds on pickup
    Time,
    /// Coins are worth twice as much
    Double,
    /// Nearby coins drift toward the cursor
    Magnet,
    /// Bombs are harmless
    Shield,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::Time,
        PowerUpKind::Double,
        PowerUpKind::Magnet,
        PowerUpKind::Shield,
    ];

    /// Active window in seconds
    pub fn duration_secs(&self) -> u32 {
        match self {
            PowerUpKind::Time => 10,
            PowerUpKind::Double => 15,
            PowerUpKind::Magnet => 20,
            PowerUpKind::Shield => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::Time => "time",
            PowerUpKind::Double => "double",
            PowerUpKind::Magnet => "magnet",
            PowerUpKind::Shield => "shield",
        }
    }

    /// Sprite and particle color (0xRRGGBB)
    pub fn color(&self) -> u32 {
        match self {
            PowerUpKind::Time => 0x00FFFF,
            PowerUpKind::Double => 0xFF00FF,
            PowerUpKind::Magnet => 0xFFFF00,
            PowerUpKind::Shield => 0x00FF00,
        }
    }

    /// Activation banner
    pub fn banner(&self) -> &'static str {
        match self {
            PowerUpKind::Time => "+10 SECONDS!",
            PowerUpKind::Double => "2x POINTS!",
            PowerUpKind::Magnet => "COIN MAGNET!",
            PowerUpKind::Shield => "BOMB SHIELD!",
        }
    }
}

/// The running power-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePowerUp {
    pub kind: PowerUpKind,
    pub expires_at_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerUpTimer {
    active: Option<ActivePowerUp>,
}

impl PowerUpTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `kind` for `duration_secs` from `now_ms`, replacing anything running.
    ///
    /// Returns the seconds to add to the countdown (only the time power-up adds any).
    pub fn activate(&mut self, kind: PowerUpKind, duration_secs: u32, now_ms: u64) -> i32 {
        self.active = Some(ActivePowerUp {
            kind,
            expires_at_ms: now_ms + duration_secs as u64 * 1000,
        });
        match kind {
            PowerUpKind::Time => TIME_POWERUP_BONUS_SECS,
            PowerUpKind::Double | PowerUpKind::Magnet | PowerUpKind::Shield => 0,
        }
    }

    /// Clear the power-up once `now_ms` is past its expiry; returns what ended
    pub fn tick(&mut self, now_ms: u64) -> Option<PowerUpKind> {
        match self.active {
            Some(active) if now_ms > active.expires_at_ms => {
                self.active = None;
                Some(active.kind)
            }
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Option<ActivePowerUp> {
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn kind(&self) -> Option<PowerUpKind> {
        self.active.map(|a| a.kind)
    }

    pub fn is(&self, kind: PowerUpKind) -> bool {
        self.kind() == Some(kind)
    }

    /// Coin value multiplier
    pub fn coin_multiplier(&self) -> u32 {
        if self.is(PowerUpKind::Double) { 2 } else { 1 }
    }

    /// HUD badge text
    pub fn status_text(&self) -> String {
        match self.kind() {
            Some(kind) => format!("Power-up: {}", kind.as_str().to_uppercase()),
            None => "Power-up: None".to_string(),
        }
    }
}
