//! Torch (vision radius) scaling
//!
//! The torch keeps a persistent scale multiplier that only grows during a run,
//! plus an animated value that eases toward its target every tick. Score
//! thresholds raise both; debug commands go through the same path.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::base_radius_for_level;
use crate::consts::TORCH_MIN_RADIUS;
use crate::tuning::{TorchThreshold, Tuning};

/// One applied upgrade
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorchUpgrade {
    pub scale: f32,
    /// Threshold score that triggered it (`None` for manual upgrades)
    pub threshold: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorchEngine {
    thresholds: Vec<TorchThreshold>,
    smoothing: f32,
    snap_epsilon: f32,
    jitter: f32,
    /// Level-derived radius before scaling
    pub base_radius: f32,
    /// Persistent multiplier (>= 1.0)
    pub scale: f32,
    /// Animated multiplier used for rendering
    pub current: f32,
    /// Value `current` eases toward
    pub target: f32,
    pub upgraded: bool,
}

impl TorchEngine {
    pub fn new(tuning: &Tuning, level: u32) -> Self {
        Self {
            thresholds: tuning.torch_thresholds.clone(),
            smoothing: tuning.torch_smoothing,
            snap_epsilon: tuning.torch_snap_epsilon,
            jitter: tuning.torch_jitter,
            base_radius: base_radius_for_level(level),
            scale: 1.0,
            current: 1.0,
            target: 1.0,
            upgraded: false,
        }
    }

    /// Back to an unscaled torch for `level`
    pub fn reset(&mut self, level: u32) {
        self.base_radius = base_radius_for_level(level);
        self.scale = 1.0;
        self.current = 1.0;
        self.target = 1.0;
        self.upgraded = false;
    }

    pub fn set_level(&mut self, level: u32) {
        self.base_radius = base_radius_for_level(level);
    }

    /// Apply every threshold reached by `score`, lowest first
    pub fn on_score_changed(&mut self, score: u64) -> Vec<TorchUpgrade> {
        let mut applied = Vec::new();
        for i in 0..self.thresholds.len() {
            let t = self.thresholds[i];
            if score >= t.score && t.scale > self.scale {
                self.raise(t.scale);
                applied.push(TorchUpgrade {
                    scale: t.scale,
                    threshold: Some(t.score),
                });
            }
        }
        applied
    }

    /// Debug: apply `scale` as if a threshold fired
    pub fn force_apply(&mut self, scale: f32) -> TorchUpgrade {
        self.scale = self.scale.max(scale);
        self.target = self.target.max(scale);
        self.upgraded = self.scale > 1.0;
        TorchUpgrade {
            scale: self.scale,
            threshold: None,
        }
    }

    /// Debug: drop back to the unscaled torch for the current level
    pub fn revert(&mut self) {
        self.scale = 1.0;
        self.target = 1.0;
        self.upgraded = false;
    }

    fn raise(&mut self, scale: f32) {
        self.scale = scale;
        self.target = self.target.max(scale);
        self.upgraded = true;
    }

    /// Ease `current` toward `target`, snapping once the gap is tiny
    pub fn tick(&mut self) {
        let gap = self.target - self.current;
        if gap.abs() < self.snap_epsilon {
            self.current = self.target;
            return;
        }
        self.current += gap * self.smoothing;
        if (self.target - self.current).abs() < self.snap_epsilon {
            self.current = self.target;
        }
    }

    pub fn is_settled(&self) -> bool {
        self.current == self.target
    }

    /// Unjittered radius at the animated scale
    pub fn steady_radius(&self) -> f32 {
        self.base_radius.floor().max(TORCH_MIN_RADIUS) * self.current
    }

    /// Render radius with a symmetric flicker
    pub fn effective_radius(&self, rng: &mut impl Rng) -> f32 {
        let flicker = if self.jitter > 0.0 {
            rng.random_range(-self.jitter..self.jitter)
        } else {
            0.0
        };
        (self.steady_radius() + flicker).floor()
    }

    /// Inner and outer gradient alpha
    pub fn alphas(&self, shield_active: bool) -> (f32, f32) {
        let inner = if shield_active || self.upgraded { 0.45 } else { 0.15 };
        let outer = if self.upgraded { 0.55 } else { 0.9 };
        (inner, outer)
    }

    /// HUD badge text
    pub fn status_text(&self) -> String {
        if self.scale > 1.0 {
            format!("Torch: {}x", self.scale)
        } else {
            "Torch: Normal".to_string()
        }
    }
}
