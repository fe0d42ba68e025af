//! Game state and the level/session state machine
//!
//! `Idle -> Playing -> Ended`. A new `start` tears everything down to `Idle`
//! and re-enters `Playing`. All mutable game data hangs off [`GameState`];
//! there are no globals.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::clock::{GameClock, Scheduler, Task};
use super::collision::completion_bonus;
use super::entity::{EntityRegistry, Spawner, Surface};
use super::event::GameEvent;
use super::powerup::{PowerUpKind, PowerUpTimer};
use super::scene::{Scene, TorchVisual, colors};
use super::torch::{TorchEngine, TorchUpgrade};
use crate::consts::*;
use crate::settings::Settings;
use crate::tuning::{SpawnCounts, Tuning};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Before the first start, or after exit
    Idle,
    Playing,
    /// Run over; frozen until the next start
    Ended,
}

/// Why a run was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    Bomb,
    Time,
    NoCoin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// Cleared the final level (only with `Tuning::max_level`)
    Won,
    Lost(EndReason),
}

impl GameResult {
    /// Game-over screen text
    pub fn message(&self) -> &'static str {
        match self {
            GameResult::Won => "Congratulations! You completed all levels!",
            GameResult::Lost(EndReason::Time) => "Time's up! You failed to find a key.",
            GameResult::Lost(EndReason::NoCoin) => "No coin collected for 5s! Game Over!",
            GameResult::Lost(EndReason::Bomb) => "You hit a bomb! Game Over!",
        }
    }
}

/// Frozen summary of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    pub result: GameResult,
    pub final_score: u64,
    pub level: u32,
}

/// Score, clock and progression for the current run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub score: u64,
    /// Seconds on the countdown (power-ups can push it above the level start value)
    pub time_left: i32,
    pub level: u32,
    pub phase: GamePhase,
    pub has_level_key: bool,
    /// Instant of the last coin pickup or watchdog save
    pub last_collect_ms: u64,
    /// Current countdown; older countdown ticks are ignored
    pub countdown_generation: u32,
    pub outcome: Option<GameOutcome>,
}

impl SessionState {
    pub fn new(initial_time_secs: i32) -> Self {
        Self {
            score: 0,
            time_left: initial_time_secs,
            level: 1,
            phase: GamePhase::Idle,
            has_level_key: false,
            last_collect_ms: 0,
            countdown_generation: 0,
            outcome: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }
}

/// Read-only UI state, pushed to the scene after every change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub score: u64,
    pub time_left: i32,
    pub level: u32,
    pub torch_status_text: String,
    pub powerup_status_text: String,
}

/// Latest pointer sample
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PointerState {
    pub pos: Option<Vec2>,
    /// Pointer is over the surface
    pub inside: bool,
}

/// Complete game state (deterministic for a given seed and input stream)
#[derive(Debug, Serialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    #[serde(skip)]
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub settings: Settings,
    pub surface: Surface,
    pub session: SessionState,
    pub torch: TorchEngine,
    pub powerup: PowerUpTimer,
    pub entities: EntityRegistry,
    pub clock: GameClock,
    pub scheduler: Scheduler,
    pub pointer: PointerState,
    /// Debug: cursor sprite sits on the raw pointer
    pub center_mode: bool,
    /// Bumped on every start; deferred tasks from older sessions are dropped
    pub epoch: u32,
    /// Events not yet handed to the host
    #[serde(skip)]
    pub(crate) events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(seed: u64, tuning: Tuning, settings: Settings, surface: Surface) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            session: SessionState::new(tuning.initial_time_secs),
            torch: TorchEngine::new(&tuning, 1),
            center_mode: settings.center_mode,
            tuning,
            settings,
            surface,
            powerup: PowerUpTimer::new(),
            entities: EntityRegistry::new(),
            clock: GameClock::new(),
            scheduler: Scheduler::new(),
            pointer: PointerState::default(),
            epoch: 0,
            events: Vec::new(),
        }
    }

    /// Default tuning and settings
    pub fn with_seed(seed: u64, surface: Surface) -> Self {
        Self::new(seed, Tuning::default(), Settings::default(), surface)
    }

    pub fn phase(&self) -> GamePhase {
        self.session.phase
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Reset everything and begin a run at level 1
    pub fn start(&mut self, scene: &mut dyn Scene, now_ms: u64) {
        self.teardown(scene);
        self.epoch += 1;

        self.session = SessionState {
            last_collect_ms: now_ms,
            countdown_generation: self.session.countdown_generation + 1,
            ..SessionState::new(self.tuning.initial_time_secs)
        };
        self.torch.reset(self.session.level);
        self.powerup.clear();
        self.pointer.inside = false;
        self.clock.start(now_ms);

        let counts = self.tuning.initial_counts;
        self.populate(scene, counts);

        self.session.phase = GamePhase::Playing;
        self.scheduler.schedule(
            now_ms + COUNTDOWN_INTERVAL_MS,
            self.epoch,
            Task::CountdownTick {
                generation: self.session.countdown_generation,
            },
        );
        log::info!(
            "Session {} started (seed {}, {} coins, {} bombs)",
            self.epoch,
            self.seed,
            self.entities.coins().len(),
            self.entities.bombs().len()
        );
        self.refresh_hud(scene);
    }

    pub fn restart(&mut self, scene: &mut dyn Scene, now_ms: u64) {
        self.start(scene, now_ms);
    }

    /// Confirm with the player, then tear down to `Idle`
    pub fn exit(&mut self, scene: &mut dyn Scene) -> bool {
        if !scene.confirm("Exit game and return to main menu?") {
            return false;
        }
        self.teardown(scene);
        log::info!("Exited to menu at score {}", self.session.score);
        self.message(scene, "Exited to main menu", colors::GOLD);
        self.refresh_hud(scene);
        true
    }

    /// Stop everything and drop to `Idle`
    fn teardown(&mut self, scene: &mut dyn Scene) {
        self.session.phase = GamePhase::Idle;
        self.scheduler.clear();
        self.entities.clear_all(scene);
        self.pointer.inside = false;
        scene.set_cursor_visual(None);
    }

    /// Spawn decoration and entities for the current level
    fn populate(&mut self, scene: &mut dyn Scene, counts: SpawnCounts) {
        let level = self.session.level;
        let mut spawner = Spawner {
            rng: &mut self.rng,
            scene: &mut *scene,
            surface: self.surface,
            margin: self.tuning.spawn_margin,
        };
        self.entities.spawn_stars(counts.stars, &mut spawner);
        self.entities.spawn_trees(counts.trees, &mut spawner);
        self.entities.spawn_coins(counts.coins, level, &mut spawner);
        self.entities.spawn_bombs(counts.bombs, &mut spawner);
        self.entities.spawn_powerups(counts.powerups, &mut spawner);
        self.entities.spawn_keys(counts.keys, &mut spawner);
    }

    pub(crate) fn respawn_coin(&mut self, scene: &mut dyn Scene) {
        let level = self.session.level;
        let mut spawner = Spawner {
            rng: &mut self.rng,
            scene: &mut *scene,
            surface: self.surface,
            margin: self.tuning.spawn_margin,
        };
        self.entities.spawn_coins(1, level, &mut spawner);
    }

    pub(crate) fn respawn_powerup(&mut self, scene: &mut dyn Scene) {
        let mut spawner = Spawner {
            rng: &mut self.rng,
            scene: &mut *scene,
            surface: self.surface,
            margin: self.tuning.spawn_margin,
        };
        self.entities.spawn_powerups(1, &mut spawner);
    }

    /// Bank the level bonus and move to the next level
    pub fn complete_level(&mut self, scene: &mut dyn Scene, now_ms: u64) {
        if !self.session.is_playing() {
            return;
        }
        let finished = self.session.level;
        let bonus = completion_bonus(
            self.session.time_left,
            self.entities.coins().len(),
            finished,
        );
        self.session.score += bonus;
        let upgrades = self.torch.on_score_changed(self.session.score);
        self.announce_upgrades(scene, &upgrades);

        log::info!("Level {} complete, bonus {}", finished, bonus);
        self.events.push(GameEvent::LevelCompleted {
            level: finished,
            bonus,
        });

        if self.tuning.max_level.is_some_and(|max| finished >= max) {
            self.end_game(scene, GameResult::Won);
            return;
        }

        let level = finished + 1;
        self.session.level = level;
        self.session.time_left = LEVEL_TIME_BASE + level as i32 * LEVEL_TIME_PER_LEVEL;
        self.torch.set_level(level);

        self.entities.clear_all(scene);
        self.populate(scene, SpawnCounts::for_level(level));
        self.session.has_level_key = false;

        // Countdown pauses for the announcement
        self.session.countdown_generation += 1;
        self.scheduler.schedule(
            now_ms + self.tuning.countdown_restart_delay_ms,
            self.epoch,
            Task::StartCountdown {
                generation: self.session.countdown_generation,
            },
        );

        self.refresh_hud(scene);
        self.message(scene, &format!("LEVEL {}", level), colors::SKY);
    }

    /// Finish the run. Repeated calls change nothing.
    pub fn end_game(&mut self, scene: &mut dyn Scene, result: GameResult) {
        if !self.session.is_playing() {
            return;
        }
        self.session.phase = GamePhase::Ended;
        let outcome = GameOutcome {
            result,
            final_score: self.session.score,
            level: self.session.level,
        };
        self.session.outcome = Some(outcome);
        self.scheduler.clear();

        self.torch.reset(self.session.level);
        let visual = self.torch_visual(self.torch.steady_radius());
        if let Err(e) = scene.set_torch_visual(visual) {
            log::warn!("torch reset not shown: {}", e);
        }
        scene.set_cursor_visual(None);

        log::info!(
            "Game over: {:?} at level {} with score {}",
            result,
            outcome.level,
            outcome.final_score
        );
        self.events.push(GameEvent::GameEnded {
            result,
            final_score: outcome.final_score,
        });
        self.refresh_hud(scene);
    }

    /// Debug: flip the cursor-on-pointer mode
    pub fn toggle_center_mode(&mut self, scene: &mut dyn Scene) {
        self.center_mode = !self.center_mode;
        let text = if self.center_mode {
            "CENTER MODE ON"
        } else {
            "CENTER MODE OFF"
        };
        self.message(scene, text, colors::SKY);
    }

    /// Debug: upgrade the torch to at least `scale`
    pub fn force_apply_torch_upgrade(&mut self, scene: &mut dyn Scene, scale: f32) {
        let upgrade = self.torch.force_apply(scale);
        self.announce_upgrades(scene, &[upgrade]);
    }

    /// Debug: back to the unscaled torch
    pub fn revert_torch_upgrade(&mut self, scene: &mut dyn Scene) {
        self.torch.revert();
        self.torch.set_level(self.session.level);
        self.refresh_hud(scene);
    }

    /// Message, burst and chime for each applied torch upgrade
    pub(crate) fn announce_upgrades(&mut self, scene: &mut dyn Scene, upgrades: &[TorchUpgrade]) {
        if upgrades.is_empty() {
            return;
        }
        let at = self.pointer.pos.unwrap_or_else(|| self.surface.center());
        for upgrade in upgrades {
            let text = match upgrade.threshold {
                Some(score) => format!("Torch expanded: {}x at {} points!", upgrade.scale, score),
                None => format!("Torch expanded: {}x", upgrade.scale),
            };
            log::info!("Torch scale {} applied at score {}", upgrade.scale, self.session.score);
            self.message(scene, &text, colors::GOLD);
            self.burst(scene, at, 60, colors::GOLD);
            self.events.push(GameEvent::TorchUpgraded {
                scale: upgrade.scale,
                score: self.session.score,
            });
        }
        self.refresh_hud(scene);
    }

    /// Torch overlay for this frame at `radius`
    pub fn torch_visual(&self, radius: f32) -> TorchVisual {
        let (inner_alpha, outer_alpha) = self.torch.alphas(self.powerup.is(PowerUpKind::Shield));
        TorchVisual {
            center: self.pointer.pos.unwrap_or_else(|| self.surface.center()),
            radius,
            inner_alpha,
            outer_alpha,
            upgraded: self.torch.upgraded,
        }
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot {
            score: self.session.score,
            time_left: self.session.time_left,
            level: self.session.level,
            torch_status_text: self.torch.status_text(),
            powerup_status_text: self.powerup.status_text(),
        }
    }

    pub(crate) fn refresh_hud(&self, scene: &mut dyn Scene) {
        scene.update_hud(&self.hud());
    }

    pub(crate) fn message(&self, scene: &mut dyn Scene, text: &str, color: u32) {
        if let Err(e) = scene.show_transient_message(text, color, self.settings.message_duration_ms)
        {
            log::warn!("message {:?} not shown: {}", text, e);
        }
    }

    pub(crate) fn burst(&self, scene: &mut dyn Scene, pos: Vec2, count: u32, color: u32) {
        if !self.settings.particles || count == 0 {
            return;
        }
        if let Err(e) = scene.show_particle_burst(pos, count, color) {
            log::warn!("particle burst not shown: {}", e);
        }
    }

    /// Resize the playable surface (affects later spawns and bomb bounds)
    pub fn resize(&mut self, width: f32, height: f32) {
        self.surface = Surface::new(width, height);
    }
}
