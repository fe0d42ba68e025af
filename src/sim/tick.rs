//! Tick driver
//!
//! The host calls [`GameState::advance`] with wall-clock milliseconds. Frames
//! on the 60 Hz grid and due deferred tasks run interleaved in time order.
//! Every due frame runs, so one long jump of the virtual clock ends in the
//! same state as many small steps. Real-time hosts can cap catch-up with
//! `Settings::max_catchup_frames`; skipped frames then do no work.

use glam::Vec2;
use rand::Rng;

use super::clock::{ScheduledTask, Task};
use super::collision::{interaction_point, resolve};
use super::event::GameEvent;
use super::powerup::PowerUpKind;
use super::scene::{Scene, colors};
use super::state::{EndReason, GameResult, GameState};
use crate::consts::*;

/// Abstract pointer input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// New position sample; implies the pointer is over the surface
    Moved { x: f32, y: f32 },
    Entered,
    Left,
}

/// Named developer key presses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugKey {
    ToggleCenterMode,
    /// Apply the debug torch upgrade, or revert it if the torch is upgraded
    ToggleTorchDebug,
}

impl GameState {
    /// Run every frame and task due up to `now_ms`; returns the events produced
    pub fn advance(&mut self, scene: &mut dyn Scene, now_ms: u64) -> Vec<GameEvent> {
        let mut frames_run = 0;
        while self.session.is_playing() {
            let stalled = self
                .settings
                .max_catchup_frames
                .is_some_and(|cap| frames_run >= cap);
            if stalled {
                let skipped = self.clock.skip_to(now_ms);
                if skipped > 0 {
                    log::debug!("host stalled, dropped {} frames", skipped);
                }
            }

            let frame_at = self.clock.next_frame_ms();
            let task_due = self
                .scheduler
                .next_due_ms()
                .filter(|&due| due <= now_ms && due <= frame_at);
            if let Some(task) = task_due.and_then(|due| self.scheduler.pop_due(due)) {
                self.clock.reach(task.due_ms);
                self.run_task(scene, task);
                continue;
            }

            if frame_at > now_ms {
                break;
            }
            self.frame(scene, frame_at);
            self.clock.frame_done(frame_at);
            frames_run += 1;
        }
        self.clock.reach(now_ms);
        self.drain_events()
    }

    /// Fire a deferred task if it still belongs to the running session
    fn run_task(&mut self, scene: &mut dyn Scene, scheduled: ScheduledTask) {
        if scheduled.epoch != self.epoch || !self.session.is_playing() {
            log::debug!("dropping stale task {:?}", scheduled.task);
            return;
        }
        let at = scheduled.due_ms;
        match scheduled.task {
            Task::RespawnCoin => {
                self.respawn_coin(scene);
            }
            Task::RespawnPowerUp => {
                self.respawn_powerup(scene);
            }
            Task::CompleteLevel => {
                self.complete_level(scene, at);
            }
            Task::StartCountdown { generation } => {
                if generation == self.session.countdown_generation {
                    self.scheduler.schedule(
                        at + COUNTDOWN_INTERVAL_MS,
                        self.epoch,
                        Task::CountdownTick { generation },
                    );
                }
            }
            Task::CountdownTick { generation } => {
                if generation == self.session.countdown_generation {
                    self.countdown(scene, at, generation);
                }
            }
        }
    }

    /// One second off the clock
    fn countdown(&mut self, scene: &mut dyn Scene, at: u64, generation: u32) {
        self.session.time_left -= 1;
        self.events.push(GameEvent::CountdownTick {
            time_left: self.session.time_left,
        });
        self.refresh_hud(scene);

        if self.session.time_left <= 0 {
            self.message(scene, "Time's up! You failed to find a key.", colors::ORANGE_RED);
            self.end_game(scene, GameResult::Lost(EndReason::Time));
            return;
        }
        self.scheduler.schedule(
            at + COUNTDOWN_INTERVAL_MS,
            self.epoch,
            Task::CountdownTick { generation },
        );
    }

    /// One 60 Hz frame at `at`
    fn frame(&mut self, scene: &mut dyn Scene, at: u64) {
        // No-collect watchdog
        if at.saturating_sub(self.session.last_collect_ms) > self.tuning.no_collect_timeout_ms {
            if self.session.has_level_key || self.powerup.is_active() {
                let saver = if self.session.has_level_key {
                    "key"
                } else {
                    "active power-up"
                };
                log::debug!("watchdog save by {}", saver);
                self.session.last_collect_ms = at;
                self.events.push(GameEvent::WatchdogSave);
                self.message(
                    scene,
                    &format!("No coin for 5s, but your {} saved you!", saver),
                    colors::GOLD,
                );
            } else {
                self.message(scene, "No coin collected for 5s! Game Over!", colors::ORANGE_RED);
                self.end_game(scene, GameResult::Lost(EndReason::NoCoin));
            }
            return;
        }

        if self.session.level > BOMB_JITTER_LEVEL {
            self.jitter_bombs(scene);
        }

        if let Some(kind) = self.powerup.tick(at) {
            log::debug!("power-up {} expired", kind.as_str());
            self.events.push(GameEvent::PowerUpExpired { kind });
            self.message(scene, "POWER-UP ENDED", colors::GREY);
            self.refresh_hud(scene);
        }

        self.torch.tick();

        let Some(pos) = self.pointer.pos.filter(|_| self.pointer.inside) else {
            return;
        };
        let point = self.interaction_point(pos);
        scene.set_cursor_visual(Some(point));
        let radius = self.torch.effective_radius(&mut self.rng);
        if let Err(e) = scene.set_torch_visual(self.torch_visual(radius)) {
            log::warn!("torch not drawn: {}", e);
        }
        resolve(self, scene, point, at);
    }

    /// Random walk of one step per axis, kept inside the spawn margin
    fn jitter_bombs(&mut self, scene: &mut dyn Scene) {
        let margin = self.tuning.spawn_margin;
        let moves: Vec<_> = self
            .entities
            .bombs()
            .iter()
            .map(|b| (b.id, b.pos))
            .collect();
        for (id, pos) in moves {
            let step = Vec2::new(
                self.rng.random_range(-1.0..1.0f32),
                self.rng.random_range(-1.0..1.0f32),
            ) * BOMB_JITTER_STEP;
            let next = self.surface.clamp(pos + step, margin);
            self.entities.move_bomb(id, next, scene);
        }
    }

    /// Cursor sprite position for a raw pointer sample
    pub fn interaction_point(&self, pointer: Vec2) -> Vec2 {
        interaction_point(pointer, self.powerup.is(PowerUpKind::Magnet), self.center_mode)
    }

    /// Feed one pointer event
    pub fn pointer(&mut self, event: PointerEvent, scene: &mut dyn Scene) {
        match event {
            PointerEvent::Moved { x, y } => {
                self.pointer.pos = Some(Vec2::new(x, y));
                self.pointer.inside = true;
            }
            PointerEvent::Entered => self.pointer.inside = true,
            PointerEvent::Left => self.pointer.inside = false,
        }

        let cursor = match self.pointer.pos {
            Some(pos) if self.pointer.inside && self.session.is_playing() => {
                Some(self.interaction_point(pos))
            }
            _ => None,
        };
        scene.set_cursor_visual(cursor);
    }

    /// Handle a developer key; ignored unless debug keys are enabled
    pub fn debug_key(&mut self, key: DebugKey, scene: &mut dyn Scene) {
        if !self.settings.debug_keys {
            log::debug!("debug key {:?} ignored", key);
            return;
        }
        match key {
            DebugKey::ToggleCenterMode => self.toggle_center_mode(scene),
            DebugKey::ToggleTorchDebug => {
                if self.torch.upgraded {
                    self.revert_torch_upgrade(scene);
                    self.message(scene, "Torch upgrade reverted (debug)", colors::PINK);
                } else {
                    self.force_apply_torch_upgrade(scene, TORCH_DEBUG_SCALE);
                    self.message(scene, "Torch upgrade applied (debug)", colors::GOLD);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::entity::Surface;
    use crate::sim::scene::RecordingScene;
    use crate::sim::state::GamePhase;
    use crate::tuning::Tuning;

    fn started(seed: u64) -> (GameState, RecordingScene) {
        let mut state = GameState::with_seed(seed, Surface::new(1000.0, 800.0));
        let mut scene = RecordingScene::new();
        state.start(&mut scene, 0);
        (state, scene)
    }

    /// Park the pointer in a corner where nothing spawns
    fn park(state: &mut GameState, scene: &mut RecordingScene) {
        state.center_mode = true;
        state.pointer(PointerEvent::Moved { x: 1.0, y: 1.0 }, scene);
    }

    #[test]
    fn test_watchdog_ends_game() {
        let (mut state, mut scene) = started(1);
        state.advance(&mut scene, 4_990);
        assert_eq!(state.phase(), GamePhase::Playing);

        let events = state.advance(&mut scene, 5_100);
        assert_eq!(state.phase(), GamePhase::Ended);
        let outcome = state.session.outcome.expect("ended");
        assert_eq!(outcome.result, GameResult::Lost(EndReason::NoCoin));
        assert!(scene.has_message("No coin collected for 5s! Game Over!"));
        assert!(events.iter().any(|e| matches!(e, GameEvent::GameEnded { .. })));
    }

    #[test]
    fn test_watchdog_saved_by_key() {
        let (mut state, mut scene) = started(2);
        state.session.has_level_key = true;
        let events = state.advance(&mut scene, 5_100);

        assert_eq!(state.phase(), GamePhase::Playing);
        assert!(state.session.last_collect_ms > 5_000);
        assert!(events.contains(&GameEvent::WatchdogSave));
        assert!(scene.has_message("but your key saved you!"));
        // Nothing is consumed
        assert!(state.session.has_level_key);
    }

    #[test]
    fn test_watchdog_saved_by_powerup() {
        let (mut state, mut scene) = started(3);
        state.powerup.activate(PowerUpKind::Shield, 10, 0);
        state.advance(&mut scene, 5_100);
        assert_eq!(state.phase(), GamePhase::Playing);
        assert!(scene.has_message("active power-up saved you!"));
        assert!(state.powerup.is(PowerUpKind::Shield));
    }

    #[test]
    fn test_countdown_runs_out() {
        let tuning = Tuning {
            initial_time_secs: 3,
            ..Tuning::default()
        };
        let mut state = GameState::new(4, tuning, Settings::default(), Surface::default());
        let mut scene = RecordingScene::new();
        state.start(&mut scene, 0);
        state.session.has_level_key = true;

        let events = state.advance(&mut scene, 2_500);
        assert_eq!(state.session.time_left, 1);
        let ticks = events
            .iter()
            .filter(|e| matches!(e, GameEvent::CountdownTick { .. }))
            .count();
        assert_eq!(ticks, 2);

        state.advance(&mut scene, 3_000);
        assert_eq!(state.phase(), GamePhase::Ended);
        assert_eq!(
            state.session.outcome.map(|o| o.result),
            Some(GameResult::Lost(EndReason::Time))
        );
        assert!(scene.has_message("Time's up! You failed to find a key."));
        assert!(state.scheduler.is_empty());
    }

    #[test]
    fn test_powerup_expiry_message() {
        let (mut state, mut scene) = started(5);
        state.powerup.activate(PowerUpKind::Double, 1, 0);
        state.session.has_level_key = true;
        let events = state.advance(&mut scene, 1_100);
        assert!(events.contains(&GameEvent::PowerUpExpired {
            kind: PowerUpKind::Double
        }));
        assert!(scene.has_message("POWER-UP ENDED"));
        assert_eq!(state.hud().powerup_status_text, "Power-up: None");
    }

    #[test]
    fn test_key_pickup_advances_level_after_delay() {
        let (mut state, mut scene) = started(6);
        let key = state.entities.keys()[0].pos;
        state.center_mode = true;
        // Shield so an overlapping bomb cannot end the run
        state.powerup.activate(PowerUpKind::Shield, 10, 0);
        state.pointer(PointerEvent::Moved { x: key.x, y: key.y }, &mut scene);

        state.advance(&mut scene, 20);
        assert!(state.session.has_level_key);
        assert_eq!(state.session.level, 1);

        state.advance(&mut scene, 600);
        assert_eq!(state.session.level, 2);
        assert_eq!(state.session.time_left, 35);
        assert!(!state.session.has_level_key);
        assert_eq!(scene.live.len(), state.entities.handle_count());
    }

    #[test]
    fn test_countdown_pauses_between_levels() {
        let (mut state, mut scene) = started(7);
        state.session.has_level_key = true;
        park(&mut state, &mut scene);
        state.advance(&mut scene, 1_500);
        assert_eq!(state.session.time_left, 29);

        state.complete_level(&mut scene, 1_500);
        assert_eq!(state.session.time_left, 35);
        // A coin was just taken; keeps the watchdog quiet
        state.session.last_collect_ms = 1_500;
        // Announcement delay (2000) plus the first interval (1000)
        state.advance(&mut scene, 4_400);
        assert_eq!(state.session.time_left, 35);
        state.advance(&mut scene, 4_500);
        assert_eq!(state.session.time_left, 34);
        state.advance(&mut scene, 5_500);
        assert_eq!(state.session.time_left, 33);
    }

    #[test]
    fn test_stale_tasks_do_not_touch_new_session() {
        let (mut state, mut scene) = started(8);
        state.end_game(&mut scene, GameResult::Lost(EndReason::Bomb));
        state.start(&mut scene, 100);
        state.scheduler.schedule(400, state.epoch - 1, Task::CompleteLevel);
        state.scheduler.schedule(400, state.epoch - 1, Task::RespawnCoin);
        state.session.has_level_key = true;

        state.advance(&mut scene, 1_000);
        assert_eq!(state.session.level, 1);
        assert_eq!(state.entities.coins().len(), 8);
    }

    #[test]
    fn test_ended_session_ignores_advance() {
        let (mut state, mut scene) = started(9);
        state.end_game(&mut scene, GameResult::Lost(EndReason::Bomb));
        state.drain_events();
        let hud_updates = scene.hud_updates;
        let events = state.advance(&mut scene, 60_000);
        assert!(events.is_empty());
        assert_eq!(scene.hud_updates, hud_updates);
        assert_eq!(state.clock.now_ms(), 60_000);
    }

    #[test]
    fn test_pointer_outside_skips_collisions_but_torch_animates() {
        let (mut state, mut scene) = started(10);
        state.session.has_level_key = true;
        let coin = state.entities.coins()[0].pos;
        state.center_mode = true;
        state.pointer(PointerEvent::Moved { x: coin.x, y: coin.y }, &mut scene);
        state.pointer(PointerEvent::Left, &mut scene);
        assert_eq!(scene.cursor, None);

        state.force_apply_torch_upgrade(&mut scene, 1.5);
        state.advance(&mut scene, 500);
        assert_eq!(state.session.score, 0);
        assert!(state.torch.current > 1.0);

        state.pointer(PointerEvent::Entered, &mut scene);
        assert_eq!(scene.cursor, Some(coin));
    }

    #[test]
    fn test_frame_draws_torch_and_cursor() {
        let (mut state, mut scene) = started(11);
        state.entities.clear_all(&mut scene);
        state.pointer(PointerEvent::Moved { x: 1.0, y: 1.0 }, &mut scene);
        state.advance(&mut scene, 17);
        let torch = scene.torch.expect("torch drawn");
        assert_eq!(torch.center, Vec2::new(1.0, 1.0));
        assert!((160.0..=180.0).contains(&torch.radius));
        let d = 60.0 / 2f32.sqrt();
        let cursor = scene.cursor.expect("cursor");
        assert!((cursor - Vec2::new(1.0 + d, 1.0 + d)).length() < 1e-3);
    }

    #[test]
    fn test_bomb_jitter_from_level_three() {
        let (mut state, mut scene) = started(12);
        state.session.has_level_key = true;
        let before: Vec<Vec2> = state.entities.bombs().iter().map(|b| b.pos).collect();
        state.advance(&mut scene, 100);
        let after: Vec<Vec2> = state.entities.bombs().iter().map(|b| b.pos).collect();
        assert_eq!(before, after);

        state.session.level = 3;
        state.advance(&mut scene, 200);
        for (old, bomb) in before.iter().zip(state.entities.bombs()) {
            assert!(old.distance(bomb.pos) <= 6.0 * 2f32.sqrt() + 1e-3);
            assert!(state.surface.clamp(bomb.pos, SPAWN_MARGIN) == bomb.pos);
        }
    }

    #[test]
    fn test_debug_keys() {
        let (mut state, mut scene) = started(13);
        state.debug_key(DebugKey::ToggleCenterMode, &mut scene);
        assert!(state.center_mode);
        assert!(scene.has_message("CENTER MODE ON"));

        state.debug_key(DebugKey::ToggleTorchDebug, &mut scene);
        assert!(state.torch.upgraded);
        assert!(scene.has_message("Torch upgrade applied (debug)"));
        state.debug_key(DebugKey::ToggleTorchDebug, &mut scene);
        assert!(!state.torch.upgraded);
        assert!(scene.has_message("Torch upgrade reverted (debug)"));
    }

    #[test]
    fn test_debug_keys_disabled_in_release() {
        let settings = Settings::release();
        let mut state = GameState::new(14, Tuning::default(), settings, Surface::default());
        let mut scene = RecordingScene::new();
        state.start(&mut scene, 0);
        state.debug_key(DebugKey::ToggleCenterMode, &mut scene);
        assert!(!state.center_mode);
    }

    #[test]
    fn test_long_stall_is_bounded() {
        let (mut state, mut scene) = started(15);
        state.settings.max_catchup_frames = Some(MAX_CATCHUP_FRAMES);
        state.session.has_level_key = true;
        park(&mut state, &mut scene);
        state.force_apply_torch_upgrade(&mut scene, 2.0);
        state.advance(&mut scene, 4_000);
        assert_eq!(state.clock.frames(), 240);
        // Countdown tasks are never skipped
        assert_eq!(state.session.time_left, 26);
        // Skipped frames do no easing
        assert!(state.torch.current < 2.0);
    }

    /// Frames, torch, score, time and entity positions after a scripted second
    fn one_second(steps: &[u64]) -> (u64, u32, u64, i32, Vec<Vec2>, Vec<Vec2>) {
        let (mut state, mut scene) = started(21);
        state.session.level = 3;
        state.session.has_level_key = true;
        state.powerup.activate(PowerUpKind::Magnet, 20, 0);
        state.force_apply_torch_upgrade(&mut scene, 2.0);
        // Keep the run on this level and clear of bombs
        let keys: Vec<_> = state.entities.keys().iter().map(|k| k.id).collect();
        for id in keys {
            state.entities.remove_key(id, &mut scene);
        }
        let bombs: Vec<_> = state.entities.bombs().iter().map(|b| b.id).collect();
        for id in bombs {
            state.entities.move_bomb(id, Vec2::new(960.0, 760.0), &mut scene);
        }
        state.pointer(PointerEvent::Moved { x: 500.0, y: 400.0 }, &mut scene);
        for &now in steps {
            state.advance(&mut scene, now);
        }
        (
            state.clock.frames(),
            state.torch.current.to_bits(),
            state.session.score,
            state.session.time_left,
            state.entities.coins().iter().map(|c| c.pos).collect(),
            state.entities.bombs().iter().map(|b| b.pos).collect(),
        )
    }

    #[test]
    fn test_one_jump_matches_small_steps() {
        let mut steps: Vec<u64> = (1..=62).map(|i| i * 16).collect();
        steps.push(1_000);
        let stepped = one_second(&steps);
        let jumped = one_second(&[1_000]);
        assert_eq!(stepped.0, 60);
        assert_eq!(stepped.1, 2.0f32.to_bits());
        assert_eq!(jumped, stepped);
    }

    #[test]
    fn test_back_to_back_levels_keep_one_countdown() {
        let (mut state, mut scene) = started(22);
        state.powerup.activate(PowerUpKind::Shield, 60, 0);
        state.complete_level(&mut scene, 1_000);
        state.complete_level(&mut scene, 2_500);
        assert_eq!(state.session.level, 3);
        assert_eq!(state.session.time_left, 40);

        // Only the second announcement resumes the clock: 4500 + 1000
        state.advance(&mut scene, 5_400);
        assert_eq!(state.session.time_left, 40);
        state.advance(&mut scene, 8_600);
        assert_eq!(state.session.time_left, 36);

        let current = Task::CountdownTick {
            generation: state.session.countdown_generation,
        };
        assert_eq!(state.scheduler.pending(current), 1);
        state.advance(&mut scene, 12_600);
        assert_eq!(state.session.time_left, 32);
    }

    #[test]
    fn test_runs_without_a_renderer() {
        let mut state = GameState::with_seed(16, Surface::default());
        let mut scene = crate::sim::scene::NullScene::default();
        state.start(&mut scene, 0);
        state.pointer(PointerEvent::Moved { x: 640.0, y: 360.0 }, &mut scene);
        state.advance(&mut scene, 10_000);
        assert_ne!(state.phase(), GamePhase::Idle);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = |seed| {
            let (mut state, mut scene) = started(seed);
            state.powerup.activate(PowerUpKind::Magnet, 20, 0);
            for i in 0..200u64 {
                let x = 100.0 + (i as f32 * 7.0) % 800.0;
                let y = 100.0 + (i as f32 * 13.0) % 600.0;
                state.pointer(PointerEvent::Moved { x, y }, &mut scene);
                state.advance(&mut scene, i * 50);
            }
            (state.session.score, state.session.level, state.phase())
        };
        assert_eq!(run(99), run(99));
    }
}
