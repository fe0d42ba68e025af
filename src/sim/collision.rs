//! Collision and interaction resolution
//!
//! Every frame the raw pointer is turned into an interaction point, nearby
//! coins are pulled in by the magnet, and overlaps are resolved in a fixed
//! order: coins, bombs, power-ups, then the key.

use glam::Vec2;

use super::clock::Task;
use super::entity::EntityId;
use super::event::GameEvent;
use super::powerup::PowerUpKind;
use super::scene::{Scene, colors};
use super::state::{EndReason, GameResult, GameState};
use crate::consts::*;
use crate::{heading, step_toward};

/// Point used for collision tests, offset from the raw pointer along 45°
pub fn interaction_point(pointer: Vec2, magnet_active: bool, center_mode: bool) -> Vec2 {
    let offset = if magnet_active {
        MAGNET_CURSOR_OFFSET
    } else if center_mode {
        0.0
    } else {
        CURSOR_OFFSET
    };
    pointer + heading(CURSOR_ANGLE_DEG) * offset
}

/// Overlap test against an entity's visual center
pub fn hits(point: Vec2, center: Vec2, size: f32, pad: f32) -> bool {
    point.distance(center) < size / 2.0 + pad
}

/// Points banked when a level is finished
pub fn completion_bonus(time_left: i32, coins_left: usize, level: u32) -> u64 {
    time_left.max(0) as u64 * BONUS_PER_SECOND
        + coins_left as u64 * BONUS_PER_COIN
        + level as u64 * BONUS_PER_LEVEL
}

/// Resolve one frame of interaction at `point`
pub(crate) fn resolve(state: &mut GameState, scene: &mut dyn Scene, point: Vec2, now_ms: u64) {
    if state.powerup.is(PowerUpKind::Magnet) {
        attract_coins(state, scene, point);
    }

    let pad = state.tuning.collision_pad;

    let touched: Vec<EntityId> = state
        .entities
        .coins()
        .iter()
        .filter(|c| hits(point, c.pos, COIN_SIZE, pad))
        .map(|c| c.id)
        .collect();
    for id in touched {
        collect_coin(state, scene, id, now_ms);
    }

    if !state.powerup.is(PowerUpKind::Shield) {
        let bomb = state
            .entities
            .bombs()
            .iter()
            .find(|b| hits(point, b.pos, BOMB_SIZE, pad))
            .map(|b| b.pos);
        if let Some(pos) = bomb {
            log::debug!("bomb hit at {:?}", pos);
            state.burst(scene, pos, 30, colors::ORANGE_RED);
            state.end_game(scene, GameResult::Lost(EndReason::Bomb));
            return;
        }
    }

    let touched: Vec<EntityId> = state
        .entities
        .powerups()
        .iter()
        .filter(|p| hits(point, p.pos, POWERUP_SIZE, pad))
        .map(|p| p.id)
        .collect();
    for id in touched {
        collect_powerup(state, scene, id, now_ms);
    }

    let touched: Vec<EntityId> = state
        .entities
        .keys()
        .iter()
        .filter(|k| hits(point, k.pos, KEY_SIZE, pad))
        .map(|k| k.id)
        .collect();
    for id in touched {
        collect_key(state, scene, id, now_ms);
    }
}

/// Step every coin within the magnet radius toward `point`
fn attract_coins(state: &mut GameState, scene: &mut dyn Scene, point: Vec2) {
    let radius = state.tuning.magnet_radius;
    let speed = state.tuning.magnet_speed;
    let pulled: Vec<(EntityId, Vec2)> = state
        .entities
        .coins()
        .iter()
        .filter(|c| c.pos.distance(point) < radius)
        .map(|c| (c.id, step_toward(c.pos, point, speed)))
        .collect();
    for (id, pos) in pulled {
        state.entities.move_coin(id, pos, scene);
    }
}

fn collect_coin(state: &mut GameState, scene: &mut dyn Scene, id: EntityId, now_ms: u64) {
    let Some(coin) = state.entities.remove_coin(id, scene) else {
        return;
    };
    let points = coin.value * state.powerup.coin_multiplier();
    state.session.score += points as u64;
    state.session.last_collect_ms = now_ms;
    log::debug!("coin {} collected for {} points", coin.id, points);

    state.burst(scene, coin.pos, points * 3, colors::GOLD);
    state.events.push(GameEvent::CoinCollected {
        pos: coin.pos,
        points,
    });
    let upgrades = state.torch.on_score_changed(state.session.score);
    state.announce_upgrades(scene, &upgrades);

    state.scheduler.schedule(
        now_ms + state.tuning.coin_respawn_delay_ms,
        state.epoch,
        Task::RespawnCoin,
    );
    state.refresh_hud(scene);
}

fn collect_powerup(state: &mut GameState, scene: &mut dyn Scene, id: EntityId, now_ms: u64) {
    let Some(powerup) = state.entities.remove_powerup(id, scene) else {
        return;
    };
    let kind = powerup.kind;
    let extra_secs = state.powerup.activate(kind, powerup.duration_secs, now_ms);
    state.session.time_left += extra_secs;
    log::debug!("power-up {} active for {}s", kind.as_str(), powerup.duration_secs);

    state.message(scene, kind.banner(), kind.color());
    state.burst(scene, powerup.pos, 10, kind.color());
    state.events.push(GameEvent::PowerUpCollected { kind });

    state.scheduler.schedule(
        now_ms + state.tuning.powerup_respawn_delay_ms,
        state.epoch,
        Task::RespawnPowerUp,
    );
    state.refresh_hud(scene);
}

fn collect_key(state: &mut GameState, scene: &mut dyn Scene, id: EntityId, now_ms: u64) {
    let Some(key) = state.entities.remove_key(id, scene) else {
        return;
    };
    state.session.has_level_key = true;
    log::debug!("level key collected on level {}", state.session.level);

    state.burst(scene, key.pos, 10, colors::YELLOW);
    state.message(scene, "Key collected! Advancing level...", colors::GREEN);
    state.events.push(GameEvent::KeyCollected);

    state.scheduler.schedule(
        now_ms + state.tuning.level_complete_delay_ms,
        state.epoch,
        Task::CompleteLevel,
    );
    state.refresh_hud(scene);
}
