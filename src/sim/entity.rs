//! Entity registry
//!
//! Owns the live coins, bombs, power-ups and level keys (plus background
//! decoration). Entity data is plain; the scene's visual handles live in a
//! side table keyed by entity id, and every removal releases its handle.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::powerup::PowerUpKind;
use super::scene::{Scene, Sprite, VisualHandle};
use crate::consts::*;

pub type EntityId = u32;

/// Playable area in surface coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub width: f32,
    pub height: f32,
}

impl Surface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    /// Uniform point inset by `margin` from every edge
    pub fn random_point(&self, rng: &mut impl Rng, margin: f32) -> Vec2 {
        let span_x = (self.width - 2.0 * margin).max(0.0);
        let span_y = (self.height - 2.0 * margin).max(0.0);
        Vec2::new(
            margin + rng.random::<f32>() * span_x,
            margin + rng.random::<f32>() * span_y,
        )
    }

    /// Keep `pos` at least `margin` away from every edge
    pub fn clamp(&self, pos: Vec2, margin: f32) -> Vec2 {
        let max_x = (self.width - margin).max(margin);
        let max_y = (self.height - margin).max(margin);
        Vec2::new(pos.x.clamp(margin, max_x), pos.y.clamp(margin, max_y))
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(1280.0, 720.0)
    }
}

/// A collectible coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    pub id: EntityId,
    /// Visual center
    pub pos: Vec2,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bomb {
    pub id: EntityId,
    pub pos: Vec2,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: EntityId,
    pub pos: Vec2,
    pub kind: PowerUpKind,
    pub duration_secs: u32,
}

/// The key that finishes the level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelKey {
    pub id: EntityId,
    pub pos: Vec2,
}

/// Everything a spawn needs besides the registry itself
pub struct Spawner<'a> {
    pub rng: &'a mut Pcg32,
    pub scene: &'a mut dyn Scene,
    pub surface: Surface,
    pub margin: f32,
}

impl Spawner<'_> {
    fn point(&mut self) -> Vec2 {
        self.surface.random_point(self.rng, self.margin)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EntityRegistry {
    coins: Vec<Coin>,
    bombs: Vec<Bomb>,
    powerups: Vec<PowerUp>,
    keys: Vec<LevelKey>,
    /// Background stars and trees (no gameplay)
    decorations: Vec<EntityId>,
    /// Scene handles, keyed by entity id
    #[serde(skip)]
    handles: BTreeMap<EntityId, VisualHandle>,
    next_id: EntityId,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn attach(&mut self, spawner: &mut Spawner<'_>, sprite: Sprite, pos: Vec2) -> EntityId {
        let id = self.next_entity_id();
        let handle = spawner.scene.add_entity(sprite, pos);
        self.handles.insert(id, handle);
        id
    }

    fn detach(&mut self, id: EntityId, scene: &mut dyn Scene) {
        if let Some(handle) = self.handles.remove(&id) {
            scene.remove_entity(handle);
        }
    }

    /// Coins worth `rand[1, level] * 10`
    pub fn spawn_coins(&mut self, count: u32, level: u32, spawner: &mut Spawner<'_>) {
        for _ in 0..count {
            let pos = spawner.point();
            let value = spawner.rng.random_range(1..=level.max(1)) * 10;
            let id = self.attach(spawner, Sprite::Coin { value }, pos);
            log::debug!("coin {} spawned at {:?} worth {}", id, pos, value);
            self.coins.push(Coin { id, pos, value });
        }
    }

    pub fn spawn_bombs(&mut self, count: u32, spawner: &mut Spawner<'_>) {
        for _ in 0..count {
            let pos = spawner.point();
            let id = self.attach(spawner, Sprite::Bomb, pos);
            self.bombs.push(Bomb { id, pos });
        }
    }

    /// Power-up kind is uniform over all kinds
    pub fn spawn_powerups(&mut self, count: u32, spawner: &mut Spawner<'_>) {
        for _ in 0..count {
            let pos = spawner.point();
            let kind = PowerUpKind::ALL[spawner.rng.random_range(0..PowerUpKind::ALL.len())];
            let id = self.attach(spawner, Sprite::PowerUp { kind }, pos);
            log::debug!("power-up {} ({}) spawned at {:?}", id, kind.as_str(), pos);
            self.powerups.push(PowerUp {
                id,
                pos,
                kind,
                duration_secs: kind.duration_secs(),
            });
        }
    }

    pub fn spawn_keys(&mut self, count: u32, spawner: &mut Spawner<'_>) {
        for _ in 0..count {
            let pos = spawner.point();
            let id = self.attach(spawner, Sprite::Key, pos);
            self.keys.push(LevelKey { id, pos });
        }
    }

    /// Stars anywhere on the surface
    pub fn spawn_stars(&mut self, count: u32, spawner: &mut Spawner<'_>) {
        for _ in 0..count {
            let size = spawner.rng.random::<f32>() * 4.0 + 1.0;
            let pos = spawner.surface.random_point(spawner.rng, 0.0);
            let id = self.attach(spawner, Sprite::Star { size }, pos);
            self.decorations.push(id);
        }
    }

    /// Trees standing on the bottom edge
    pub fn spawn_trees(&mut self, count: u32, spawner: &mut Spawner<'_>) {
        for _ in 0..count {
            let x = spawner.rng.random::<f32>() * spawner.surface.width * 0.9;
            let width = spawner.rng.random::<f32>() * 40.0 + 60.0;
            let shade = spawner.rng.random_range(20..60u8);
            let sprite = Sprite::Tree {
                width,
                height: width * 1.5,
                shade,
            };
            let pos = Vec2::new(x, spawner.surface.height);
            let id = self.attach(spawner, sprite, pos);
            self.decorations.push(id);
        }
    }

    /// Remove every entity and release every visual handle
    pub fn clear_all(&mut self, scene: &mut dyn Scene) {
        for (_, handle) in std::mem::take(&mut self.handles) {
            scene.remove_entity(handle);
        }
        self.coins.clear();
        self.bombs.clear();
        self.powerups.clear();
        self.keys.clear();
        self.decorations.clear();
    }

    /// No-op if the coin is already gone
    pub fn remove_coin(&mut self, id: EntityId, scene: &mut dyn Scene) -> Option<Coin> {
        let idx = self.coins.iter().position(|c| c.id == id)?;
        let coin = self.coins.remove(idx);
        self.detach(id, scene);
        Some(coin)
    }

    pub fn remove_powerup(&mut self, id: EntityId, scene: &mut dyn Scene) -> Option<PowerUp> {
        let idx = self.powerups.iter().position(|p| p.id == id)?;
        let powerup = self.powerups.remove(idx);
        self.detach(id, scene);
        Some(powerup)
    }

    pub fn remove_key(&mut self, id: EntityId, scene: &mut dyn Scene) -> Option<LevelKey> {
        let idx = self.keys.iter().position(|k| k.id == id)?;
        let key = self.keys.remove(idx);
        self.detach(id, scene);
        Some(key)
    }

    pub fn move_coin(&mut self, id: EntityId, pos: Vec2, scene: &mut dyn Scene) {
        if let Some(coin) = self.coins.iter_mut().find(|c| c.id == id) {
            coin.pos = pos;
            if let Some(&handle) = self.handles.get(&id) {
                scene.move_entity(handle, pos);
            }
        }
    }

    pub fn move_bomb(&mut self, id: EntityId, pos: Vec2, scene: &mut dyn Scene) {
        if let Some(bomb) = self.bombs.iter_mut().find(|b| b.id == id) {
            bomb.pos = pos;
            if let Some(&handle) = self.handles.get(&id) {
                scene.move_entity(handle, pos);
            }
        }
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    pub fn bombs(&self) -> &[Bomb] {
        &self.bombs
    }

    pub fn powerups(&self) -> &[PowerUp] {
        &self.powerups
    }

    pub fn keys(&self) -> &[LevelKey] {
        &self.keys
    }

    pub fn decoration_count(&self) -> usize {
        self.decorations.len()
    }

    /// Visual handle for an entity, if it is live
    pub fn handle(&self, id: EntityId) -> Option<VisualHandle> {
        self.handles.get(&id).copied()
    }

    /// Number of visual handles held (one per live entity)
    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::scene::RecordingScene;
    use rand::SeedableRng;

    fn fill(registry: &mut EntityRegistry, rng: &mut Pcg32, scene: &mut RecordingScene) {
        let mut spawner = Spawner {
            rng,
            scene,
            surface: Surface::new(800.0, 600.0),
            margin: SPAWN_MARGIN,
        };
        registry.spawn_coins(8, 3, &mut spawner);
        registry.spawn_bombs(4, &mut spawner);
        registry.spawn_powerups(2, &mut spawner);
        registry.spawn_keys(1, &mut spawner);
        registry.spawn_stars(50, &mut spawner);
        registry.spawn_trees(8, &mut spawner);
    }

    #[test]
    fn test_spawn_counts_and_handles() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut scene = RecordingScene::new();
        let mut registry = EntityRegistry::new();
        fill(&mut registry, &mut rng, &mut scene);

        assert_eq!(registry.coins().len(), 8);
        assert_eq!(registry.bombs().len(), 4);
        assert_eq!(registry.powerups().len(), 2);
        assert_eq!(registry.keys().len(), 1);
        assert_eq!(registry.decoration_count(), 58);
        assert_eq!(registry.handle_count(), 73);
        assert_eq!(scene.live.len(), 73);
    }

    #[test]
    fn test_spawn_positions_inside_margin() {
        let mut rng = Pcg32::seed_from_u64(2);
        let mut scene = RecordingScene::new();
        let mut registry = EntityRegistry::new();
        for _ in 0..10 {
            fill(&mut registry, &mut rng, &mut scene);
        }
        let in_bounds = |p: Vec2| p.x >= 30.0 && p.x <= 770.0 && p.y >= 30.0 && p.y <= 570.0;
        assert!(registry.coins().iter().all(|c| in_bounds(c.pos)));
        assert!(registry.bombs().iter().all(|b| in_bounds(b.pos)));
        assert!(registry.powerups().iter().all(|p| in_bounds(p.pos)));
        assert!(registry.keys().iter().all(|k| in_bounds(k.pos)));
    }

    #[test]
    fn test_coin_values_scale_with_level() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut scene = RecordingScene::new();
        let mut registry = EntityRegistry::new();
        fill(&mut registry, &mut rng, &mut scene);
        for coin in registry.coins() {
            assert!([10, 20, 30].contains(&coin.value), "value {}", coin.value);
        }
    }

    #[test]
    fn test_powerup_durations_match_kind() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut scene = RecordingScene::new();
        let mut registry = EntityRegistry::new();
        fill(&mut registry, &mut rng, &mut scene);
        for p in registry.powerups() {
            assert_eq!(p.duration_secs, p.kind.duration_secs());
        }
    }

    #[test]
    fn test_remove_twice_is_noop() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut scene = RecordingScene::new();
        let mut registry = EntityRegistry::new();
        fill(&mut registry, &mut rng, &mut scene);

        let id = registry.coins()[0].id;
        assert!(registry.remove_coin(id, &mut scene).is_some());
        assert!(registry.remove_coin(id, &mut scene).is_none());
        assert_eq!(registry.coins().len(), 7);
        assert_eq!(scene.stray_removals, 0);
        assert!(registry.handle(id).is_none());
    }

    #[test]
    fn test_clear_all_releases_every_handle() {
        let mut rng = Pcg32::seed_from_u64(6);
        let mut scene = RecordingScene::new();
        let mut registry = EntityRegistry::new();
        fill(&mut registry, &mut rng, &mut scene);

        registry.clear_all(&mut scene);
        assert!(scene.live.is_empty());
        assert_eq!(scene.stray_removals, 0);
        assert_eq!(registry.handle_count(), 0);
        assert!(registry.coins().is_empty());
        assert_eq!(registry.decoration_count(), 0);
    }

    #[test]
    fn test_move_coin_updates_scene() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut scene = RecordingScene::new();
        let mut registry = EntityRegistry::new();
        fill(&mut registry, &mut rng, &mut scene);

        let id = registry.coins()[0].id;
        let target = Vec2::new(100.0, 100.0);
        registry.move_coin(id, target, &mut scene);
        assert_eq!(registry.coins()[0].pos, target);
        let handle = registry.handle(id).expect("live");
        assert_eq!(scene.live[&handle].1, target);
    }

    #[test]
    fn test_surface_clamp() {
        let surface = Surface::new(200.0, 100.0);
        let p = surface.clamp(Vec2::new(-5.0, 500.0), 30.0);
        assert_eq!(p, Vec2::new(30.0, 70.0));
    }
}
