//! Torch Dash headless runner
//!
//! Plays a seeded session with a scripted pointer and prints the final HUD as
//! JSON. Usage: `torch-dash [seed] [tuning.json]`.

#[cfg(not(target_arch = "wasm32"))]
use torch_dash::sim::{GameEvent, GamePhase, GameState, PointerEvent, RecordingScene, Surface};
#[cfg(not(target_arch = "wasm32"))]
use torch_dash::{Settings, Tuning};

/// Pointer speed of the demo bot in units per frame
#[cfg(not(target_arch = "wasm32"))]
const BOT_SPEED: f32 = 9.0;
/// Coins the bot takes before it goes for the key
#[cfg(not(target_arch = "wasm32"))]
const BOT_COINS_PER_LEVEL: u32 = 6;
/// Virtual time limit for one demo run
#[cfg(not(target_arch = "wasm32"))]
const DEMO_LIMIT_MS: u64 = 180_000;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use glam::Vec2;

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(s) => s.parse::<u64>()?,
        None => 42,
    };
    let tuning = match args.next() {
        Some(path) => Tuning::from_json(&std::fs::read_to_string(path)?)?,
        None => Tuning::default(),
    };
    log::info!("Torch Dash (headless) starting with seed {}", seed);

    let surface = Surface::default();
    let mut state = GameState::new(seed, tuning, Settings::release(), surface);
    let mut scene = RecordingScene::new();
    state.start(&mut scene, 0);

    let step_ms = torch_dash::frame_interval_ms().round() as u64;
    let mut pointer = surface.center();
    let mut taken_this_level = 0;
    let mut now = 0;

    while state.phase() == GamePhase::Playing && now < DEMO_LIMIT_MS {
        now += step_ms;

        // Aim so the cursor sprite (not the raw pointer) lands on the target
        let offset = state.interaction_point(Vec2::ZERO);
        let target = bot_target(&state, taken_this_level).map(|t| t - offset);
        if let Some(target) = target {
            let speed = BOT_SPEED.min(pointer.distance(target));
            pointer = torch_dash::step_toward(pointer, target, speed);
            pointer = surface.clamp(pointer, 0.0);
        }
        state.pointer(
            PointerEvent::Moved {
                x: pointer.x,
                y: pointer.y,
            },
            &mut scene,
        );

        for event in state.advance(&mut scene, now) {
            match event {
                GameEvent::CoinCollected { .. } => taken_this_level += 1,
                GameEvent::LevelCompleted { level, bonus } => {
                    log::info!("level {} cleared, bonus {}", level, bonus);
                    taken_this_level = 0;
                }
                GameEvent::TorchUpgraded { scale, score } => {
                    log::info!("torch {}x at score {}", scale, score);
                }
                GameEvent::GameEnded { result, final_score } => {
                    log::info!("{} (final score {})", result.message(), final_score);
                }
                other => log::debug!("{:?}", other),
            }
        }
    }

    if let Some(outcome) = state.session.outcome {
        println!("{}", outcome.result.message());
    } else {
        println!("Demo stopped after {}s", now / 1000);
    }
    println!("{}", serde_json::to_string_pretty(&state.hud())?);
    Ok(())
}

/// Nearest coin, or the key once enough coins are in the bag
#[cfg(not(target_arch = "wasm32"))]
fn bot_target(state: &GameState, taken: u32) -> Option<glam::Vec2> {
    let here = state.pointer.pos.unwrap_or_else(|| state.surface.center());
    let here = state.interaction_point(here);
    if taken >= BOT_COINS_PER_LEVEL {
        if let Some(key) = state.entities.keys().first() {
            return Some(key.pos);
        }
    }
    state
        .entities
        .coins()
        .iter()
        .map(|c| c.pos)
        .min_by(|a, b| here.distance(*a).total_cmp(&here.distance(*b)))
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser host drives the library directly
}
