/// Entry point and game loop.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use indytower::config::GameConfig;
use indytower::domain::entity::{EntityKind, PlayerState, WallKind};
use indytower::domain::player::PlayerSignal;
use indytower::sim::arcade::{touching, ArcadePhysics};
use indytower::sim::builder::load_floor;
use indytower::sim::event::GameEvent;
use indytower::sim::step::{step, TickInput};
use indytower::sim::world::WorldState;
use indytower::ui::anim::AnimationClock;
use indytower::ui::input::InputState;
use indytower::ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() -> ExitCode {
    env_logger::init();
    let config = GameConfig::load();

    // An explicit tower path on the command line wins over config.toml.
    let tower = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| config.tower.clone());

    let level = match load_floor(&tower, &config) {
        Ok(level) => level,
        Err(e) => {
            log::error!("level load failed: {e}");
            eprintln!("Could not load {}: {e}", tower.display());
            return ExitCode::FAILURE;
        }
    };
    let mut world = WorldState::new(level);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return ExitCode::FAILURE;
    }

    let result = game_loop(&mut world, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    if let Err(e) = result {
        eprintln!("Game error: {e}");
        return ExitCode::FAILURE;
    }

    println!();
    match world.player().machine.state() {
        PlayerState::Goal => println!("{}: cleared!", world.level.name),
        PlayerState::Killed => println!("{}: caught by the needles.", world.level.name),
        _ => println!("{}: left after {} ticks.", world.level.name, world.tick),
    }
    ExitCode::SUCCESS
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::with_release(renderer.reports_key_release());
    let mut physics = ArcadePhysics::from_config(&config.physics);
    let mut clock = AnimationClock::new(config.animation.frame_ticks);
    let tick_rate = Duration::from_millis(config.sim.tick_rate_ms);
    let mut last_tick = Instant::now();

    dispatch(&mut clock, &world.spawn_events());

    loop {
        kb.drain_events();
        if kb.quit_requested() {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            // Physics reports the contacts of the previous intent, then the
            // core decides the next one.
            let contacts = physics.advance(&mut world.level);
            let mut input = TickInput::intent(kb.intent()).with_contacts(contacts);
            input.signals = rule_signals(world);
            let events = step(world, input);
            dispatch(&mut clock, &events);

            for (entity, key) in clock.tick() {
                let events = world.on_animation_complete(entity, key);
                dispatch(&mut clock, &events);
            }
            last_tick = Instant::now();
        }

        renderer.render(world, banner(world))?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Game rules that live outside the movement model: needles kill, gates
/// finish the floor.
fn rule_signals(world: &WorldState) -> Vec<PlayerSignal> {
    let mut signals = vec![];
    if touching(&world.level, |k| *k == EntityKind::Wall(WallKind::Needle)) {
        signals.push(PlayerSignal::Killed);
    }
    if touching(&world.level, |k| *k == EntityKind::Gate) {
        signals.push(PlayerSignal::Goal);
    }
    signals
}

fn dispatch(clock: &mut AnimationClock, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::AnimationRequested { entity, key } => clock.play(*entity, *key),
            GameEvent::PlayerKilled => log::info!("player killed"),
            GameEvent::GoalReached => log::info!("goal reached"),
            _ => {}
        }
    }
}

fn banner(world: &WorldState) -> Option<&'static str> {
    match world.player().machine.state() {
        PlayerState::Killed => Some(" CAUGHT BY THE NEEDLES   [Q] quit "),
        PlayerState::Goal => Some(" FLOOR CLEARED!   [Q] quit "),
        _ => None,
    }
}
