/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Reset the player's per-tick ground flag
///   2. Aggregate this tick's contact events (block policy applied)
///   3. Player state machine update (intent + contacts)
///   4. Rule signals (killed / goal / lift / climb)
///
/// Contacts are collected in full before the state machine looks at them,
/// so a transition never sees a half-built or stale contact picture. The
/// resulting velocity intent is read back from the player by the physics
/// collaborator.

use crate::domain::entity::MoveIntent;
use crate::domain::player::PlayerSignal;
use crate::domain::sensor::{ContactEvent, ContactFrame};
use super::event::GameEvent;
use super::world::{push_transition, WorldState};

/// Everything the external layers hand the core for one tick.
#[derive(Clone, Debug, Default)]
pub struct TickInput {
    pub intent: MoveIntent,
    pub contacts: Vec<ContactEvent>,
    pub signals: Vec<PlayerSignal>,
}

impl TickInput {
    pub fn intent(intent: MoveIntent) -> Self {
        TickInput { intent, ..TickInput::default() }
    }

    pub fn with_contacts(mut self, contacts: Vec<ContactEvent>) -> Self {
        self.contacts = contacts;
        self
    }
}

pub fn step(world: &mut WorldState, input: TickInput) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    let level = &mut world.level;
    let id = level.player.id;

    level.player.machine.begin_tick();

    let frame = ContactFrame::collect(&input.contacts, |other| level.direction_of(other));
    log::trace!("tick {}: {} contacts -> {:?}", world.tick, input.contacts.len(), frame);

    let t = level.player.machine.update(input.intent, frame);
    push_transition(&mut events, id, t);

    for signal in input.signals {
        let t = level.player.machine.signal(signal);
        push_transition(&mut events, id, t);
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{AnimationKey, Direction, EntityId, Facing, PlayerState};
    use crate::domain::grid::{GridCoord, WorldPos};
    use crate::domain::level::{BlockSpec, LevelConfig, TowerConfig};
    use crate::domain::sensor::{BlockProbe, ContactPhase, PlayerProbe};
    use crate::sim::builder::{build_level, BuildSettings};

    fn world_with(blocks: Vec<BlockSpec>) -> WorldState {
        let cfg = LevelConfig {
            name: "step".into(),
            tile_count_height: 12,
            start_power: 20,
            player_start: GridCoord::new(2, 0),
            gates: vec![],
            hazards: vec![],
            floors: vec![GridCoord::new(2, 2)],
            blocks,
        };
        let settings = BuildSettings { tile_size: 32, floor_width: 17, fall_bias: 1.0 };
        WorldState::new(build_level(&cfg, settings).unwrap())
    }

    fn floor_id(world: &WorldState) -> EntityId {
        world
            .level
            .entities
            .iter()
            .find(|e| e.kind == crate::domain::entity::EntityKind::FloorSegment)
            .unwrap()
            .id
    }

    fn block_id(world: &WorldState) -> EntityId {
        world.level.entities.iter().find(|e| e.block().is_some()).unwrap().id
    }

    fn on_ground(world: &WorldState) -> Vec<ContactEvent> {
        vec![ContactEvent::new(PlayerProbe::Bottom, ContactPhase::Active, floor_id(world))]
    }

    fn start(world: &mut WorldState) {
        let id = world.player().id;
        world.on_animation_complete(id, AnimationKey::Start);
    }

    #[test]
    fn spawn_then_stand() {
        let mut world = world_with(vec![]);
        assert_eq!(world.player().machine.state(), PlayerState::Starting);
        assert_eq!(
            world.spawn_events(),
            vec![GameEvent::AnimationRequested { entity: world.player().id, key: AnimationKey::Start }]
        );

        // Ticks before the start animation completes change nothing.
        let contacts = on_ground(&world);
        let events = step(&mut world, TickInput::intent(MoveIntent::Right).with_contacts(contacts));
        assert!(events.is_empty());
        assert_eq!(world.player().machine.state(), PlayerState::Starting);

        start(&mut world);
        assert_eq!(world.player().machine.state(), PlayerState::Standing);
        assert_eq!(world.player().machine.facing(), Facing::Center);
        assert_eq!(world.power_text(), "POWER : 20");
    }

    #[test]
    fn walk_right_three_ticks_then_stop() {
        let mut world = world_with(vec![]);
        start(&mut world);

        let mut states = vec![world.player().machine.state()];
        for _ in 0..3 {
            let contacts = on_ground(&world);
            step(&mut world, TickInput::intent(MoveIntent::Right).with_contacts(contacts));
            states.push(world.player().machine.state());
            assert_eq!(world.player().machine.facing(), Facing::Right);
        }
        let contacts = on_ground(&world);
        step(&mut world, TickInput::intent(MoveIntent::None).with_contacts(contacts));
        states.push(world.player().machine.state());

        assert_eq!(states, vec![
            PlayerState::Standing,
            PlayerState::Walking,
            PlayerState::Walking,
            PlayerState::Walking,
            PlayerState::Standing,
        ]);
        assert_eq!(world.tick, 4);
    }

    #[test]
    fn stale_contacts_do_not_leak_into_next_tick() {
        let mut world = world_with(vec![]);
        start(&mut world);
        let contacts = on_ground(&world);
        step(&mut world, TickInput::intent(MoveIntent::None).with_contacts(contacts));
        assert!(world.player().machine.grounded_this_tick());

        let events = step(&mut world, TickInput::intent(MoveIntent::None));
        assert!(!world.player().machine.grounded_this_tick());
        assert_eq!(world.player().machine.state(), PlayerState::Falling);
        assert!(events.contains(&GameEvent::FallStart));
    }

    #[test]
    fn left_block_passes_through_upper_left_but_lands_on_upper_right() {
        let mut world = world_with(vec![BlockSpec { coord: GridCoord::new(4, 2), direction: Direction::Left }]);
        start(&mut world);
        let block = block_id(&world);

        // Step off into the air.
        step(&mut world, TickInput::intent(MoveIntent::None));
        assert_eq!(world.player().machine.state(), PlayerState::Falling);

        // Falling through the open quadrant: no ground.
        let through = vec![ContactEvent::on_block(
            PlayerProbe::Bottom, ContactPhase::Begin, block, BlockProbe::FrontUpper,
        )];
        step(&mut world, TickInput::default().with_contacts(through));
        assert_eq!(world.player().machine.state(), PlayerState::Falling);
        assert!(!world.player().machine.grounded_this_tick());

        // Landing on the solid upper-right quadrant.
        let onto = vec![ContactEvent::on_block(
            PlayerProbe::Bottom, ContactPhase::Begin, block, BlockProbe::BackUpper,
        )];
        let events = step(&mut world, TickInput::default().with_contacts(onto));
        assert_eq!(world.player().machine.state(), PlayerState::Standing);
        assert!(events.contains(&GameEvent::Landed));
    }

    #[test]
    fn landing_with_held_direction_still_reports_landed() {
        let mut world = world_with(vec![]);
        start(&mut world);
        step(&mut world, TickInput::intent(MoveIntent::Right));
        assert_eq!(world.player().machine.state(), PlayerState::Falling);

        let id = world.player().id;
        let contacts = on_ground(&world);
        let events = step(&mut world, TickInput::intent(MoveIntent::Right).with_contacts(contacts));
        assert_eq!(world.player().machine.state(), PlayerState::Walking);
        assert_eq!(&events[..3], &[
            GameEvent::StateChanged { entity: id, from: PlayerState::Falling, to: PlayerState::Standing },
            GameEvent::Landed,
            GameEvent::StateChanged { entity: id, from: PlayerState::Standing, to: PlayerState::Walking },
        ]);
    }

    #[test]
    fn tower_document_spawns_then_stands_centered() {
        let doc = r#"
            [[floors]]
            name = "scenario"
            height = 12
            indy = { x = 2, y = 0 }
            gates = []
            ivys = []
            floors = [{ x = 2, y = 2 }]
            blocks = []
        "#;
        let tower = TowerConfig::from_toml_str(doc, 20).unwrap();
        let settings = BuildSettings { tile_size: 32, floor_width: 17, fall_bias: 1.0 };
        let mut world = WorldState::new(build_level(tower.floor(0).unwrap(), settings).unwrap());
        assert_eq!(world.player().machine.state(), PlayerState::Starting);
        assert_eq!(world.player().pos, WorldPos::new(64.0, 32.0));

        let id = world.player().id;
        let events = world.on_animation_complete(id, AnimationKey::Start);
        assert!(events.contains(&GameEvent::StateChanged {
            entity: id,
            from: PlayerState::Starting,
            to: PlayerState::Standing,
        }));
        assert_eq!(world.player().machine.state(), PlayerState::Standing);
        assert_eq!(world.player().machine.facing(), Facing::Center);
        assert_eq!(world.power_text(), "POWER : 20");
    }

    #[test]
    fn killed_signal_is_terminal() {
        let mut world = world_with(vec![]);
        start(&mut world);
        let contacts = on_ground(&world);
        let mut input = TickInput::intent(MoveIntent::Left).with_contacts(contacts);
        input.signals.push(PlayerSignal::Killed);
        let events = step(&mut world, input);
        assert!(events.contains(&GameEvent::PlayerKilled));
        assert!(events.contains(&GameEvent::AnimationRequested {
            entity: world.player().id,
            key: AnimationKey::Dead(Facing::Left),
        }));

        let v = world.player().machine.velocity();
        for intent in [MoveIntent::Right, MoveIntent::None, MoveIntent::Left] {
            let events = step(&mut world, TickInput::intent(intent));
            assert!(events.is_empty());
            assert_eq!(world.player().machine.state(), PlayerState::Killed);
            assert_eq!(world.player().machine.velocity(), v);
        }
    }

    #[test]
    fn goal_via_world_signal() {
        let mut world = world_with(vec![]);
        start(&mut world);
        let events = world.signal(PlayerSignal::Goal);
        assert!(events.contains(&GameEvent::GoalReached));
        assert!(world.signal(PlayerSignal::Killed).is_empty());
    }

    #[test]
    fn view_lists_every_entity_once() {
        let world = world_with(vec![BlockSpec { coord: GridCoord::new(4, 2), direction: Direction::Right }]);
        let view = world.view();
        assert_eq!(view.len(), world.level.entities.len() + 1);
        assert!(view.iter().any(|v| v.key == "block_right"));
        assert_eq!(view.last().unwrap().key, "indy_start");
    }
}
