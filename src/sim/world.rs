/// WorldState: the running simulation of one floor.
///
/// Owns the placed level and the tick counter. Whoever drives the frame
/// clock holds the `WorldState` directly and reads the player, entity
/// views and HUD text from it; there is no broadcast channel.
///
/// ## Output surface
///   - `power_text()`  HUD line for the player's power
///   - `view()`        (id, texture/animation key, world position) per entity
///   - `player().machine.velocity()` the velocity intent for the physics layer

use crate::domain::entity::{Animatable, AnimationKey, EntityId, Placeable, PlayerState};
use crate::domain::grid::WorldPos;
use crate::domain::player::{PlayerEntity, PlayerSignal, Transition};
use super::builder::Level;
use super::event::GameEvent;

/// One renderable entity for the presentation layer.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityView {
    pub id: EntityId,
    pub key: String,
    pub pos: WorldPos,
}

pub struct WorldState {
    pub level: Level,
    pub tick: u64,
}

impl WorldState {
    pub fn new(level: Level) -> Self {
        WorldState { level, tick: 0 }
    }

    /// Events to hand to the animation collaborator when the level starts.
    pub fn spawn_events(&self) -> Vec<GameEvent> {
        vec![GameEvent::AnimationRequested {
            entity: self.level.player.id,
            key: AnimationKey::Start,
        }]
    }

    pub fn player(&self) -> &PlayerEntity {
        &self.level.player
    }

    pub fn player_mut(&mut self) -> &mut PlayerEntity {
        &mut self.level.player
    }

    pub fn power_text(&self) -> String {
        self.level.player.machine.power_text()
    }

    pub fn view(&self) -> Vec<EntityView> {
        let mut out: Vec<EntityView> = self
            .level
            .entities
            .iter()
            .map(|e| EntityView { id: e.id, key: e.animation_key(), pos: e.position() })
            .collect();
        let p = &self.level.player;
        out.push(EntityView { id: p.id, key: p.animation_key(), pos: p.position() });
        out
    }

    /// The animation collaborator reports a finished clip on `entity`.
    pub fn on_animation_complete(&mut self, entity: EntityId, key: AnimationKey) -> Vec<GameEvent> {
        let mut events = vec![];
        if entity != self.level.player.id {
            return events;
        }
        let t = self.level.player.machine.on_animation_complete(key);
        push_transition(&mut events, entity, t);
        events
    }

    /// Raise a rule signal (hazard contact, goal, lift, climb).
    pub fn signal(&mut self, signal: PlayerSignal) -> Vec<GameEvent> {
        let mut events = vec![];
        let id = self.level.player.id;
        let t = self.level.player.machine.signal(signal);
        push_transition(&mut events, id, t);
        events
    }
}

/// Translate a state-machine transition into presentation events.
pub(crate) fn push_transition(events: &mut Vec<GameEvent>, entity: EntityId, t: Transition) {
    for (from, to) in t.changes {
        events.push(GameEvent::StateChanged { entity, from, to });
        match (from, to) {
            (_, PlayerState::Falling) => events.push(GameEvent::FallStart),
            (PlayerState::Falling, PlayerState::Standing) => events.push(GameEvent::Landed),
            (_, PlayerState::Killed) => events.push(GameEvent::PlayerKilled),
            (_, PlayerState::Goal) => events.push(GameEvent::GoalReached),
            _ => {}
        }
    }
    for key in t.animations {
        log::debug!("{entity:?} requests {key}");
        events.push(GameEvent::AnimationRequested { entity, key });
    }
}
