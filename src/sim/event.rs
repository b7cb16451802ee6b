/// Events emitted during a simulation step.
/// The presentation layer consumes these for animation playback and HUD.

use crate::domain::entity::{AnimationKey, EntityId, PlayerState};

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    StateChanged { entity: EntityId, from: PlayerState, to: PlayerState },
    AnimationRequested { entity: EntityId, key: AnimationKey },
    FallStart,
    Landed,
    PlayerKilled,
    GoalReached,
}
