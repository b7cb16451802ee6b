/// Entities placed on a floor: Wall, FloorSegment, Block, Hazard, Gate, Player.
///
/// Entities are plain data. Engine-facing capabilities (placement,
/// sensors, animation) are exposed through the small traits at the bottom
/// of this file so adapters at the system boundary never need to know the
/// concrete variant.

use std::fmt;

use super::grid::{Rect, WorldPos};
use super::sensor::Sensor;
use crate::error::{ConfigError, ConfigResult};

/// Facing of a character. `Center` is the spawn facing before any input.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Facing {
    Left,
    Right,
    #[default]
    Center,
}

impl Facing {
    /// Sprite side used for animation keys. `Center` uses the right-facing set.
    pub fn sprite_side(self) -> &'static str {
        match self {
            Facing::Left => "left",
            Facing::Right | Facing::Center => "right",
        }
    }

    /// Signed unit of horizontal motion toward this facing.
    pub fn unit(self) -> f64 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
            Facing::Center => 0.0,
        }
    }
}

/// Orientation of a directional block. Exactly two values.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Parse the tower-document token (`"left"` / `"right"`).
    pub fn from_token(token: &str) -> ConfigResult<Self> {
        match token {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(ConfigError::InvalidDirection { token: other.to_string() }),
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// Player movement state.
///
/// `Starting` is the spawn state; `Killed` and `Goal` are terminal.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayerState {
    Starting,
    Standing,
    Walking,
    Falling,
    Lifting,
    Lifted,
    Criming,
    Killed,
    Goal,
}

impl PlayerState {
    /// Does the per-tick update run at all in this state?
    #[inline]
    pub fn is_active(self) -> bool {
        !matches!(self, PlayerState::Starting | PlayerState::Killed | PlayerState::Goal)
    }

    /// Are directional intents accepted in this state?
    #[inline]
    pub fn is_walkable(self) -> bool {
        matches!(self, PlayerState::Standing | PlayerState::Walking)
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, PlayerState::Killed | PlayerState::Goal)
    }
}

/// Directional intent for one tick. Mutually exclusive by construction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum MoveIntent {
    Left,
    Right,
    #[default]
    None,
}

impl MoveIntent {
    /// Collapse raw held-key flags. Left wins when both are held.
    pub fn from_held(left: bool, right: bool) -> Self {
        if left {
            MoveIntent::Left
        } else if right {
            MoveIntent::Right
        } else {
            MoveIntent::None
        }
    }

    pub fn facing(self) -> Option<Facing> {
        match self {
            MoveIntent::Left => Some(Facing::Left),
            MoveIntent::Right => Some(Facing::Right),
            MoveIntent::None => None,
        }
    }
}

/// Animation a character can be asked to play.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimationKey {
    Start,
    Stand(Facing),
    Fall(Facing),
    Dead(Facing),
    Lift(Facing),
    Lifted(Facing),
    Up,
}

impl AnimationKey {
    /// Asset key understood by the animation collaborator.
    pub fn key(self) -> String {
        match self {
            AnimationKey::Start => "indy_start".to_string(),
            AnimationKey::Up => "indy_up".to_string(),
            AnimationKey::Stand(f) => format!("indy_{}_stand", f.sprite_side()),
            AnimationKey::Fall(f) => format!("indy_{}_fall", f.sprite_side()),
            AnimationKey::Dead(f) => format!("indy_{}_dead", f.sprite_side()),
            AnimationKey::Lift(f) => format!("indy_{}_lift", f.sprite_side()),
            AnimationKey::Lifted(f) => format!("indy_{}_lifted", f.sprite_side()),
        }
    }

    /// Two keys name the same clip when their asset keys match
    /// (`Center` and `Right` share sprites).
    pub fn same_clip(self, other: AnimationKey) -> bool {
        self.key() == other.key()
    }
}

impl fmt::Display for AnimationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Stable identity of a placed entity (index into the build order).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct EntityId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WallKind {
    Side,
    Ceiling,
    /// Bottom perimeter row; hazardous to touch.
    Needle,
}

/// Static directional block.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockEntity {
    pub direction: Direction,
    pub sensors: Vec<Sensor>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EntityKind {
    Wall(WallKind),
    FloorSegment,
    Block(BlockEntity),
    Hazard,
    Gate,
    Player,
}

impl EntityKind {
    /// Does this entity stop bodies? Blocks are refined per quadrant by
    /// the block policy.
    pub fn is_solid(&self) -> bool {
        matches!(self, EntityKind::Wall(_) | EntityKind::FloorSegment | EntityKind::Block(_))
    }
}

/// A static placed entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: WorldPos,
    pub extent: f64,
}

impl Entity {
    pub fn block(&self) -> Option<&BlockEntity> {
        match &self.kind {
            EntityKind::Block(b) => Some(b),
            _ => None,
        }
    }
}

// ── Capabilities ──

/// Anything with a world position and a square display extent.
pub trait Placeable {
    fn id(&self) -> EntityId;
    fn position(&self) -> WorldPos;
    fn extent(&self) -> f64;

    fn bounds(&self) -> Rect {
        Rect::square(self.position(), self.extent())
    }
}

/// Anything carrying named contact probes.
pub trait HasSensors {
    fn sensors(&self) -> &[Sensor];
}

/// Anything the renderer can show by texture or animation key.
pub trait Animatable {
    fn animation_key(&self) -> String;
}

impl Placeable for Entity {
    fn id(&self) -> EntityId { self.id }
    fn position(&self) -> WorldPos { self.pos }
    fn extent(&self) -> f64 { self.extent }
}

impl HasSensors for Entity {
    fn sensors(&self) -> &[Sensor] {
        match &self.kind {
            EntityKind::Block(b) => &b.sensors,
            _ => &[],
        }
    }
}

impl Animatable for Entity {
    fn animation_key(&self) -> String {
        match &self.kind {
            EntityKind::Wall(WallKind::Needle) => "needle".to_string(),
            EntityKind::Wall(_) => "sidewall".to_string(),
            EntityKind::FloorSegment => "floor".to_string(),
            EntityKind::Block(b) => format!("block_{}", b.direction.token()),
            EntityKind::Hazard => "ivy".to_string(),
            EntityKind::Gate => "gate".to_string(),
            EntityKind::Player => "indy_start".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [PlayerState; 9] = [
        PlayerState::Starting,
        PlayerState::Standing,
        PlayerState::Walking,
        PlayerState::Falling,
        PlayerState::Lifting,
        PlayerState::Lifted,
        PlayerState::Criming,
        PlayerState::Killed,
        PlayerState::Goal,
    ];

    #[test]
    fn active_and_walkable_tables() {
        let active: Vec<_> = ALL.iter().filter(|s| s.is_active()).copied().collect();
        assert_eq!(active, vec![
            PlayerState::Standing,
            PlayerState::Walking,
            PlayerState::Falling,
            PlayerState::Lifting,
            PlayerState::Lifted,
            PlayerState::Criming,
        ]);
        let walkable: Vec<_> = ALL.iter().filter(|s| s.is_walkable()).copied().collect();
        assert_eq!(walkable, vec![PlayerState::Standing, PlayerState::Walking]);
    }

    #[test]
    fn left_beats_right() {
        assert_eq!(MoveIntent::from_held(true, true), MoveIntent::Left);
        assert_eq!(MoveIntent::from_held(false, true), MoveIntent::Right);
        assert_eq!(MoveIntent::from_held(false, false), MoveIntent::None);
    }

    #[test]
    fn direction_tokens() {
        assert_eq!(Direction::from_token("left").unwrap(), Direction::Left);
        assert_eq!(Direction::from_token("right").unwrap(), Direction::Right);
        assert!(Direction::from_token("Left").is_err());
        assert!(Direction::from_token("").is_err());
    }

    #[test]
    fn animation_keys() {
        assert_eq!(AnimationKey::Start.key(), "indy_start");
        assert_eq!(AnimationKey::Fall(Facing::Left).key(), "indy_left_fall");
        assert_eq!(AnimationKey::Stand(Facing::Center).key(), "indy_right_stand");
        assert!(AnimationKey::Stand(Facing::Center).same_clip(AnimationKey::Stand(Facing::Right)));
        assert!(!AnimationKey::Stand(Facing::Left).same_clip(AnimationKey::Fall(Facing::Left)));
    }
}
