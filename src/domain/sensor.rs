/// Contact probes and per-tick contact aggregation.
///
/// ## Probes
///
/// The player carries three thin probes:
///   - `bottom`           just below the feet (ground contact)
///   - `leftSideBottom`   flanking the lower body on the left
///   - `rightSideBottom`  flanking the lower body on the right
///
/// A directional block carries four quadrant probes, named relative to
/// the block's facing: front-upper, front-lower, back-upper, back-lower.
///
/// Probes never impede motion. The physics collaborator evaluates them and
/// reports `ContactEvent`s tagged with the probe labels involved.
///
/// ## Aggregation
///
/// `ContactFrame` is rebuilt every tick: reset, then fold in every event
/// of the tick. Flags only ever go from false to true within a tick, so
/// duplicate contacts collapse.

use std::fmt;

use super::entity::{Direction, EntityId};
use super::grid::{Rect, WorldPos};
use super::policy::{ContactClass, DirectionalBlockPolicy};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub enum PlayerProbe {
    Bottom,
    LeftSideBottom,
    RightSideBottom,
}

/// Block quadrant probe, relative to the block's facing.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub enum BlockProbe {
    FrontUpper,
    FrontLower,
    BackUpper,
    BackLower,
}

/// Absolute quadrant of a block in world space (y-down).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Quadrant {
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

impl BlockProbe {
    pub const ALL: [BlockProbe; 4] = [
        BlockProbe::FrontUpper,
        BlockProbe::FrontLower,
        BlockProbe::BackUpper,
        BlockProbe::BackLower,
    ];

    /// Where this probe sits for a block facing `direction`.
    pub fn quadrant(self, direction: Direction) -> Quadrant {
        let front_is_left = direction == Direction::Left;
        let left = match self {
            BlockProbe::FrontUpper | BlockProbe::FrontLower => front_is_left,
            BlockProbe::BackUpper | BlockProbe::BackLower => !front_is_left,
        };
        let upper = matches!(self, BlockProbe::FrontUpper | BlockProbe::BackUpper);
        match (upper, left) {
            (true, true) => Quadrant::UpperLeft,
            (true, false) => Quadrant::UpperRight,
            (false, true) => Quadrant::LowerLeft,
            (false, false) => Quadrant::LowerRight,
        }
    }

    /// Inverse of [`BlockProbe::quadrant`].
    pub fn at(quadrant: Quadrant, direction: Direction) -> BlockProbe {
        Self::ALL
            .into_iter()
            .find(|p| p.quadrant(direction) == quadrant)
            .unwrap_or(BlockProbe::BackLower)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ProbeLabel {
    Player(PlayerProbe),
    Block(BlockProbe),
}

impl ProbeLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            ProbeLabel::Player(PlayerProbe::Bottom) => "bottom",
            ProbeLabel::Player(PlayerProbe::LeftSideBottom) => "leftSideBottom",
            ProbeLabel::Player(PlayerProbe::RightSideBottom) => "rightSideBottom",
            ProbeLabel::Block(BlockProbe::FrontUpper) => "frontUpper",
            ProbeLabel::Block(BlockProbe::FrontLower) => "frontLower",
            ProbeLabel::Block(BlockProbe::BackUpper) => "backUpper",
            ProbeLabel::Block(BlockProbe::BackLower) => "backLower",
        }
    }
}

impl fmt::Display for ProbeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labeled sensor zone, positioned relative to its owner's center.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Sensor {
    pub label: ProbeLabel,
    pub offset: WorldPos,
    pub half_w: f64,
    pub half_h: f64,
}

impl Sensor {
    /// World rectangle of this sensor for an owner centered at `owner`.
    pub fn rect_at(&self, owner: WorldPos) -> Rect {
        Rect::new(owner.offset(self.offset.x, self.offset.y), self.half_w, self.half_h)
    }
}

/// Probe thickness for a given tile size.
fn probe_thickness(tile_size: f64) -> f64 {
    (tile_size / 16.0).max(1.0)
}

/// The player's three probes for a body of `body_w × tile_size`.
pub fn player_sensors(tile_size: f64, body_w: f64) -> Vec<Sensor> {
    let t = tile_size;
    let th = probe_thickness(t);
    let half_body = body_w / 2.0;
    vec![
        Sensor {
            label: ProbeLabel::Player(PlayerProbe::Bottom),
            offset: WorldPos::new(0.0, t / 2.0 + th / 2.0),
            half_w: half_body - th,
            half_h: th / 2.0,
        },
        Sensor {
            label: ProbeLabel::Player(PlayerProbe::LeftSideBottom),
            offset: WorldPos::new(-half_body - th / 2.0, t / 4.0),
            half_w: th / 2.0,
            half_h: t / 4.0 - th,
        },
        Sensor {
            label: ProbeLabel::Player(PlayerProbe::RightSideBottom),
            offset: WorldPos::new(half_body + th / 2.0, t / 4.0),
            half_w: th / 2.0,
            half_h: t / 4.0 - th,
        },
    ]
}

/// The four quadrant probes of a directional block.
pub fn block_sensors(tile_size: f64, direction: Direction) -> Vec<Sensor> {
    let q = tile_size / 4.0;
    BlockProbe::ALL
        .into_iter()
        .map(|probe| {
            let (dx, dy) = match probe.quadrant(direction) {
                Quadrant::UpperLeft => (-q, -q),
                Quadrant::UpperRight => (q, -q),
                Quadrant::LowerLeft => (-q, q),
                Quadrant::LowerRight => (q, q),
            };
            Sensor {
                label: ProbeLabel::Block(probe),
                offset: WorldPos::new(dx, dy),
                half_w: q,
                half_h: q,
            }
        })
        .collect()
}

// ── Contact events ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ContactPhase {
    Begin,
    Active,
    End,
}

/// One contact reported by the physics collaborator for the current tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ContactEvent {
    /// The player probe involved.
    pub probe: PlayerProbe,
    pub phase: ContactPhase,
    /// The entity touched.
    pub other: EntityId,
    /// Set when `other` is a directional block: which of its probes was hit.
    pub other_probe: Option<BlockProbe>,
}

impl ContactEvent {
    pub fn new(probe: PlayerProbe, phase: ContactPhase, other: EntityId) -> Self {
        ContactEvent { probe, phase, other, other_probe: None }
    }

    pub fn on_block(probe: PlayerProbe, phase: ContactPhase, block: EntityId, quadrant: BlockProbe) -> Self {
        ContactEvent { probe, phase, other: block, other_probe: Some(quadrant) }
    }
}

/// What the tick knows about the player's contacts, rebuilt every tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ContactFrame {
    pub grounded: bool,
    pub blocked_left: bool,
    pub blocked_right: bool,
}

impl ContactFrame {
    /// Fold a tick's contact events into a fresh frame.
    ///
    /// `direction_of` resolves a block id to its orientation; `None` means
    /// the other entity is not a directional block.
    pub fn collect<F>(events: &[ContactEvent], direction_of: F) -> ContactFrame
    where
        F: Fn(EntityId) -> Option<Direction>,
    {
        let mut frame = ContactFrame::default();
        for ev in events {
            frame.apply(ev, &direction_of);
        }
        frame
    }

    /// Fold one event in. Ended contacts and pass-through block quadrants
    /// are ignored.
    pub fn apply<F>(&mut self, ev: &ContactEvent, direction_of: &F)
    where
        F: Fn(EntityId) -> Option<Direction>,
    {
        if ev.phase == ContactPhase::End {
            return;
        }
        if let (Some(direction), Some(quadrant)) = (direction_of(ev.other), ev.other_probe) {
            if DirectionalBlockPolicy::new(direction).classify(quadrant) == ContactClass::PassThrough {
                log::trace!("{:?} on pass-through {:?} of {:?}", ev.probe, quadrant, ev.other);
                return;
            }
        }
        match ev.probe {
            PlayerProbe::Bottom => self.grounded = true,
            PlayerProbe::LeftSideBottom => self.blocked_left = true,
            PlayerProbe::RightSideBottom => self.blocked_right = true,
        }
    }
}
