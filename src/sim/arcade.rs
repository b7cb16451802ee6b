/// Reference arcade physics: a small kinematic AABB integrator.
///
/// ## Motion
///
///   dx = vx * walk_speed
///   dy = fall speed, which grows by `gravity * vy` per tick while the
///        downward bias is set (clamped to `max_fall_speed`) and resets
///        to 0 as soon as the bias is cleared
///
/// X is resolved first, then Y, each against the solid rectangles of the
/// level: walls, floor segments, and the solid quadrants of directional
/// blocks. A block's pass-through quadrant never impedes motion.
///
/// ## Contacts
///
/// After moving, every player probe is tested against every solid entity
/// (per quadrant for blocks). The overlap set is diffed against last
/// tick's set:
///
///   new       → Begin
///   still     → Active
///   gone      → End

use std::collections::BTreeSet;

use crate::config::PhysicsConfig;
use crate::domain::entity::{Entity, EntityId, EntityKind};
use crate::domain::grid::Rect;
use crate::domain::policy::DirectionalBlockPolicy;
use crate::domain::sensor::{
    BlockProbe, ContactEvent, ContactPhase, PlayerProbe, ProbeLabel,
};
use super::builder::Level;

type ContactKey = (PlayerProbe, EntityId, Option<BlockProbe>);

#[derive(Clone, Debug)]
pub struct ArcadePhysics {
    pub walk_speed: f64,
    pub gravity: f64,
    pub max_fall_speed: f64,
    fall_speed: f64,
    prev: BTreeSet<ContactKey>,
}

impl ArcadePhysics {
    pub fn new(walk_speed: f64, gravity: f64, max_fall_speed: f64) -> Self {
        ArcadePhysics {
            walk_speed,
            gravity,
            max_fall_speed,
            fall_speed: 0.0,
            prev: BTreeSet::new(),
        }
    }

    pub fn from_config(cfg: &PhysicsConfig) -> Self {
        Self::new(cfg.walk_speed, cfg.gravity, cfg.max_fall_speed)
    }

    pub fn fall_speed(&self) -> f64 {
        self.fall_speed
    }

    /// Move the player by its velocity intent, then report contacts.
    pub fn advance(&mut self, level: &mut Level) -> Vec<ContactEvent> {
        let v = level.player.machine.velocity();
        let dx = v.x * self.walk_speed;
        if v.y > 0.0 {
            self.fall_speed = (self.fall_speed + self.gravity * v.y).min(self.max_fall_speed);
        } else {
            self.fall_speed = 0.0;
        }
        let dy = self.fall_speed;

        let solids = solid_rects(&level.entities);
        let body = level.player.body();
        let (nx, ny) = resolve(body, dx, dy, &solids);
        level.player.pos.x = nx;
        level.player.pos.y = ny;

        let current = probe_overlaps(level);
        let mut events = Vec::with_capacity(current.len() + self.prev.len());
        for &(probe, other, other_probe) in &current {
            let phase = if self.prev.contains(&(probe, other, other_probe)) {
                ContactPhase::Active
            } else {
                ContactPhase::Begin
            };
            events.push(ContactEvent { probe, phase, other, other_probe });
        }
        for &(probe, other, other_probe) in self.prev.difference(&current) {
            events.push(ContactEvent { probe, phase: ContactPhase::End, other, other_probe });
        }
        self.prev = current;
        events
    }
}

/// Every (player probe, solid entity, block quadrant) pair overlapping now.
fn probe_overlaps(level: &Level) -> BTreeSet<ContactKey> {
    let mut out = BTreeSet::new();
    let owner = level.player.pos;
    for sensor in &level.player.sensors {
        let probe = match sensor.label {
            ProbeLabel::Player(p) => p,
            ProbeLabel::Block(_) => continue,
        };
        let zone = sensor.rect_at(owner);
        for e in level.entities.iter().filter(|e| e.kind.is_solid()) {
            match e.block() {
                Some(block) => {
                    for s in &block.sensors {
                        if let ProbeLabel::Block(q) = s.label {
                            if zone.overlaps(&s.rect_at(e.pos)) {
                                out.insert((probe, e.id, Some(q)));
                            }
                        }
                    }
                }
                None => {
                    if zone.overlaps(&Rect::square(e.pos, e.extent)) {
                        out.insert((probe, e.id, None));
                    }
                }
            }
        }
    }
    out
}

/// Solid collision rectangles: whole tiles, or the solid quadrants of a
/// directional block.
fn solid_rects(entities: &[Entity]) -> Vec<Rect> {
    let mut out = Vec::with_capacity(entities.len());
    for e in entities.iter().filter(|e| e.kind.is_solid()) {
        match e.block() {
            Some(block) => {
                let policy = DirectionalBlockPolicy::new(block.direction);
                for s in &block.sensors {
                    if let ProbeLabel::Block(q) = s.label {
                        if policy.is_solid(q.quadrant(block.direction)) {
                            out.push(s.rect_at(e.pos));
                        }
                    }
                }
            }
            None => out.push(Rect::square(e.pos, e.extent)),
        }
    }
    out
}

/// Sweep-free axis separation: move along x, push out; then along y.
fn resolve(body: Rect, dx: f64, dy: f64, solids: &[Rect]) -> (f64, f64) {
    let mut r = body.translated(dx, 0.0);
    for s in solids {
        if !r.overlaps(s) {
            continue;
        }
        if dx > 0.0 {
            r.center.x = s.left() - r.half_w;
        } else if dx < 0.0 {
            r.center.x = s.right() + r.half_w;
        }
    }

    r = r.translated(0.0, dy);
    for s in solids {
        if !r.overlaps(s) {
            continue;
        }
        if dy > 0.0 {
            r.center.y = s.top() - r.half_h;
        } else if dy < 0.0 {
            r.center.y = s.bottom() + r.half_h;
        }
    }
    (r.center.x, r.center.y)
}

/// Does any part of the player (body or probe) overlap an entity matching
/// `pred`? Used by the harness for needle and gate rules.
pub fn touching(level: &Level, pred: impl Fn(&EntityKind) -> bool) -> bool {
    let p = &level.player;
    let mut zones = vec![p.body()];
    zones.extend(p.sensors.iter().map(|s| s.rect_at(p.pos)));
    level
        .entities
        .iter()
        .filter(|e| pred(&e.kind))
        .any(|e| {
            let r = Rect::square(e.pos, e.extent);
            zones.iter().any(|z| z.overlaps(&r))
        })
}
