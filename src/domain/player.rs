/// Player state machine.
///
/// ## Transition table
///
/// ┌───────────────────┬──────────────────────────┬──────────┬──────────────────────────────┐
/// │ From              │ Trigger                  │ To       │ Side effect                  │
/// ├───────────────────┼──────────────────────────┼──────────┼──────────────────────────────┤
/// │ Starting          │ start anim complete      │ Standing │                              │
/// │ Standing/Walking  │ left/right intent        │ Walking  │ facing, vx = ±1              │
/// │ Walking           │ no intent                │ Standing │ vx = 0                       │
/// │ Standing/Walking  │ not grounded             │ Falling  │ vx = 0, fall anim            │
/// │ Falling           │ grounded                 │ Standing │ stand anim                   │
/// │ Standing/Walking  │ Lift signal              │ Lifting  │ lift anim, pending → Lifted  │
/// │ Lifted            │ Climb signal             │ Criming  │ up anim, pending → Standing  │
/// │ any non-terminal  │ Killed signal            │ Killed   │ v = 0, dead anim             │
/// │ any non-terminal  │ Goal signal              │ Goal     │ v = 0                        │
/// └───────────────────┴──────────────────────────┴──────────┴──────────────────────────────┘
///
/// Anything else is a no-op. While active and not grounded the vertical
/// intent carries a small downward bias so external gravity can act; it is
/// cleared on a grounded tick. Facing only changes on a directional intent.
///
/// Animation-driven transitions sit in a single pending slot that is
/// resolved by `on_animation_complete`. The slot is not cleared when the
/// player dies or reaches the goal; it still fires once, but terminal
/// states absorb the transition it carries.

use super::entity::{Animatable, AnimationKey, EntityId, Facing, HasSensors, MoveIntent, Placeable, PlayerState};
use super::grid::{Rect, WorldPos};
use super::sensor::{ContactFrame, Sensor};

/// Velocity the player wants this tick, in unit terms. The physics
/// collaborator scales it.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct VelocityIntent {
    pub x: f64,
    pub y: f64,
}

impl VelocityIntent {
    pub const ZERO: VelocityIntent = VelocityIntent { x: 0.0, y: 0.0 };
}

/// A transition waiting on an animation to finish.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PendingTransition {
    pub on: AnimationKey,
    pub to: PlayerState,
}

/// Signals raised by game rules outside the movement model.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlayerSignal {
    Killed,
    Goal,
    Lift,
    Climb,
}

/// Output of a single update: every state change in order, and what to play.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transition {
    pub changes: Vec<(PlayerState, PlayerState)>,
    pub animations: Vec<AnimationKey>,
}

impl Transition {
    fn record(&mut self, from: PlayerState, to: PlayerState) {
        self.changes.push((from, to));
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.animations.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayerStateMachine {
    state: PlayerState,
    facing: Facing,
    power: i32,
    grounded_this_tick: bool,
    velocity: VelocityIntent,
    pending: Option<PendingTransition>,
    fall_bias: f64,
}

impl PlayerStateMachine {
    /// Spawn in `Starting`, waiting on the start animation.
    pub fn spawn(power: i32, fall_bias: f64) -> Self {
        PlayerStateMachine {
            state: PlayerState::Starting,
            facing: Facing::Center,
            power,
            grounded_this_tick: false,
            velocity: VelocityIntent::ZERO,
            pending: Some(PendingTransition { on: AnimationKey::Start, to: PlayerState::Standing }),
            fall_bias,
        }
    }

    pub fn state(&self) -> PlayerState { self.state }
    pub fn facing(&self) -> Facing { self.facing }
    pub fn power(&self) -> i32 { self.power }
    pub fn velocity(&self) -> VelocityIntent { self.velocity }
    pub fn grounded_this_tick(&self) -> bool { self.grounded_this_tick }
    pub fn pending(&self) -> Option<PendingTransition> { self.pending }

    pub fn is_active(&self) -> bool { self.state.is_active() }
    pub fn is_walkable(&self) -> bool { self.state.is_walkable() }

    /// Power is owned by game rules; the movement model only carries it.
    pub fn set_power(&mut self, power: i32) {
        self.power = power;
    }

    /// HUD text for the power resource.
    pub fn power_text(&self) -> String {
        format!("POWER : {}", self.power)
    }

    /// Animation that matches the current state and facing.
    pub fn current_animation(&self) -> AnimationKey {
        let f = self.facing;
        match self.state {
            PlayerState::Starting => AnimationKey::Start,
            PlayerState::Standing | PlayerState::Walking | PlayerState::Goal => AnimationKey::Stand(f),
            PlayerState::Falling => AnimationKey::Fall(f),
            PlayerState::Lifting => AnimationKey::Lift(f),
            PlayerState::Lifted => AnimationKey::Lifted(f),
            PlayerState::Criming => AnimationKey::Up,
            PlayerState::Killed => AnimationKey::Dead(f),
        }
    }

    // ── Tick protocol ──

    /// Tick start: forget last tick's ground contact.
    pub fn begin_tick(&mut self) {
        self.grounded_this_tick = false;
    }

    /// Apply this tick's aggregated contacts and the directional intent.
    pub fn update(&mut self, intent: MoveIntent, contacts: ContactFrame) -> Transition {
        let mut out = Transition::default();
        if contacts.grounded {
            self.grounded_this_tick = true;
        }
        if !self.is_active() {
            return out;
        }

        // Vertical: bias downward until ground is confirmed.
        if self.grounded_this_tick {
            self.velocity.y = 0.0;
            if self.state == PlayerState::Falling {
                self.enter(PlayerState::Standing, &mut out);
                out.animations.push(AnimationKey::Stand(self.facing));
            }
        } else {
            self.velocity.y = self.fall_bias;
            if self.is_walkable() {
                self.velocity.x = 0.0;
                self.enter(PlayerState::Falling, &mut out);
                out.animations.push(AnimationKey::Fall(self.facing));
            }
        }

        // Horizontal: only while walkable.
        if self.is_walkable() {
            match intent.facing() {
                Some(facing) => {
                    if facing != self.facing {
                        self.facing = facing;
                        out.animations.push(AnimationKey::Stand(facing));
                    }
                    let blocked = match facing {
                        Facing::Left => contacts.blocked_left,
                        Facing::Right => contacts.blocked_right,
                        Facing::Center => false,
                    };
                    self.velocity.x = if blocked { 0.0 } else { facing.unit() };
                    self.enter(PlayerState::Walking, &mut out);
                }
                None => {
                    self.velocity.x = 0.0;
                    if self.state == PlayerState::Walking {
                        self.enter(PlayerState::Standing, &mut out);
                    }
                }
            }
        }

        out
    }

    /// Apply a rule signal. Terminal states ignore everything.
    pub fn signal(&mut self, signal: PlayerSignal) -> Transition {
        let mut out = Transition::default();
        if self.state.is_terminal() {
            return out;
        }
        match signal {
            PlayerSignal::Killed => {
                self.velocity = VelocityIntent::ZERO;
                self.enter(PlayerState::Killed, &mut out);
                out.animations.push(AnimationKey::Dead(self.facing));
            }
            PlayerSignal::Goal => {
                self.velocity = VelocityIntent::ZERO;
                self.enter(PlayerState::Goal, &mut out);
            }
            PlayerSignal::Lift if self.is_walkable() => {
                self.velocity.x = 0.0;
                self.enter(PlayerState::Lifting, &mut out);
                let anim = AnimationKey::Lift(self.facing);
                self.pending = Some(PendingTransition { on: anim, to: PlayerState::Lifted });
                out.animations.push(anim);
            }
            PlayerSignal::Climb if self.state == PlayerState::Lifted => {
                self.enter(PlayerState::Criming, &mut out);
                self.pending = Some(PendingTransition { on: AnimationKey::Up, to: PlayerState::Standing });
                out.animations.push(AnimationKey::Up);
            }
            PlayerSignal::Lift | PlayerSignal::Climb => {}
        }
        out
    }

    /// The animation collaborator reports a finished clip.
    ///
    /// Fires the pending continuation exactly once if the clip matches.
    pub fn on_animation_complete(&mut self, key: AnimationKey) -> Transition {
        let mut out = Transition::default();
        let pending = match self.pending {
            Some(p) if p.on.same_clip(key) => p,
            _ => {
                log::warn!("animation {key} completed with no matching continuation");
                return out;
            }
        };
        self.pending = None;

        if self.state.is_terminal() {
            log::debug!("continuation to {:?} absorbed by {:?}", pending.to, self.state);
            return out;
        }
        self.enter(pending.to, &mut out);
        match pending.to {
            PlayerState::Standing => out.animations.push(AnimationKey::Stand(self.facing)),
            PlayerState::Lifted => out.animations.push(AnimationKey::Lifted(self.facing)),
            _ => {}
        }
        out
    }

    fn enter(&mut self, to: PlayerState, out: &mut Transition) {
        if self.state == to {
            return;
        }
        log::debug!("player {:?} -> {:?}", self.state, to);
        out.record(self.state, to);
        self.state = to;
    }
}

/// The placed player: body geometry, probes, and the movement machine.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerEntity {
    pub id: EntityId,
    pub pos: WorldPos,
    pub extent: f64,
    /// Collision body width; narrower than the display extent.
    pub body_w: f64,
    pub sensors: Vec<Sensor>,
    pub machine: PlayerStateMachine,
}

impl PlayerEntity {
    /// Collision body (full tile height, `body_w` wide).
    pub fn body(&self) -> Rect {
        Rect::new(self.pos, self.body_w / 2.0, self.extent / 2.0)
    }
}

impl Placeable for PlayerEntity {
    fn id(&self) -> EntityId { self.id }
    fn position(&self) -> WorldPos { self.pos }
    fn extent(&self) -> f64 { self.extent }
}

impl HasSensors for PlayerEntity {
    fn sensors(&self) -> &[Sensor] {
        &self.sensors
    }
}

impl Animatable for PlayerEntity {
    fn animation_key(&self) -> String {
        self.machine.current_animation().key()
    }
}
