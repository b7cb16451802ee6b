/// Animation clock: plays one clip per entity and reports completions.
///
/// Every clip runs `frames × frame_ticks` ticks. What happens at the end
/// depends on the clip:
///
///   start, lift, up      → complete once (reported back to the world)
///   stand, fall, lifted  → loop
///   dead                 → hold the last frame

use std::collections::HashMap;

use crate::domain::entity::{AnimationKey, EntityId};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum EndMode {
    Complete,
    Loop,
    Hold,
}

fn clip(key: AnimationKey) -> (u32, EndMode) {
    match key {
        AnimationKey::Start => (4, EndMode::Complete),
        AnimationKey::Stand(_) => (3, EndMode::Loop),
        AnimationKey::Fall(_) => (2, EndMode::Loop),
        AnimationKey::Dead(_) => (3, EndMode::Hold),
        AnimationKey::Lift(_) => (1, EndMode::Complete),
        AnimationKey::Lifted(_) => (2, EndMode::Loop),
        AnimationKey::Up => (2, EndMode::Complete),
    }
}

#[derive(Clone, Copy, Debug)]
struct Playing {
    key: AnimationKey,
    elapsed: u32,
    done: bool,
}

#[derive(Debug)]
pub struct AnimationClock {
    frame_ticks: u32,
    playing: HashMap<EntityId, Playing>,
}

impl AnimationClock {
    pub fn new(frame_ticks: u32) -> Self {
        AnimationClock { frame_ticks: frame_ticks.max(1), playing: HashMap::new() }
    }

    /// Start `key` on `entity`, replacing whatever it was playing.
    pub fn play(&mut self, entity: EntityId, key: AnimationKey) {
        self.playing.insert(entity, Playing { key, elapsed: 0, done: false });
    }

    pub fn current(&self, entity: EntityId) -> Option<AnimationKey> {
        self.playing.get(&entity).map(|p| p.key)
    }

    /// Frame index of the clip playing on `entity`.
    pub fn frame(&self, entity: EntityId) -> u32 {
        self.playing.get(&entity).map_or(0, |p| {
            let (frames, _) = clip(p.key);
            (p.elapsed / self.frame_ticks).min(frames - 1)
        })
    }

    /// Advance one tick; returns the clips that just completed.
    pub fn tick(&mut self) -> Vec<(EntityId, AnimationKey)> {
        let mut completed = vec![];
        for (&entity, p) in self.playing.iter_mut() {
            if p.done {
                continue;
            }
            let (frames, mode) = clip(p.key);
            let length = frames * self.frame_ticks;
            p.elapsed += 1;
            if p.elapsed < length {
                continue;
            }
            match mode {
                EndMode::Loop => p.elapsed = 0,
                EndMode::Hold => {
                    p.elapsed = length - 1;
                    p.done = true;
                }
                EndMode::Complete => {
                    p.elapsed = length - 1;
                    p.done = true;
                    completed.push((entity, p.key));
                }
            }
        }
        completed.sort_by_key(|(id, _)| *id);
        completed
    }
}
