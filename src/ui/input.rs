/// Keyboard state tracker.
///
/// Tracks which keys are currently held so movement continues while a key
/// is down. Terminals that don't report key releases fall back to a
/// timeout: a key with no Press/Repeat for `HOLD_TIMEOUT` counts as up.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::MoveIntent;

const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
pub const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];

pub struct InputState {
    /// Timestamp of the last Press/Repeat per key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from up to held during the last drain.
    fresh_presses: Vec<KeyCode>,
    pub raw_events: Vec<KeyEvent>,
    /// Only honor Release events once keyboard enhancement is confirmed.
    honor_release: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(8),
            fresh_presses: Vec::with_capacity(4),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Tracker for a terminal whose Release reporting is known. Without it,
    /// keys fall back to the hold timeout.
    pub fn with_release(honor_release: bool) -> Self {
        InputState { honor_release, ..Self::new() }
    }

    /// Drain pending terminal events without blocking. Once per frame.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn record(&mut self, key: KeyEvent, at: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, at);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Movement intent for this tick. Left wins when both are held.
    pub fn intent(&self) -> MoveIntent {
        let left = self.any_held(KEYS_LEFT) || self.any_pressed(KEYS_LEFT);
        let right = self.any_held(KEYS_RIGHT) || self.any_pressed(KEYS_RIGHT);
        MoveIntent::from_held(left, right)
    }

    pub fn quit_requested(&self) -> bool {
        self.any_pressed(KEYS_QUIT)
            || self.raw_events.iter().any(|k| {
                k.modifiers.contains(KeyModifiers::CONTROL)
                    && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn held_key_maps_to_intent() {
        let mut kb = InputState::new();
        assert_eq!(kb.intent(), MoveIntent::None);
        kb.record(press(KeyCode::Right), Instant::now());
        assert_eq!(kb.intent(), MoveIntent::Right);
        kb.record(press(KeyCode::Char('a')), Instant::now());
        assert_eq!(kb.intent(), MoveIntent::Left);
    }

    #[test]
    fn release_only_counts_when_honored() {
        let mut kb = InputState::new();
        kb.record(press(KeyCode::Left), Instant::now());
        let mut up = press(KeyCode::Left);
        up.kind = KeyEventKind::Release;
        kb.record(up, Instant::now());
        assert!(kb.is_held(KeyCode::Left));

        kb.honor_release = true;
        kb.record(up, Instant::now());
        assert!(!kb.is_held(KeyCode::Left));
    }

    #[test]
    fn release_capable_terminal_stops_on_key_up() {
        let mut kb = InputState::with_release(true);
        kb.record(press(KeyCode::Right), Instant::now());
        assert_eq!(kb.intent(), MoveIntent::Right);
        let mut up = press(KeyCode::Right);
        up.kind = KeyEventKind::Release;
        kb.record(up, Instant::now());
        assert!(!kb.any_held(KEYS_RIGHT));

        assert!(!InputState::with_release(false).honor_release);
    }

    #[test]
    fn quit_keys() {
        let mut kb = InputState::new();
        assert!(!kb.quit_requested());
        kb.record(press(KeyCode::Esc), Instant::now());
        assert!(kb.quit_requested());

        let mut kb = InputState::new();
        kb.record(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL), Instant::now());
        assert!(kb.quit_requested());
    }
}
