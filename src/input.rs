//! Keyboard input: the slow-motion key and its edge latch.

use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::panel::PanelChange;

/// Input events the director reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Slow-motion key went down
    SlowmoEngage,
    /// Slow-motion key came up
    SlowmoRelease,
}

/// Tracks the slow-motion key so only press and release edges pass through.
///
/// Repeated downs (key repeat, or a second engage without a release) are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct SlowmoLatch {
    held: bool,
}

impl SlowmoLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Returns the event if it is an edge
    pub fn filter(&mut self, event: InputEvent) -> Option<InputEvent> {
        let down = matches!(event, InputEvent::SlowmoEngage);
        if down == self.held {
            return None;
        }
        self.held = down;
        Some(event)
    }
}

/// Map a winit key event to an input event (space bar only, repeats ignored)
pub fn map_key_event(event: &KeyEvent) -> Option<InputEvent> {
    if event.repeat || event.physical_key != PhysicalKey::Code(KeyCode::Space) {
        return None;
    }
    Some(match event.state {
        ElementState::Pressed => InputEvent::SlowmoEngage,
        ElementState::Released => InputEvent::SlowmoRelease,
    })
}

/// Keyboard shortcuts standing in for the debug panel widgets.
///
/// N, V and B toggle noise, vignette and bloom; R toggles auto-rotate; F
/// cycles the form; `[` and `]` step the noise speed.
pub fn panel_shortcut(event: &KeyEvent) -> Option<PanelChange> {
    if event.repeat || event.state != ElementState::Pressed {
        return None;
    }
    match event.physical_key {
        PhysicalKey::Code(code) => shortcut_for(code),
        _ => None,
    }
}

fn shortcut_for(code: KeyCode) -> Option<PanelChange> {
    let change = match code {
        KeyCode::KeyN => PanelChange::ToggleNoise,
        KeyCode::KeyV => PanelChange::ToggleVignette,
        KeyCode::KeyB => PanelChange::ToggleBloom,
        KeyCode::KeyR => PanelChange::ToggleAutoRotate,
        KeyCode::KeyF => PanelChange::NextForm,
        KeyCode::BracketRight => PanelChange::AdjustNoiseSpeed(1.0),
        KeyCode::BracketLeft => PanelChange::AdjustNoiseSpeed(-1.0),
        _ => return None,
    };
    Some(change)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_passes_edges_only() {
        let mut latch = SlowmoLatch::new();
        assert_eq!(
            latch.filter(InputEvent::SlowmoEngage),
            Some(InputEvent::SlowmoEngage)
        );
        assert_eq!(latch.filter(InputEvent::SlowmoEngage), None);
        assert!(latch.is_held());
        assert_eq!(
            latch.filter(InputEvent::SlowmoRelease),
            Some(InputEvent::SlowmoRelease)
        );
        assert_eq!(latch.filter(InputEvent::SlowmoRelease), None);
        assert!(!latch.is_held());
    }

    #[test]
    fn test_shortcuts_are_relative() {
        assert_eq!(shortcut_for(KeyCode::KeyN), Some(PanelChange::ToggleNoise));
        assert_eq!(shortcut_for(KeyCode::KeyF), Some(PanelChange::NextForm));
        assert_eq!(
            shortcut_for(KeyCode::BracketLeft),
            Some(PanelChange::AdjustNoiseSpeed(-1.0))
        );
        assert_eq!(shortcut_for(KeyCode::Space), None);
    }

    #[test]
    fn test_release_without_press_is_dropped() {
        let mut latch = SlowmoLatch::new();
        assert_eq!(latch.filter(InputEvent::SlowmoRelease), None);
    }
}
