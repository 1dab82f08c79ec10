use crate::controller::movement::MoveKey;
use crate::controller::ControlAction;
use glam::Vec2;
use winit::keyboard::{KeyCode, PhysicalKey};

/// Pointer travel (physical pixels) beyond which a press becomes a drag.
const CLICK_SLOP: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    Control(ControlAction),
    CloseDetail,
    None,
}

/// Maps a physical key to a viewer command. Movement keys report both edges;
/// toggles fire once per press.
pub fn handle_key(key: PhysicalKey, pressed: bool, repeat: bool) -> InputAction {
    let PhysicalKey::Code(code) = key else {
        return InputAction::None;
    };
    let movement = match code {
        KeyCode::KeyW => Some(MoveKey::Forward),
        KeyCode::KeyS => Some(MoveKey::Back),
        KeyCode::KeyA => Some(MoveKey::Left),
        KeyCode::KeyD => Some(MoveKey::Right),
        KeyCode::KeyQ => Some(MoveKey::Down),
        KeyCode::KeyE => Some(MoveKey::Up),
        _ => None,
    };
    if let Some(key) = movement {
        return InputAction::Control(ControlAction::Move(key, pressed));
    }
    if !pressed || repeat {
        return InputAction::None;
    }
    match code {
        KeyCode::KeyF => InputAction::Control(ControlAction::ToggleMode),
        KeyCode::KeyH => InputAction::Control(ControlAction::ToggleHelpers),
        KeyCode::KeyR => InputAction::Control(ControlAction::ResetView),
        KeyCode::Escape => InputAction::CloseDetail,
        _ => InputAction::None,
    }
}

/// Left-button tracking that tells clicks from drags.
#[derive(Default, Debug, Clone, Copy)]
pub struct PointerState {
    pub position: Option<Vec2>,
    pressed_at: Option<Vec2>,
    dragging: bool,
}

impl PointerState {
    /// Records a move; returns the drag delta while the button is held.
    pub fn moved(&mut self, position: Vec2) -> Option<Vec2> {
        let previous = self.position.replace(position);
        let origin = self.pressed_at?;
        if !self.dragging && position.distance(origin) > CLICK_SLOP {
            self.dragging = true;
        }
        previous.map(|previous| position - previous)
    }

    pub fn pressed(&mut self) {
        self.pressed_at = self.position;
        self.dragging = false;
    }

    /// Returns the click position when the press did not turn into a drag.
    pub fn released(&mut self) -> Option<Vec2> {
        self.pressed_at.take()?;
        let dragged = std::mem::take(&mut self.dragging);
        if dragged {
            None
        } else {
            self.position
        }
    }

    pub fn left(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_keys_report_press_and_release() {
        assert_eq!(
            handle_key(PhysicalKey::Code(KeyCode::KeyW), true, false),
            InputAction::Control(ControlAction::Move(MoveKey::Forward, true))
        );
        assert_eq!(
            handle_key(PhysicalKey::Code(KeyCode::KeyQ), false, false),
            InputAction::Control(ControlAction::Move(MoveKey::Down, false))
        );
        assert_eq!(
            handle_key(PhysicalKey::Code(KeyCode::KeyE), true, true),
            InputAction::Control(ControlAction::Move(MoveKey::Up, true))
        );
    }

    #[test]
    fn toggles_fire_once_per_press() {
        let key = PhysicalKey::Code(KeyCode::KeyH);
        assert_eq!(
            handle_key(key, true, false),
            InputAction::Control(ControlAction::ToggleHelpers)
        );
        assert_eq!(handle_key(key, true, true), InputAction::None);
        assert_eq!(handle_key(key, false, false), InputAction::None);
        assert_eq!(
            handle_key(PhysicalKey::Code(KeyCode::Escape), true, false),
            InputAction::CloseDetail
        );
        assert_eq!(
            handle_key(PhysicalKey::Code(KeyCode::KeyX), true, false),
            InputAction::None
        );
    }

    #[test]
    fn small_motion_is_a_click_large_is_a_drag() {
        let mut pointer = PointerState::default();
        pointer.moved(Vec2::new(100.0, 100.0));
        pointer.pressed();
        assert_eq!(pointer.moved(Vec2::new(102.0, 101.0)), Some(Vec2::new(2.0, 1.0)));
        assert_eq!(pointer.released(), Some(Vec2::new(102.0, 101.0)));

        pointer.pressed();
        pointer.moved(Vec2::new(140.0, 101.0));
        assert_eq!(pointer.released(), None);
        assert_eq!(pointer.moved(Vec2::new(150.0, 101.0)), None);
    }
}
