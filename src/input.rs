use glam::Vec2;
use winit::keyboard::KeyCode;

/// Logical movement keys, independent of the physical layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKey {
    Forward,
    Backward,
    StrafeLeft,
    StrafeRight,
}

impl MoveKey {
    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::KeyW | KeyCode::ArrowUp => Some(MoveKey::Forward),
            KeyCode::KeyS | KeyCode::ArrowDown => Some(MoveKey::Backward),
            KeyCode::KeyA | KeyCode::ArrowLeft => Some(MoveKey::StrafeLeft),
            KeyCode::KeyD | KeyCode::ArrowRight => Some(MoveKey::StrafeRight),
            _ => None,
        }
    }
}

/// Snapshot written by event handlers and read once per frame step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    forward: bool,
    backward: bool,
    strafe_left: bool,
    strafe_right: bool,
    pointer_delta: Vec2,
}

impl InputState {
    pub fn set_key(&mut self, key: MoveKey, pressed: bool) {
        match key {
            MoveKey::Forward => self.forward = pressed,
            MoveKey::Backward => self.backward = pressed,
            MoveKey::StrafeLeft => self.strafe_left = pressed,
            MoveKey::StrafeRight => self.strafe_right = pressed,
        }
    }

    pub fn is_pressed(&self, key: MoveKey) -> bool {
        match key {
            MoveKey::Forward => self.forward,
            MoveKey::Backward => self.backward,
            MoveKey::StrafeLeft => self.strafe_left,
            MoveKey::StrafeRight => self.strafe_right,
        }
    }

    /// Raw pointer motion in device units. Accumulates until taken.
    pub fn push_pointer_delta(&mut self, dx: f32, dy: f32) {
        self.pointer_delta += Vec2::new(dx, dy);
    }

    pub fn take_pointer_delta(&mut self) -> Vec2 {
        std::mem::take(&mut self.pointer_delta)
    }

    /// Forward and strafe axes in {-1, 0, 1}; opposite keys cancel.
    pub fn move_axes(&self) -> (f32, f32) {
        let axis = |pos: bool, neg: bool| f32::from(pos as u8) - f32::from(neg as u8);
        (
            axis(self.forward, self.backward),
            axis(self.strafe_right, self.strafe_left),
        )
    }

    /// Forget held keys and pending motion, e.g. when focus is lost and the
    /// matching key-up events will never arrive.
    pub fn clear(&mut self) {
        *self = InputState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wasd_and_arrows_map_to_move_keys() {
        assert_eq!(MoveKey::from_key_code(KeyCode::KeyW), Some(MoveKey::Forward));
        assert_eq!(MoveKey::from_key_code(KeyCode::ArrowDown), Some(MoveKey::Backward));
        assert_eq!(MoveKey::from_key_code(KeyCode::KeyA), Some(MoveKey::StrafeLeft));
        assert_eq!(MoveKey::from_key_code(KeyCode::ArrowRight), Some(MoveKey::StrafeRight));
        assert_eq!(MoveKey::from_key_code(KeyCode::Space), None);
    }

    #[test]
    fn opposite_keys_cancel() {
        let mut input = InputState::default();
        input.set_key(MoveKey::Forward, true);
        input.set_key(MoveKey::Backward, true);
        input.set_key(MoveKey::StrafeLeft, true);
        assert_eq!(input.move_axes(), (0.0, -1.0));

        input.set_key(MoveKey::Backward, false);
        assert_eq!(input.move_axes(), (1.0, -1.0));
        assert!(input.is_pressed(MoveKey::Forward));
        assert!(!input.is_pressed(MoveKey::Backward));
    }

    #[test]
    fn pointer_delta_accumulates_until_taken() {
        let mut input = InputState::default();
        input.push_pointer_delta(3.0, -1.0);
        input.push_pointer_delta(2.0, 4.0);
        assert_eq!(input.take_pointer_delta(), Vec2::new(5.0, 3.0));
        assert_eq!(input.take_pointer_delta(), Vec2::ZERO);
    }

    #[test]
    fn clear_releases_everything() {
        let mut input = InputState::default();
        input.set_key(MoveKey::StrafeRight, true);
        input.push_pointer_delta(1.0, 1.0);
        input.clear();
        assert_eq!(input, InputState::default());
    }
}
