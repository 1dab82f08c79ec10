use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKey {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

/// Held state of the six movement keys. The world is Z-up: forward/back run
/// along Y, left/right along X, up/down along Z.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl MovementInput {
    pub fn set(&mut self, key: MoveKey, pressed: bool) {
        match key {
            MoveKey::Forward => self.forward = pressed,
            MoveKey::Back => self.back = pressed,
            MoveKey::Left => self.left = pressed,
            MoveKey::Right => self.right = pressed,
            MoveKey::Up => self.up = pressed,
            MoveKey::Down => self.down = pressed,
        }
    }

    pub fn any(&self) -> bool {
        self.forward || self.back || self.left || self.right || self.up || self.down
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// One frame of displacement, `step` per active axis. Diagonals are not
    /// normalized, so two keys move faster than one.
    pub fn displacement(&self, step: f32) -> Vec3 {
        let mut movement = Vec3::ZERO;
        if self.forward {
            movement.y += step;
        }
        if self.back {
            movement.y -= step;
        }
        if self.left {
            movement.x -= step;
        }
        if self.right {
            movement.x += step;
        }
        if self.down {
            movement.z -= step;
        }
        if self.up {
            movement.z += step;
        }
        movement
    }
}
