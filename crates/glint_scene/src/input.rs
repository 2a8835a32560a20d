//! # Input Components
//!
//! Input handling is polymorphic: each entity may carry its own
//! `Box<dyn InputHandler>`, stored in a
//! [`BoxedStorage`](glint_core::BoxedStorage). Every frame the handler first
//! sees the frame's events, then updates the entity's transform.

use glam::{EulerRot, Quat, Vec3};

use crate::transform::TransformComponent;

/// Movement keys, after the windowing layer has mapped physical keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Move along the view direction.
    Forward,
    /// Move against the view direction.
    Back,
    /// Strafe left.
    Left,
    /// Strafe right.
    Right,
    /// Move up in world space.
    Up,
    /// Move down in world space.
    Down,
}

impl Key {
    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// One input event delivered to handlers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A movement key changed state.
    Key {
        /// Which key.
        key: Key,
        /// `true` on press, `false` on release.
        pressed: bool,
    },
    /// Relative pointer motion in pixels.
    MouseMotion {
        /// Horizontal delta.
        dx: f32,
        /// Vertical delta.
        dy: f32,
    },
}

/// Per-entity input behaviour.
pub trait InputHandler {
    /// Receives one event. Called for every event of the frame, before
    /// [`update`](Self::update).
    fn input_listener(&mut self, event: &InputEvent);

    /// Applies accumulated input to the entity's transform.
    fn update(&mut self, transform: &mut TransformComponent, dt: f32);
}

/// Free-flying camera controller: WASD-style movement plus mouse look.
#[derive(Debug, Clone, PartialEq)]
pub struct FlyController {
    /// Units per second.
    pub speed: f32,
    /// Radians per pixel of pointer motion.
    pub sensitivity: f32,
    yaw: f32,
    pitch: f32,
    held: u8,
}

impl FlyController {
    const PITCH_LIMIT: f32 = 1.55;

    /// Creates a controller looking down `-Z`.
    #[must_use]
    pub const fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            speed,
            sensitivity,
            yaw: 0.0,
            pitch: 0.0,
            held: 0,
        }
    }

    /// Returns `true` while `key` is held.
    #[must_use]
    pub const fn is_held(&self, key: Key) -> bool {
        self.held & key.bit() != 0
    }

    fn axis(&self, positive: Key, negative: Key) -> f32 {
        f32::from(u8::from(self.is_held(positive))) - f32::from(u8::from(self.is_held(negative)))
    }
}

impl Default for FlyController {
    fn default() -> Self {
        Self::new(5.0, 0.002)
    }
}

impl InputHandler for FlyController {
    fn input_listener(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Key { key, pressed: true } => self.held |= key.bit(),
            InputEvent::Key { key, pressed: false } => self.held &= !key.bit(),
            InputEvent::MouseMotion { dx, dy } => {
                self.yaw -= dx * self.sensitivity;
                self.pitch = (self.pitch - dy * self.sensitivity)
                    .clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
            }
        }
    }

    fn update(&mut self, transform: &mut TransformComponent, dt: f32) {
        transform.rotation = Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0);

        let direction = transform.forward() * self.axis(Key::Forward, Key::Back)
            + transform.right() * self.axis(Key::Right, Key::Left)
            + Vec3::Y * self.axis(Key::Up, Key::Down);
        transform.translation += direction.normalize_or_zero() * self.speed * dt;
    }
}
