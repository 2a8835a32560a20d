//! # Transform Component
//!
//! Scale, rotation and translation, composed as `T * R * S`: scale first,
//! then rotate, then translate.

use glam::{Mat4, Quat, Vec3};

/// Placement of an entity in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformComponent {
    /// Per-axis scale. Components must be non-zero for the inverse to exist.
    pub scale: Vec3,
    /// Orientation.
    pub rotation: Quat,
    /// World-space position.
    pub translation: Vec3,
}

impl TransformComponent {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        scale: Vec3::ONE,
        rotation: Quat::IDENTITY,
        translation: Vec3::ZERO,
    };

    /// Creates a transform from its parts.
    #[must_use]
    pub const fn new(scale: Vec3, rotation: Quat, translation: Vec3) -> Self {
        Self {
            scale,
            rotation,
            translation,
        }
    }

    /// Identity transform moved to `translation`.
    #[must_use]
    pub const fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Returns `self` with the given rotation.
    #[must_use]
    pub const fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Returns `self` with the given scale.
    #[must_use]
    pub const fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Local-to-world matrix.
    #[must_use]
    pub fn transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// World-to-local matrix, the exact inverse of [`transform`](Self::transform).
    ///
    /// For a camera entity this is the view matrix.
    #[must_use]
    pub fn inverse_transform(&self) -> Mat4 {
        Mat4::from_scale(self.scale.recip())
            * Mat4::from_quat(self.rotation.inverse())
            * Mat4::from_translation(-self.translation)
    }

    /// Unit vector the entity looks along (local `-Z`).
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Unit vector to the entity's right (local `+X`).
    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }
}

impl Default for TransformComponent {
    fn default() -> Self {
        Self::IDENTITY
    }
}
