//! # Camera Component

use glam::Mat4;

/// Perspective camera parameters.
///
/// The view matrix comes from the entity's
/// [`TransformComponent`](crate::TransformComponent).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraComponent {
    /// Vertical field of view in degrees.
    pub fov: f32,
    /// Viewport width divided by height.
    pub aspect: f32,
    /// Near clip distance.
    pub near_z: f32,
    /// Far clip distance.
    pub far_z: f32,
}

impl CameraComponent {
    /// Creates a camera.
    #[must_use]
    pub const fn new(fov: f32, aspect: f32, near_z: f32, far_z: f32) -> Self {
        Self {
            fov,
            aspect,
            near_z,
            far_z,
        }
    }

    /// Right-handed perspective projection with OpenGL clip depth (-1..1).
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), self.aspect, self.near_z, self.far_z)
    }
}

impl Default for CameraComponent {
    fn default() -> Self {
        Self::new(45.0, 16.0 / 9.0, 0.1, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_square_aspect() {
        let camera = CameraComponent::new(90.0, 1.0, 0.1, 100.0);
        let projection = camera.projection();
        assert!((projection.x_axis.x - 1.0).abs() < 1e-5);
        assert!((projection.y_axis.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_projection_wide_aspect() {
        let camera = CameraComponent::new(90.0, 3.654_732, 0.1, 100.0);
        let projection = camera.projection();
        assert!((projection.x_axis.x - 1.0 / 3.654_732).abs() < 1e-5);
        assert!((projection.y_axis.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_projection_depth_range() {
        let camera = CameraComponent::new(60.0, 1.5, 0.5, 50.0);
        let near = camera.projection().project_point3(glam::Vec3::new(0.0, 0.0, -0.5));
        let far = camera.projection().project_point3(glam::Vec3::new(0.0, 0.0, -50.0));
        assert!((near.z + 1.0).abs() < 1e-4);
        assert!((far.z - 1.0).abs() < 1e-4);
    }
}
