//! Perspective camera looking at a fixed target.

use glam::{Mat4, Vec3};

use crate::params::RenderConfig;

/// Perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    target: Vec3,
    fov_y_radians: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl Camera {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            eye: Vec3::from_array(config.camera_position),
            target: Vec3::from_array(config.camera_target),
            fov_y_radians: config.fov_degrees.to_radians(),
            aspect: config.aspect_ratio(),
            near: config.near_plane,
            far: config.far_plane,
        }
    }

    /// Point the camera at `target` (Y stays up; the camera never rolls)
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Update the projection aspect ratio
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_camera_sees_target_at_center() {
        let camera = Camera::new(&RenderConfig::default());
        let clip = camera.view_proj() * camera.target().extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn test_set_aspect_rejects_degenerate_values() {
        let mut camera = Camera::new(&RenderConfig::default());
        camera.set_aspect(1920.0 / 1080.0);
        assert_eq!(camera.aspect(), 1920.0 / 1080.0);

        camera.set_aspect(f32::INFINITY);
        camera.set_aspect(0.0);
        assert_eq!(camera.aspect(), 1920.0 / 1080.0);
    }
}
