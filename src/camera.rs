use crate::config::CameraConfig;
use glam::{Mat4, Vec3};

const DEFAULT_UP: Vec3 = Vec3::Y;

/// Matrices handed to the scene pass for a single frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
}

impl CameraView {
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

/// Perspective camera looking at the origin from a fixed distance.
///
/// The aspect ratio is owned by the viewport: only [`crate::viewport::ViewportController`]
/// writes it, which marks the cached projection dirty until the next read.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    fov_y_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
    position: Vec3,
    target: Vec3,
    projection: Mat4,
    projection_dirty: bool,
}

impl PerspectiveCamera {
    pub fn new(fov_y_degrees: f32, near: f32, far: f32, distance: f32) -> Self {
        Self {
            fov_y_degrees,
            aspect: 1.0,
            near,
            far,
            position: Vec3::new(0.0, 0.0, distance),
            target: Vec3::ZERO,
            projection: Mat4::IDENTITY,
            projection_dirty: true,
        }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(config.fov_degrees, config.near, config.far, config.distance)
    }

    pub fn fov_y_degrees(&self) -> f32 {
        self.fov_y_degrees
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub(crate) fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
            self.projection_dirty = true;
        }
    }

    pub fn projection_dirty(&self) -> bool {
        self.projection_dirty
    }

    pub fn update_projection_matrix(&mut self) {
        self.projection =
            Mat4::perspective_rh(self.fov_y_degrees.to_radians(), self.aspect, self.near, self.far);
        self.projection_dirty = false;
    }

    pub fn projection_matrix(&mut self) -> Mat4 {
        if self.projection_dirty {
            self.update_projection_matrix();
        }
        self.projection
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, DEFAULT_UP)
    }

    pub fn view(&mut self) -> CameraView {
        CameraView { view: self.view_matrix(), projection: self.projection_matrix(), position: self.position }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_projection_is_finite() {
        let mut camera = PerspectiveCamera::new(45.0, 0.1, 1000.0, 3.5);
        camera.set_aspect(16.0 / 9.0);
        let vp = camera.view().view_projection();
        assert!(!vp.to_cols_array().iter().any(|v| v.is_nan() || v.is_infinite()));
    }

    #[test]
    fn aspect_change_marks_projection_dirty_until_read() {
        let mut camera = PerspectiveCamera::new(45.0, 0.1, 1000.0, 3.5);
        let _ = camera.projection_matrix();
        assert!(!camera.projection_dirty());
        camera.set_aspect(2.0);
        assert!(camera.projection_dirty());
        let wide = camera.projection_matrix();
        assert!(!camera.projection_dirty());
        let expected = Mat4::perspective_rh(45.0f32.to_radians(), 2.0, 0.1, 1000.0);
        assert_eq!(wide, expected);
    }

    #[test]
    fn invalid_aspect_is_ignored() {
        let mut camera = PerspectiveCamera::new(45.0, 0.1, 1000.0, 3.5);
        camera.set_aspect(1.5);
        let _ = camera.projection_matrix();
        camera.set_aspect(f32::INFINITY);
        camera.set_aspect(0.0);
        assert_eq!(camera.aspect(), 1.5);
        assert!(!camera.projection_dirty());
    }

    #[test]
    fn origin_point_projects_to_screen_centre() {
        let mut camera = PerspectiveCamera::new(45.0, 0.1, 1000.0, 3.5);
        let clip = camera.view().view_projection() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!((camera.distance() - 3.5).abs() < 1e-5);
    }
}
