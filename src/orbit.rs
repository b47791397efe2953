use crate::camera::PerspectiveCamera;
use crate::config::OrbitConfig;
use crate::viewport::DisplayMetrics;
use glam::{EulerRot, Quat, Vec2, Vec3};
use std::f32::consts::{FRAC_PI_2, TAU};

const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;
const SETTLE_EPSILON: f32 = 1e-5;

/// Damped orbit around the origin. Drag deltas accumulate and bleed into the camera a
/// fraction at a time on every `update`.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    yaw: f32,
    pitch: f32,
    radius: f32,
    yaw_delta: f32,
    pitch_delta: f32,
    zoom_scale: f32,
    damping: f32,
    rotate_speed: f32,
    zoom_speed: f32,
    min_distance: f32,
    max_distance: f32,
    dragging: bool,
    last_pointer: Option<Vec2>,
}

impl OrbitControls {
    pub fn new(config: &OrbitConfig, camera: &PerspectiveCamera) -> Self {
        let offset = camera.position() - camera.target();
        let radius = offset.length().max(0.01);
        let pitch = (-offset.y / radius).clamp(-1.0, 1.0).asin();
        let yaw = offset.x.atan2(offset.z);
        Self {
            yaw,
            pitch,
            radius,
            yaw_delta: 0.0,
            pitch_delta: 0.0,
            zoom_scale: 1.0,
            damping: config.damping.clamp(0.0, 1.0),
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed.clamp(0.0, 0.99),
            min_distance: config.min_distance.max(0.01),
            max_distance: config.max_distance.max(config.min_distance.max(0.01)),
            dragging: false,
            last_pointer: None,
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn pointer_pressed(&mut self, pressed: bool, position: Option<Vec2>) {
        self.dragging = pressed;
        self.last_pointer = if pressed { position } else { None };
    }

    /// `position` in logical pixels. Only has an effect while dragging.
    pub fn pointer_moved(&mut self, position: Vec2, display: &DisplayMetrics) {
        if !self.dragging || display.is_degenerate() {
            self.last_pointer = Some(position);
            return;
        }
        if let Some(last) = self.last_pointer {
            let delta = position - last;
            // A full-height drag turns the camera once around.
            let scale = TAU * self.rotate_speed / display.height;
            self.yaw_delta -= delta.x * scale;
            self.pitch_delta -= delta.y * scale;
        }
        self.last_pointer = Some(position);
    }

    /// Positive `wheel_delta` moves the camera closer.
    pub fn zoom(&mut self, wheel_delta: f32) {
        if wheel_delta.is_finite() {
            self.zoom_scale *= (1.0 - self.zoom_speed).powf(wheel_delta);
        }
    }

    /// Applies one damped step and writes the camera position. Returns whether it moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let moving = self.yaw_delta.abs() > SETTLE_EPSILON
            || self.pitch_delta.abs() > SETTLE_EPSILON
            || (self.zoom_scale - 1.0).abs() > SETTLE_EPSILON;

        self.yaw += self.yaw_delta * self.damping;
        self.pitch = (self.pitch + self.pitch_delta * self.damping).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.radius = (self.radius * self.zoom_scale).clamp(self.min_distance, self.max_distance);
        self.zoom_scale = 1.0;
        self.yaw_delta *= 1.0 - self.damping;
        self.pitch_delta *= 1.0 - self.damping;

        camera.set_position(camera.target() + self.offset());
        moving
    }

    fn offset(&self) -> Vec3 {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0) * Vec3::new(0.0, 0.0, self.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(45.0, 0.1, 1000.0, 3.5)
    }

    fn display() -> DisplayMetrics {
        DisplayMetrics::new(800.0, 600.0, 1.0)
    }

    #[test]
    fn starts_where_camera_is() {
        let mut cam = camera();
        let mut orbit = OrbitControls::new(&OrbitConfig::default(), &cam);
        assert!((orbit.radius() - 3.5).abs() < 1e-5);
        assert!(!orbit.update(&mut cam));
        assert!((cam.position() - Vec3::new(0.0, 0.0, 3.5)).length() < 1e-5);
    }

    #[test]
    fn drag_rotates_with_damping() {
        let mut cam = camera();
        let mut orbit = OrbitControls::new(&OrbitConfig::default(), &cam);
        orbit.pointer_pressed(true, Some(Vec2::new(400.0, 300.0)));
        orbit.pointer_moved(Vec2::new(460.0, 300.0), &display());
        assert!(orbit.update(&mut cam));
        let first_step = orbit.yaw().abs();
        assert!(first_step > 0.0);
        orbit.update(&mut cam);
        let second_step = orbit.yaw().abs() - first_step;
        assert!(second_step < first_step, "damping shrinks each step");
        assert!((cam.position().length() - 3.5).abs() < 1e-4);
    }

    #[test]
    fn moves_without_drag_are_ignored() {
        let mut cam = camera();
        let mut orbit = OrbitControls::new(&OrbitConfig::default(), &cam);
        orbit.pointer_moved(Vec2::new(10.0, 10.0), &display());
        orbit.pointer_moved(Vec2::new(500.0, 500.0), &display());
        assert!(!orbit.update(&mut cam));
        assert_eq!(orbit.yaw(), 0.0);
    }

    #[test]
    fn pitch_and_zoom_are_bounded() {
        let mut cam = camera();
        let config = OrbitConfig::default();
        let mut orbit = OrbitControls::new(&config, &cam);
        orbit.pointer_pressed(true, Some(Vec2::ZERO));
        orbit.pointer_moved(Vec2::new(0.0, 100_000.0), &display());
        orbit.zoom(500.0);
        for _ in 0..200 {
            orbit.update(&mut cam);
        }
        assert!(orbit.pitch().abs() <= PITCH_LIMIT);
        assert!((orbit.radius() - config.min_distance).abs() < 1e-5);
    }
}
