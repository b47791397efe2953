use crate::config::InputConfig;
use crate::scene::{Orientation, Scene};
use crate::viewport::DisplayMetrics;
use glam::Vec2;
use serde::Deserialize;
use std::f32::consts::PI;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{Key, NamedKey};

/// Full pointer-driven rotation span; the pointer covers half of it either side of centre.
pub const DEFAULT_ROTATION_RANGE: f32 = PI * 0.1;
pub const DEFAULT_TWEEN_SECONDS: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    Linear,
    #[default]
    Power2Out,
    Power3Out,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Power2Out => 1.0 - (1.0 - t).powi(2),
            Easing::Power3Out => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// Pointer position normalized to the viewport, each axis in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
}

impl PointerState {
    /// Positions outside the viewport are clamped to its edges.
    pub fn normalize(position: Vec2, display: &DisplayMetrics) -> Option<Self> {
        if display.is_degenerate() || !position.is_finite() {
            return None;
        }
        Some(Self {
            x: (position.x / display.width).clamp(0.0, 1.0),
            y: (position.y / display.height).clamp(0.0, 1.0),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationTween {
    from: Orientation,
    to: Orientation,
    elapsed: f32,
    duration: f32,
    easing: Easing,
}

impl OrientationTween {
    pub fn new(from: Orientation, to: Orientation, duration: f32, easing: Easing) -> Self {
        Self { from, to, elapsed: 0.0, duration: duration.max(0.0), easing }
    }

    pub fn target(&self) -> Orientation {
        self.to
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn sample(&self) -> Orientation {
        if self.is_finished() {
            return self.to;
        }
        self.from.lerp(self.to, self.easing.apply(self.elapsed / self.duration))
    }

    pub fn step(&mut self, dt: f32) -> Orientation {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed = (self.elapsed + dt).min(self.duration);
        }
        self.sample()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerOutcome {
    /// No model in the scene, or the viewport has no area.
    Ignored,
    Retargeted(Orientation),
}

/// Maps pointer position to a bounded model orientation and eases toward it.
/// Only the latest target is kept; a new pointer move restarts the tween from wherever
/// the model currently is.
#[derive(Debug, Clone)]
pub struct InputMapper {
    rotation_range: f32,
    tween_seconds: f32,
    easing: Easing,
    pointer: Option<PointerState>,
    tween: Option<OrientationTween>,
}

impl InputMapper {
    pub fn new(rotation_range: f32, tween_seconds: f32, easing: Easing) -> Self {
        Self { rotation_range, tween_seconds, easing, pointer: None, tween: None }
    }

    pub fn from_config(config: &InputConfig) -> Self {
        Self::new(config.rotation_range, config.tween_seconds, config.easing)
    }

    pub fn pointer(&self) -> Option<PointerState> {
        self.pointer
    }

    pub fn tween(&self) -> Option<&OrientationTween> {
        self.tween.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    pub fn target_for(&self, pointer: PointerState) -> Orientation {
        Orientation::new((pointer.y - 0.5) * self.rotation_range, (pointer.x - 0.5) * self.rotation_range)
    }

    /// `position` is in logical pixels relative to the viewport's top-left corner.
    pub fn on_pointer_move(&mut self, position: Vec2, display: &DisplayMetrics, scene: &Scene) -> PointerOutcome {
        let Some(model) = scene.model() else {
            return PointerOutcome::Ignored;
        };
        let Some(pointer) = PointerState::normalize(position, display) else {
            return PointerOutcome::Ignored;
        };
        self.pointer = Some(pointer);
        let target = self.target_for(pointer);
        self.tween = Some(OrientationTween::new(model.orientation(), target, self.tween_seconds, self.easing));
        log::trace!(target: "input", "pointer {:.3},{:.3} -> target {:?}", pointer.x, pointer.y, target);
        PointerOutcome::Retargeted(target)
    }

    /// Steps the active tween by `dt` seconds and writes the result to the model.
    pub fn advance(&mut self, dt: f32, scene: &mut Scene) -> Option<Orientation> {
        let tween = self.tween.as_mut()?;
        let Some(model) = scene.model_mut() else {
            self.tween = None;
            return None;
        };
        let orientation = tween.step(dt);
        model.set_orientation(orientation);
        if tween.is_finished() {
            self.tween = None;
        }
        Some(orientation)
    }
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::new(DEFAULT_ROTATION_RANGE, DEFAULT_TWEEN_SECONDS, Easing::default())
    }
}

/// Window events the showcase reacts to, reduced to what the app needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Physical pixels, as reported by the window.
    CursorPos { x: f64, y: f64 },
    MouseButton { button: MouseButton, pressed: bool },
    Wheel { delta: f32 },
    Exit,
    Other,
}

impl InputEvent {
    pub fn from_window_event(ev: &WindowEvent) -> Self {
        match ev {
            WindowEvent::MouseWheel { delta, .. } => {
                let d = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / 40.0,
                };
                InputEvent::Wheel { delta: d }
            }
            WindowEvent::CursorMoved { position, .. } => InputEvent::CursorPos { x: position.x, y: position.y },
            WindowEvent::MouseInput { state, button, .. } => {
                InputEvent::MouseButton { button: *button, pressed: *state == ElementState::Pressed }
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && event.logical_key == Key::Named(NamedKey::Escape) =>
            {
                InputEvent::Exit
            }
            _ => InputEvent::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{ModelData, ModelVertex};
    use crate::scene::Model;
    use glam::Vec3;

    fn scene_with_model() -> Scene {
        let vertices = vec![
            ModelVertex::new(Vec3::ZERO, Vec3::Z, Vec2::ZERO),
            ModelVertex::new(Vec3::X, Vec3::Z, Vec2::X),
            ModelVertex::new(Vec3::Y, Vec3::Z, Vec2::Y),
        ];
        let mut scene = Scene::new();
        scene.attach_model(Model::new(ModelData::new("tri", vertices, vec![0, 1, 2])));
        scene
    }

    fn display() -> DisplayMetrics {
        DisplayMetrics::new(800.0, 600.0, 1.0)
    }

    #[test]
    fn power2_out_matches_curve() {
        assert_eq!(Easing::Power2Out.apply(0.0), 0.0);
        assert!((Easing::Power2Out.apply(0.5) - 0.75).abs() < 1e-6);
        assert_eq!(Easing::Power2Out.apply(1.0), 1.0);
        assert_eq!(Easing::Power2Out.apply(2.0), 1.0);
        assert!((Easing::Power3Out.apply(0.5) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn centre_maps_to_zero_rotation() {
        let scene = scene_with_model();
        let mut mapper = InputMapper::default();
        let outcome = mapper.on_pointer_move(Vec2::new(400.0, 300.0), &display(), &scene);
        assert_eq!(outcome, PointerOutcome::Retargeted(Orientation::ZERO));
    }

    #[test]
    fn out_of_viewport_pointer_is_clamped() {
        let scene = scene_with_model();
        let mut mapper = InputMapper::default();
        let far = mapper.on_pointer_move(Vec2::new(5000.0, -900.0), &display(), &scene);
        let edge = mapper.on_pointer_move(Vec2::new(800.0, 0.0), &display(), &scene);
        assert_eq!(far, edge);
        let half = DEFAULT_ROTATION_RANGE * 0.5;
        assert_eq!(edge, PointerOutcome::Retargeted(Orientation::new(-half, half)));
    }

    #[test]
    fn tween_midpoint_follows_easing() {
        let mut scene = scene_with_model();
        let mut mapper = InputMapper::default();
        mapper.on_pointer_move(Vec2::new(800.0, 600.0), &display(), &scene);
        let half = DEFAULT_ROTATION_RANGE * 0.5;
        let mid = mapper.advance(0.5, &mut scene).expect("tween active");
        assert!((mid.yaw - half * 0.75).abs() < 1e-6);
        assert!(mapper.is_animating());
        mapper.advance(0.5, &mut scene);
        assert!(!mapper.is_animating());
        let settled = scene.model().expect("model").orientation();
        assert_eq!(settled, Orientation::new(half, half));
        assert!(mapper.advance(0.016, &mut scene).is_none());
    }

    #[test]
    fn degenerate_display_is_ignored() {
        let scene = scene_with_model();
        let mut mapper = InputMapper::default();
        let outcome = mapper.on_pointer_move(Vec2::new(10.0, 10.0), &DisplayMetrics::new(0.0, 0.0, 1.0), &scene);
        assert_eq!(outcome, PointerOutcome::Ignored);
        assert!(mapper.pointer().is_none());
    }

    #[test]
    fn zero_duration_snaps_on_first_step() {
        let mut scene = scene_with_model();
        let mut mapper = InputMapper::new(DEFAULT_ROTATION_RANGE, 0.0, Easing::Linear);
        mapper.on_pointer_move(Vec2::ZERO, &display(), &scene);
        let orientation = mapper.advance(0.0, &mut scene).expect("tween active");
        let half = DEFAULT_ROTATION_RANGE * 0.5;
        assert_eq!(orientation, Orientation::new(-half, -half));
        assert!(!mapper.is_animating());
    }
}
