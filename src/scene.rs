use crate::environment::EnvironmentMap;
use crate::mesh::ModelData;
use glam::{EulerRot, Mat4, Quat};
use std::sync::Arc;

/// Euler orientation in radians: pitch about X, yaw about Y, roll about Z.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Orientation {
    pub const ZERO: Self = Self { pitch: 0.0, yaw: 0.0, roll: 0.0 };

    pub fn new(pitch: f32, yaw: f32) -> Self {
        Self { pitch, yaw, roll: 0.0 }
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            pitch: self.pitch + (other.pitch - self.pitch) * t,
            yaw: self.yaw + (other.yaw - self.yaw) * t,
            roll: self.roll + (other.roll - self.roll) * t,
        }
    }

    pub fn to_quat(self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.pitch, self.yaw, self.roll)
    }
}

#[derive(Debug, Clone)]
pub struct Model {
    data: Arc<ModelData>,
    orientation: Orientation,
}

impl Model {
    pub fn new(data: ModelData) -> Self {
        Self { data: Arc::new(data), orientation: Orientation::ZERO }
    }

    pub fn data(&self) -> &Arc<ModelData> {
        &self.data
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    pub fn transform(&self) -> Mat4 {
        Mat4::from_quat(self.orientation.to_quat())
    }
}

/// Live scene state. Each slot is replaced by a single assignment; an empty scene still renders.
#[derive(Debug, Default)]
pub struct Scene {
    environment: Option<Arc<EnvironmentMap>>,
    model: Option<Model>,
    revision: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn environment(&self) -> Option<&Arc<EnvironmentMap>> {
        self.environment.as_ref()
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn model_mut(&mut self) -> Option<&mut Model> {
        self.model.as_mut()
    }

    pub fn attach_environment(&mut self, environment: EnvironmentMap) {
        self.environment = Some(Arc::new(environment));
        self.bump_revision();
    }

    pub fn attach_model(&mut self, model: Model) {
        self.model = Some(model);
        self.bump_revision();
    }

    /// Bumped on every attach so GPU-side caches know to re-upload.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.environment.is_none() && self.model.is_none()
    }

    fn bump_revision(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}
