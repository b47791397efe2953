#![allow(dead_code)]

use anyhow::{bail, Result};
use glam::{Vec2, Vec3};
use scene_showcase::assets::{AssetLoader, LoadError};
use scene_showcase::camera::CameraView;
use scene_showcase::environment::EnvironmentMap;
use scene_showcase::mesh::{ModelData, ModelVertex};
use scene_showcase::render_graph::BufferSlot;
use scene_showcase::renderer::{ClearColor, RenderBackend, ShaderEffect};
use scene_showcase::scene::{Orientation, Scene};
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::sync::Mutex;
use winit::dpi::PhysicalSize;

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Resize(PhysicalSize<u32>),
    DrawScene { target: BufferSlot, has_model: bool, has_environment: bool, orientation: Option<Orientation> },
    ApplyEffect { effect: ShaderEffect, source: BufferSlot, target: BufferSlot },
    Present,
}

/// Records every call the render graph makes instead of drawing.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<BackendCall>,
    pub size: Option<PhysicalSize<u32>>,
    pub fail_draws: bool,
    pub fail_resizes: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn presents(&self) -> usize {
        self.calls.iter().filter(|call| **call == BackendCall::Present).count()
    }

    pub fn draws(&self) -> Vec<&BackendCall> {
        self.calls.iter().filter(|call| matches!(call, BackendCall::DrawScene { .. })).collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl RenderBackend for RecordingBackend {
    fn resize(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        if self.fail_resizes {
            bail!("surface reconfigure rejected {}x{}", size.width, size.height);
        }
        self.size = Some(size);
        self.calls.push(BackendCall::Resize(size));
        Ok(())
    }

    fn draw_scene(&mut self, scene: &Scene, _camera: &CameraView, _clear: ClearColor, target: BufferSlot) -> Result<()> {
        if self.fail_draws {
            bail!("device lost");
        }
        self.calls.push(BackendCall::DrawScene {
            target,
            has_model: scene.model().is_some(),
            has_environment: scene.environment().is_some(),
            orientation: scene.model().map(|model| model.orientation()),
        });
        Ok(())
    }

    fn apply_effect(&mut self, effect: &ShaderEffect, source: BufferSlot, target: BufferSlot) -> Result<()> {
        self.calls.push(BackendCall::ApplyEffect { effect: *effect, source, target });
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        self.calls.push(BackendCall::Present);
        Ok(())
    }
}

pub fn triangle_model() -> ModelData {
    let vertices = vec![
        ModelVertex::new(Vec3::ZERO, Vec3::Z, Vec2::ZERO),
        ModelVertex::new(Vec3::X, Vec3::Z, Vec2::X),
        ModelVertex::new(Vec3::Y, Vec3::Z, Vec2::Y),
    ];
    ModelData::new("triangle", vertices, vec![0, 1, 2])
}

pub fn flat_environment() -> EnvironmentMap {
    EnvironmentMap::from_texels("flat", 2, 1, vec![Vec3::splat(0.5); 2]).expect("valid texels")
}

/// Loader whose results are released by the test, one gate per asset kind.
pub struct ScriptedLoader {
    pub environment_gate: Mutex<Receiver<bool>>,
    pub model_gate: Mutex<Receiver<bool>>,
}

impl AssetLoader for ScriptedLoader {
    fn load_environment(&self, path: &Path) -> Result<EnvironmentMap, LoadError> {
        let succeed = self.environment_gate.lock().expect("gate").recv().unwrap_or(false);
        if succeed {
            Ok(flat_environment())
        } else {
            Err(LoadError::UnsupportedFormat { what: "environment", detail: path.display().to_string() })
        }
    }

    fn load_model(&self, path: &Path) -> Result<ModelData, LoadError> {
        let succeed = self.model_gate.lock().expect("gate").recv().unwrap_or(false);
        if succeed {
            Ok(triangle_model())
        } else {
            Err(LoadError::MissingMesh(path.to_path_buf()))
        }
    }
}
