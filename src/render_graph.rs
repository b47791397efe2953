use crate::camera::{CameraView, PerspectiveCamera};
use crate::renderer::{ClearColor, RenderBackend, ShaderEffect};
use crate::scene::Scene;
use anyhow::{anyhow, Result};
use thiserror::Error;
use winit::dpi::PhysicalSize;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderGraphError {
    #[error("render graph needs at least one pass")]
    Empty,
    #[error("first pass '{0}' does not draw the scene")]
    SceneNotFirst(String),
    #[error("pass '{label}' at index {index} draws the scene and would discard the previous output")]
    SceneAfterFirst { label: String, index: usize },
}

/// Where a pass reads from or writes to. `Screen` is the presentable surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferSlot {
    Ping,
    Pong,
    Screen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassIo {
    /// `None` for the scene pass, which reads the scene instead of a buffer.
    pub source: Option<BufferSlot>,
    pub target: BufferSlot,
}

pub struct FrameInputs<'a> {
    pub scene: &'a Scene,
    pub camera: CameraView,
    pub size: PhysicalSize<u32>,
}

pub trait RenderPass {
    fn label(&self) -> &str;
    fn size(&self) -> PhysicalSize<u32>;
    fn resize(&mut self, size: PhysicalSize<u32>);
    fn execute(&mut self, frame: &FrameInputs<'_>, io: PassIo, backend: &mut dyn RenderBackend) -> Result<()>;

    fn reads_scene(&self) -> bool {
        false
    }

    fn effect_mut(&mut self) -> Option<&mut ShaderEffect> {
        None
    }
}

/// Draws the scene through the camera.
#[derive(Debug)]
pub struct ScenePass {
    size: PhysicalSize<u32>,
    clear: ClearColor,
}

impl ScenePass {
    pub fn new(clear: ClearColor) -> Self {
        Self { size: PhysicalSize::new(1, 1), clear }
    }
}

impl RenderPass for ScenePass {
    fn label(&self) -> &str {
        "scene"
    }

    fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.size = size;
    }

    fn execute(&mut self, frame: &FrameInputs<'_>, io: PassIo, backend: &mut dyn RenderBackend) -> Result<()> {
        backend.draw_scene(frame.scene, &frame.camera, self.clear, io.target)
    }

    fn reads_scene(&self) -> bool {
        true
    }
}

/// Full-screen effect reading the previous pass's output.
#[derive(Debug)]
pub struct ShaderPass {
    label: String,
    size: PhysicalSize<u32>,
    effect: ShaderEffect,
}

impl ShaderPass {
    pub fn new(label: impl Into<String>, effect: ShaderEffect) -> Self {
        Self { label: label.into(), size: PhysicalSize::new(1, 1), effect }
    }

    pub fn rgb_shift(amount: f32, angle: f32) -> Self {
        Self::new("rgb_shift", ShaderEffect::RgbShift { amount, angle })
    }

    pub fn effect(&self) -> &ShaderEffect {
        &self.effect
    }
}

impl RenderPass for ShaderPass {
    fn label(&self) -> &str {
        &self.label
    }

    fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.size = size;
    }

    fn execute(&mut self, _frame: &FrameInputs<'_>, io: PassIo, backend: &mut dyn RenderBackend) -> Result<()> {
        let source = io.source.ok_or_else(|| anyhow!("pass '{}' has no input buffer", self.label))?;
        backend.apply_effect(&self.effect, source, io.target)
    }

    fn effect_mut(&mut self) -> Option<&mut ShaderEffect> {
        Some(&mut self.effect)
    }
}

/// Ordered pass chain executed once per frame against ping-ponged buffers.
pub struct RenderGraph {
    passes: Vec<Box<dyn RenderPass>>,
    size: PhysicalSize<u32>,
}

impl RenderGraph {
    pub fn builder() -> RenderGraphBuilder {
        RenderGraphBuilder::default()
    }

    pub fn new(passes: Vec<Box<dyn RenderPass>>) -> Result<Self, RenderGraphError> {
        let first = passes.first().ok_or(RenderGraphError::Empty)?;
        if !first.reads_scene() {
            return Err(RenderGraphError::SceneNotFirst(first.label().to_string()));
        }
        if let Some((index, pass)) = passes.iter().enumerate().skip(1).find(|(_, pass)| pass.reads_scene()) {
            return Err(RenderGraphError::SceneAfterFirst { label: pass.label().to_string(), index });
        }
        Ok(Self { passes, size: PhysicalSize::new(1, 1) })
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn passes(&self) -> impl Iterator<Item = &dyn RenderPass> {
        self.passes.iter().map(|pass| pass.as_ref())
    }

    pub fn pass_labels(&self) -> Vec<&str> {
        self.passes.iter().map(|pass| pass.label()).collect()
    }

    pub fn effect_mut(&mut self, label: &str) -> Option<&mut ShaderEffect> {
        self.passes.iter_mut().find(|pass| pass.label() == label).and_then(|pass| pass.effect_mut())
    }

    /// Slot wiring for pass `index`: the last pass writes the screen, earlier ones alternate.
    pub fn io_for(&self, index: usize) -> PassIo {
        let target = if index + 1 == self.passes.len() {
            BufferSlot::Screen
        } else if index % 2 == 0 {
            BufferSlot::Ping
        } else {
            BufferSlot::Pong
        };
        let source = if index == 0 {
            None
        } else if (index - 1) % 2 == 0 {
            Some(BufferSlot::Ping)
        } else {
            Some(BufferSlot::Pong)
        };
        PassIo { source, target }
    }

    pub fn resize(&mut self, size: PhysicalSize<u32>, backend: &mut dyn RenderBackend) -> Result<()> {
        backend.resize(size)?;
        for pass in &mut self.passes {
            pass.resize(size);
        }
        self.size = size;
        Ok(())
    }

    /// Runs every pass once in order and presents exactly once.
    pub fn render(
        &mut self,
        scene: &Scene,
        camera: &mut PerspectiveCamera,
        backend: &mut dyn RenderBackend,
    ) -> Result<()> {
        let frame = FrameInputs { scene, camera: camera.view(), size: self.size };
        for index in 0..self.passes.len() {
            let io = self.io_for(index);
            self.passes[index].execute(&frame, io, backend)?;
        }
        backend.present()
    }
}

#[derive(Default)]
pub struct RenderGraphBuilder {
    passes: Vec<Box<dyn RenderPass>>,
}

impl RenderGraphBuilder {
    pub fn pass(mut self, pass: impl RenderPass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn build(self) -> Result<RenderGraph, RenderGraphError> {
        RenderGraph::new(self.passes)
    }
}
