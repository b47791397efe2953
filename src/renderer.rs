use crate::camera::CameraView;
use crate::render_graph::BufferSlot;
use crate::scene::Scene;
use anyhow::Result;
use winit::dpi::PhysicalSize;

mod wgpu_backend;
mod window_surface;

pub use wgpu_backend::WgpuBackend;
pub use window_surface::{SurfaceFrame, WindowSurface};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ClearColor {
    pub const TRANSPARENT: Self = Self { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };

    pub fn from_array(rgba: [f32; 4]) -> Self {
        Self { r: rgba[0], g: rgba[1], b: rgba[2], a: rgba[3] }
    }

    fn to_wgpu(self) -> wgpu::Color {
        wgpu::Color { r: self.r as f64, g: self.g as f64, b: self.b as f64, a: self.a as f64 }
    }
}

/// Parameters of a full-screen post effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShaderEffect {
    /// Offsets the red and blue channels in opposite directions along `angle`.
    RgbShift { amount: f32, angle: f32 },
}

#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct EffectUniform {
    pub params: [f32; 4],
}

impl ShaderEffect {
    pub fn label(&self) -> &'static str {
        match self {
            ShaderEffect::RgbShift { .. } => "rgb_shift",
        }
    }

    pub(crate) fn uniform(&self) -> EffectUniform {
        match *self {
            ShaderEffect::RgbShift { amount, angle } => EffectUniform { params: [amount, angle, 0.0, 0.0] },
        }
    }
}

/// The drawing surface the render graph talks to. Calls for one frame arrive in pass
/// order and end with a single `present`.
pub trait RenderBackend {
    fn resize(&mut self, size: PhysicalSize<u32>) -> Result<()>;
    fn draw_scene(&mut self, scene: &Scene, camera: &CameraView, clear: ClearColor, target: BufferSlot)
        -> Result<()>;
    fn apply_effect(&mut self, effect: &ShaderEffect, source: BufferSlot, target: BufferSlot) -> Result<()>;
    fn present(&mut self) -> Result<()>;
}
