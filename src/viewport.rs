use crate::camera::PerspectiveCamera;
use crate::render_graph::RenderGraph;
use crate::renderer::RenderBackend;
use anyhow::Result;
use winit::dpi::PhysicalSize;

pub const DEFAULT_MAX_PIXEL_RATIO: f32 = 2.0;

/// Display size in logical units plus the host's device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMetrics {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl DisplayMetrics {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self { width, height, device_pixel_ratio }
    }

    pub fn from_physical(size: PhysicalSize<u32>, scale_factor: f64) -> Self {
        let scale = if scale_factor.is_finite() && scale_factor > 0.0 { scale_factor } else { 1.0 };
        let logical = size.to_logical::<f64>(scale);
        Self { width: logical.width as f32, height: logical.height as f32, device_pixel_ratio: scale as f32 }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderTarget {
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
}

impl RenderTarget {
    /// Backing buffer size in physical pixels, never smaller than 1x1.
    pub fn buffer_size(&self) -> PhysicalSize<u32> {
        let w = (self.width * self.pixel_ratio).round().max(1.0) as u32;
        let h = (self.height * self.pixel_ratio).round().max(1.0) as u32;
        PhysicalSize::new(w, h)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeOutcome {
    Applied(RenderTarget),
    /// Zero-area display; nothing was touched and the next valid resize applies normally.
    Deferred,
}

#[derive(Debug)]
pub struct ViewportController {
    max_pixel_ratio: f32,
    target: Option<RenderTarget>,
}

impl ViewportController {
    pub fn new(max_pixel_ratio: f32) -> Self {
        let max_pixel_ratio =
            if max_pixel_ratio.is_finite() && max_pixel_ratio > 0.0 { max_pixel_ratio } else { DEFAULT_MAX_PIXEL_RATIO };
        Self { max_pixel_ratio, target: None }
    }

    pub fn max_pixel_ratio(&self) -> f32 {
        self.max_pixel_ratio
    }

    pub fn target(&self) -> Option<RenderTarget> {
        self.target
    }

    pub fn clamp_pixel_ratio(&self, device_pixel_ratio: f32) -> f32 {
        if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio.min(self.max_pixel_ratio)
        } else {
            1.0
        }
    }

    /// Reconciles camera aspect, render target and pass buffers with the display.
    pub fn on_resize(
        &mut self,
        display: DisplayMetrics,
        camera: &mut PerspectiveCamera,
        graph: &mut RenderGraph,
        backend: &mut dyn RenderBackend,
    ) -> Result<ResizeOutcome> {
        if display.is_degenerate() {
            log::debug!(
                target: "viewport",
                "deferring resize for degenerate display {}x{}",
                display.width,
                display.height
            );
            return Ok(ResizeOutcome::Deferred);
        }
        let target = RenderTarget {
            width: display.width,
            height: display.height,
            pixel_ratio: self.clamp_pixel_ratio(display.device_pixel_ratio),
        };
        let buffer = target.buffer_size();
        // Nothing observable changes unless the backend accepted the new size.
        graph.resize(buffer, backend)?;
        camera.set_aspect(display.aspect());
        self.target = Some(target);
        log::debug!(
            target: "viewport",
            "viewport {}x{} @{} -> buffer {}x{}",
            target.width,
            target.height,
            target.pixel_ratio,
            buffer.width,
            buffer.height
        );
        Ok(ResizeOutcome::Applied(target))
    }
}

impl Default for ViewportController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PIXEL_RATIO)
    }
}
