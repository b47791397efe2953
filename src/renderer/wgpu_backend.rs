use super::window_surface::WindowSurface;
use super::{ClearColor, EffectUniform, RenderBackend, ShaderEffect, DEPTH_FORMAT};
use crate::camera::CameraView;
use crate::environment::EnvironmentMap;
use crate::mesh::{ModelData, ModelVertex};
use crate::render_graph::BufferSlot;
use crate::scene::Scene;
use anyhow::{bail, Result};
use glam::Mat4;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

const ENVIRONMENT_INTENSITY: f32 = 1.0;

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct FrameUniform {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    base_color: [f32; 4],
    params: [f32; 4],
}

struct ColorTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Intermediate buffers at the render-target size. `screen` is blitted to the surface on present.
/// With MSAA the scene pass draws into `multisampled` and resolves into its slot.
struct OffscreenTargets {
    ping: ColorTarget,
    pong: ColorTarget,
    screen: ColorTarget,
    multisampled: Option<ColorTarget>,
    depth_view: wgpu::TextureView,
    size: PhysicalSize<u32>,
}

impl OffscreenTargets {
    fn new(device: &wgpu::Device, format: wgpu::TextureFormat, size: PhysicalSize<u32>, sample_count: u32) -> Self {
        let size = PhysicalSize::new(size.width.max(1), size.height.max(1));
        let multisampled =
            (sample_count > 1).then(|| create_color_target(device, "Scene MSAA Target", format, size, sample_count));
        Self {
            ping: create_color_target(device, "Ping Target", format, size, 1),
            pong: create_color_target(device, "Pong Target", format, size, 1),
            screen: create_color_target(device, "Screen Target", format, size, 1),
            multisampled,
            depth_view: create_depth_view(device, size, sample_count),
            size,
        }
    }

    /// Colour attachment for the scene pass writing `slot`.
    fn scene_attachment(&self, slot: BufferSlot, clear: wgpu::Color) -> wgpu::RenderPassColorAttachment<'_> {
        let load = wgpu::LoadOp::Clear(clear);
        match self.multisampled.as_ref() {
            Some(msaa) => wgpu::RenderPassColorAttachment {
                view: &msaa.view,
                depth_slice: None,
                resolve_target: Some(self.view(slot)),
                ops: wgpu::Operations { load, store: wgpu::StoreOp::Discard },
            },
            None => wgpu::RenderPassColorAttachment {
                view: self.view(slot),
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations { load, store: wgpu::StoreOp::Store },
            },
        }
    }

    fn view(&self, slot: BufferSlot) -> &wgpu::TextureView {
        match slot {
            BufferSlot::Ping => &self.ping.view,
            BufferSlot::Pong => &self.pong.view,
            BufferSlot::Screen => &self.screen.view,
        }
    }
}

struct GpuModel {
    data: Arc<ModelData>,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    material_bg: wgpu::BindGroup,
}

struct FrameState {
    encoder: wgpu::CommandEncoder,
    effects_recorded: usize,
}

/// wgpu implementation of [`RenderBackend`]. Commands for a frame are recorded into one
/// encoder and submitted by `present`.
pub struct WgpuBackend {
    surface: WindowSurface,
    model_pipeline: wgpu::RenderPipeline,
    rgb_shift_pipeline: wgpu::RenderPipeline,
    blit_pipeline: wgpu::RenderPipeline,
    material_bgl: wgpu::BindGroupLayout,
    environment_bgl: wgpu::BindGroupLayout,
    post_bgl: wgpu::BindGroupLayout,
    frame_buffer: wgpu::Buffer,
    frame_bg: wgpu::BindGroup,
    linear_sampler: wgpu::Sampler,
    environment_sampler: wgpu::Sampler,
    fallback_material_bg: wgpu::BindGroup,
    fallback_environment_bg: wgpu::BindGroup,
    environment_bg: Option<wgpu::BindGroup>,
    model: Option<GpuModel>,
    uploaded_revision: Option<u64>,
    effect_buffers: Vec<wgpu::Buffer>,
    blit_uniform: wgpu::Buffer,
    targets: OffscreenTargets,
    sample_count: u32,
    frame: Option<FrameState>,
}

/// Sample count the scene pass can actually use for `requested` given the surface format's features.
pub(crate) fn supported_sample_count(requested: u32, features: wgpu::TextureFormatFeatureFlags) -> u32 {
    if requested <= 1 {
        return 1;
    }
    // Anything above one sample is served as 4x; higher counts need adapter-specific features.
    let needed = wgpu::TextureFormatFeatureFlags::MULTISAMPLE_X4 | wgpu::TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE;
    if features.contains(needed) {
        4
    } else {
        1
    }
}

impl WgpuBackend {
    pub fn new(surface: WindowSurface, msaa_samples: u32) -> Result<Self> {
        let device = surface.device();
        let format = surface.format();
        let sample_count = supported_sample_count(msaa_samples, surface.format_features());
        if sample_count != msaa_samples {
            log::warn!(
                target: "render",
                "{msaa_samples}x MSAA unavailable for {format:?}; scene pass uses {sample_count}x"
            );
        } else {
            log::info!(target: "render", "scene pass sample count {sample_count}");
        }

        let frame_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Frame BGL"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT)],
        });
        let material_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Model Material BGL"),
            entries: &[texture_entry(0), sampler_entry(1)],
        });
        let environment_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Environment BGL"),
            entries: &[texture_entry(0), sampler_entry(1)],
        });
        let post_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Post BGL"),
            entries: &[texture_entry(0), sampler_entry(1), uniform_entry(2, wgpu::ShaderStages::FRAGMENT)],
        });

        let model_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Model Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../assets/shaders/model.wgsl").into()),
        });
        let post_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Post Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../assets/shaders/post.wgsl").into()),
        });

        let model_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Model Pipeline Layout"),
            bind_group_layouts: &[&frame_bgl, &material_bgl, &environment_bgl],
            push_constant_ranges: &[],
        });
        let model_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Model Pipeline"),
            layout: Some(&model_layout),
            vertex: wgpu::VertexState {
                module: &model_shader,
                entry_point: Some("vs_main"),
                buffers: &[ModelVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &model_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState { count: sample_count, mask: !0, alpha_to_coverage_enabled: false },
            multiview: None,
            cache: None,
        });

        let post_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Post Pipeline Layout"),
            bind_group_layouts: &[&post_bgl],
            push_constant_ranges: &[],
        });
        let rgb_shift_pipeline =
            create_fullscreen_pipeline(device, &post_layout, &post_shader, "fs_rgb_shift", format, "RGB Shift");
        let blit_pipeline = create_fullscreen_pipeline(device, &post_layout, &post_shader, "fs_blit", format, "Blit");

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Model Frame Buffer"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Model Frame BG"),
            layout: &frame_bgl,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: frame_buffer.as_entire_binding() }],
        });
        let blit_uniform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Blit Uniform"),
            contents: bytemuck::bytes_of(&EffectUniform { params: [0.0; 4] }),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let linear_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Linear Clamp Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let environment_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Environment Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let white = create_rgba8_texture(device, surface.queue(), "Fallback Base Color", 1, 1, &[255; 4]);
        let fallback_material_bg =
            texture_bind_group(device, &material_bgl, "Fallback Material BG", &white, &linear_sampler);
        let black = create_rgba16f_texture(device, surface.queue(), "Fallback Environment", 1, 1, &[0; 4]);
        let fallback_environment_bg =
            texture_bind_group(device, &environment_bgl, "Fallback Environment BG", &black, &environment_sampler);

        let targets = OffscreenTargets::new(device, format, surface.size(), sample_count);

        Ok(Self {
            surface,
            model_pipeline,
            rgb_shift_pipeline,
            blit_pipeline,
            material_bgl,
            environment_bgl,
            post_bgl,
            frame_buffer,
            frame_bg,
            linear_sampler,
            environment_sampler,
            fallback_material_bg,
            fallback_environment_bg,
            environment_bg: None,
            model: None,
            uploaded_revision: None,
            effect_buffers: Vec::new(),
            blit_uniform,
            targets,
            sample_count,
            frame: None,
        })
    }

    fn begin_frame(&mut self) -> FrameState {
        if let Some(frame) = self.frame.take() {
            return frame;
        }
        let encoder = self
            .surface
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Showcase Frame Encoder") });
        FrameState { encoder, effects_recorded: 0 }
    }

    fn sync_scene(&mut self, scene: &Scene) {
        if self.uploaded_revision == Some(scene.revision()) {
            return;
        }
        self.uploaded_revision = Some(scene.revision());
        self.environment_bg = scene.environment().and_then(|env| self.upload_environment(env));
        let needs_model_upload = match (scene.model(), self.model.as_ref()) {
            (Some(model), Some(gpu)) => !Arc::ptr_eq(model.data(), &gpu.data),
            (Some(_), None) => true,
            (None, _) => false,
        };
        if needs_model_upload {
            self.model = scene.model().map(|model| self.upload_model(model.data()));
        } else if scene.model().is_none() {
            self.model = None;
        }
    }

    fn upload_environment(&self, env: &EnvironmentMap) -> Option<wgpu::BindGroup> {
        let device = self.surface.device();
        let max = device.limits().max_texture_dimension_2d;
        if env.width() > max || env.height() > max {
            log::warn!(
                target: "render",
                "environment '{}' is {}x{}, above the device limit of {max}; skipping upload",
                env.label(),
                env.width(),
                env.height()
            );
            return None;
        }
        let texels = env.to_rgba_f16();
        let view = create_rgba16f_texture(
            device,
            self.surface.queue(),
            "Environment Texture",
            env.width(),
            env.height(),
            &texels,
        );
        log::debug!(target: "render", "uploaded environment '{}'", env.label());
        Some(texture_bind_group(device, &self.environment_bgl, "Environment BG", &view, &self.environment_sampler))
    }

    fn upload_model(&self, data: &Arc<ModelData>) -> GpuModel {
        let device = self.surface.device();
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model VB"),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Model IB"),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let material_bg = match data.base_color_texture.as_ref() {
            Some(texture) => {
                let view = create_rgba8_texture(
                    device,
                    self.surface.queue(),
                    "Model Base Color",
                    texture.width,
                    texture.height,
                    &texture.rgba,
                );
                texture_bind_group(device, &self.material_bgl, "Model Material BG", &view, &self.linear_sampler)
            }
            None => self.fallback_material_bg.clone(),
        };
        log::debug!(target: "render", "uploaded model '{}' ({} indices)", data.label, data.indices.len());
        GpuModel {
            data: Arc::clone(data),
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
            material_bg,
        }
    }

    fn effect_buffer(&mut self, index: usize) -> &wgpu::Buffer {
        while self.effect_buffers.len() <= index {
            let buffer = self.surface.device().create_buffer(&wgpu::BufferDescriptor {
                label: Some("Effect Uniform"),
                size: std::mem::size_of::<EffectUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.effect_buffers.push(buffer);
        }
        &self.effect_buffers[index]
    }

    fn post_bind_group(&self, source: &wgpu::TextureView, uniform: &wgpu::Buffer) -> wgpu::BindGroup {
        self.surface.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Post BG"),
            layout: &self.post_bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(source) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(&self.linear_sampler) },
                wgpu::BindGroupEntry { binding: 2, resource: uniform.as_entire_binding() },
            ],
        })
    }
}

impl RenderBackend for WgpuBackend {
    fn resize(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        self.surface.resize_to_window();
        if size != self.targets.size {
            self.targets =
                OffscreenTargets::new(self.surface.device(), self.surface.format(), size, self.sample_count);
        }
        Ok(())
    }

    fn draw_scene(
        &mut self,
        scene: &Scene,
        camera: &CameraView,
        clear: ClearColor,
        target: BufferSlot,
    ) -> Result<()> {
        self.sync_scene(scene);
        let model = scene.model();
        let uniform = FrameUniform {
            view_proj: camera.view_projection().to_cols_array_2d(),
            model: model.map(|m| m.transform()).unwrap_or(Mat4::IDENTITY).to_cols_array_2d(),
            camera_pos: camera.position.extend(1.0).to_array(),
            base_color: self.model.as_ref().map(|m| m.data.base_color_factor).unwrap_or([1.0; 4]),
            params: [if self.environment_bg.is_some() { 1.0 } else { 0.0 }, ENVIRONMENT_INTENSITY, 0.0, 0.0],
        };
        self.surface.queue().write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&uniform));

        let mut frame = self.begin_frame();
        {
            let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(self.targets.scene_attachment(target, clear.to_wgpu()))],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.targets.depth_view,
                    depth_ops: Some(wgpu::Operations { load: wgpu::LoadOp::Clear(1.0), store: wgpu::StoreOp::Store }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            if let (Some(_), Some(gpu)) = (model, self.model.as_ref()) {
                let environment_bg = self.environment_bg.as_ref().unwrap_or(&self.fallback_environment_bg);
                pass.set_pipeline(&self.model_pipeline);
                pass.set_bind_group(0, &self.frame_bg, &[]);
                pass.set_bind_group(1, &gpu.material_bg, &[]);
                pass.set_bind_group(2, environment_bg, &[]);
                pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
                pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..gpu.index_count, 0, 0..1);
            }
        }
        self.frame = Some(frame);
        Ok(())
    }

    fn apply_effect(&mut self, effect: &ShaderEffect, source: BufferSlot, target: BufferSlot) -> Result<()> {
        if source == target {
            bail!("effect '{}' cannot read and write {source:?}", effect.label());
        }
        let mut frame = self.begin_frame();
        let index = frame.effects_recorded;
        frame.effects_recorded += 1;
        let uniform = effect.uniform();
        let buffer = self.effect_buffer(index).clone();
        self.surface.queue().write_buffer(&buffer, 0, bytemuck::bytes_of(&uniform));
        let bind_group = self.post_bind_group(self.targets.view(source), &buffer);
        let pipeline = match effect {
            ShaderEffect::RgbShift { .. } => &self.rgb_shift_pipeline,
        };
        {
            let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(effect.label()),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: self.targets.view(target),
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.frame = Some(frame);
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        let Some(mut frame) = self.frame.take() else {
            return Ok(());
        };
        let Some(surface_frame) = self.surface.acquire()? else {
            // Surface was reconfigured; drop this frame's commands.
            return Ok(());
        };
        let bind_group = self.post_bind_group(&self.targets.screen.view, &self.blit_uniform);
        {
            let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Present Blit"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: surface_frame.view(),
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Clear(wgpu::Color::BLACK), store: wgpu::StoreOp::Store },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.blit_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        self.surface.queue().submit(std::iter::once(frame.encoder.finish()));
        surface_frame.present();
        Ok(())
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(view) },
            wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::Sampler(sampler) },
        ],
    })
}

fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_fullscreen"),
            buffers: &[],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(wgpu::ColorTargetState { format, blend: None, write_mask: wgpu::ColorWrites::ALL })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState { topology: wgpu::PrimitiveTopology::TriangleList, ..Default::default() },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_color_target(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    size: PhysicalSize<u32>,
    sample_count: u32,
) -> ColorTarget {
    // Multisampled targets are only ever resolved, never sampled.
    let usage = if sample_count > 1 {
        wgpu::TextureUsages::RENDER_ATTACHMENT
    } else {
        wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d { width: size.width, height: size.height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    ColorTarget { _texture: texture, view }
}

fn create_depth_view(device: &wgpu::Device, size: PhysicalSize<u32>, sample_count: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d { width: size.width, height: size.height, depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn create_rgba8_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    rgba: &[u8],
) -> wgpu::TextureView {
    create_texture_with_data(device, queue, label, width, height, wgpu::TextureFormat::Rgba8UnormSrgb, 4, rgba)
}

fn create_rgba16f_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    texels: &[u16],
) -> wgpu::TextureView {
    create_texture_with_data(
        device,
        queue,
        label,
        width,
        height,
        wgpu::TextureFormat::Rgba16Float,
        8,
        bytemuck::cast_slice(texels),
    )
}

#[allow(clippy::too_many_arguments)]
fn create_texture_with_data(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    bytes_per_texel: u32,
    data: &[u8],
) -> wgpu::TextureView {
    let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::TexelCopyBufferLayout { offset: 0, bytes_per_row: Some(bytes_per_texel * width), rows_per_image: Some(height) },
        size,
    );
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
