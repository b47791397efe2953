use crate::camera::PerspectiveCamera;
use crate::config::{AppConfig, PostConfig};
use crate::input::{InputMapper, PointerOutcome};
use crate::orbit::OrbitControls;
use crate::render_graph::{RenderGraph, RenderGraphError, ScenePass, ShaderPass};
use crate::renderer::{ClearColor, RenderBackend};
use crate::scene::Scene;
use crate::viewport::{DisplayMetrics, ResizeOutcome, ViewportController};
use anyhow::{Context, Result};
use glam::Vec2;

/// Everything one showcase viewport needs between frames.
pub struct RenderContext {
    scene: Scene,
    camera: PerspectiveCamera,
    viewport: ViewportController,
    graph: RenderGraph,
    input: InputMapper,
    orbit: Option<OrbitControls>,
    display: Option<DisplayMetrics>,
    last_pointer: Option<Vec2>,
}

impl RenderContext {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let graph = Self::build_graph(&config.post).context("Failed to build render graph")?;
        let camera = PerspectiveCamera::from_config(&config.camera);
        let orbit = config.features.orbit_controls.then(|| OrbitControls::new(&config.orbit, &camera));
        log::info!(
            target: "render",
            "render graph: {} (orbit controls {})",
            graph.pass_labels().join(" -> "),
            if orbit.is_some() { "on" } else { "off" }
        );
        Ok(Self {
            scene: Scene::new(),
            camera,
            viewport: ViewportController::new(config.viewport.max_pixel_ratio),
            graph,
            input: InputMapper::from_config(&config.input),
            orbit,
            display: None,
            last_pointer: None,
        })
    }

    pub fn build_graph(post: &PostConfig) -> Result<RenderGraph, RenderGraphError> {
        let mut builder = RenderGraph::builder().pass(ScenePass::new(ClearColor::from_array(post.clear_color)));
        if post.enabled {
            builder = builder.pass(ShaderPass::rgb_shift(post.rgb_shift_amount, post.rgb_shift_angle));
        }
        builder.build()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn graph(&self) -> &RenderGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut RenderGraph {
        &mut self.graph
    }

    pub fn input(&self) -> &InputMapper {
        &self.input
    }

    pub fn orbit(&self) -> Option<&OrbitControls> {
        self.orbit.as_ref()
    }

    pub fn display(&self) -> Option<DisplayMetrics> {
        self.display
    }

    pub fn resize(&mut self, display: DisplayMetrics, backend: &mut dyn RenderBackend) -> Result<ResizeOutcome> {
        let outcome = self.viewport.on_resize(display, &mut self.camera, &mut self.graph, backend)?;
        if let ResizeOutcome::Applied(_) = outcome {
            self.display = Some(display);
        }
        Ok(outcome)
    }

    /// `position` in logical pixels.
    pub fn pointer_moved(&mut self, position: Vec2) -> PointerOutcome {
        self.last_pointer = Some(position);
        let Some(display) = self.display else {
            return PointerOutcome::Ignored;
        };
        if let Some(orbit) = self.orbit.as_mut() {
            orbit.pointer_moved(position, &display);
        }
        self.input.on_pointer_move(position, &display, &self.scene)
    }

    pub fn pointer_button(&mut self, pressed: bool) {
        if let Some(orbit) = self.orbit.as_mut() {
            orbit.pointer_pressed(pressed, self.last_pointer);
        }
    }

    pub fn wheel(&mut self, delta: f32) {
        if let Some(orbit) = self.orbit.as_mut() {
            orbit.zoom(delta);
        }
    }

    /// Per-frame animation step: eases the model and applies orbit damping.
    pub fn advance(&mut self, dt: f32) {
        self.input.advance(dt, &mut self.scene);
        if let Some(orbit) = self.orbit.as_mut() {
            orbit.update(&mut self.camera);
        }
    }

    pub fn render_frame(&mut self, backend: &mut dyn RenderBackend) -> Result<()> {
        self.graph.render(&self.scene, &mut self.camera, backend)
    }
}
