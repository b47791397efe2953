use crate::assets::{AssetPipeline, FileAssetLoader};
use crate::config::{AppConfig, AppConfigOverrides, DEFAULT_CONFIG_PATH};
use crate::context::RenderContext;
use crate::frame_loop::{FrameLoop, WindowScheduler};
use crate::input::InputEvent;
use crate::renderer::{WgpuBackend, WindowSurface};
use crate::viewport::{DisplayMetrics, ResizeOutcome};

use anyhow::{Context, Result};
use glam::Vec2;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition};
use winit::event::{MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop, EventLoopProxy};
use winit::window::{Fullscreen, Window, WindowId};

/// Wakes the event loop from asset worker threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowcaseEvent {
    AssetReady,
}

pub async fn run() -> Result<()> {
    run_with_overrides(AppConfigOverrides::default()).await
}

pub async fn run_with_overrides(overrides: AppConfigOverrides) -> Result<()> {
    let config_path = overrides.config_path.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = AppConfig::load_or_default(&config_path);
    if !overrides.is_empty() {
        log::info!(target: "config", "CLI overrides: {}", overrides.applied_fields().join(", "));
    }
    config.apply_overrides(&overrides);

    let event_loop =
        EventLoop::<ShowcaseEvent>::with_user_event().build().context("Failed to create winit event loop")?;
    let mut app = App::new(config, event_loop.create_proxy())?;
    event_loop.run_app(&mut app).context("Event loop execution failed")?;
    app.finish()
}

pub struct App {
    config: AppConfig,
    assets: AssetPipeline,
    context: RenderContext,
    window: Option<Arc<Window>>,
    backend: Option<WgpuBackend>,
    frame_loop: Option<FrameLoop>,
    fatal: Option<anyhow::Error>,
}

impl App {
    pub fn new(config: AppConfig, proxy: EventLoopProxy<ShowcaseEvent>) -> Result<Self> {
        let context = RenderContext::new(&config)?;
        let proxy = Mutex::new(proxy);
        let mut assets = AssetPipeline::new(Arc::new(FileAssetLoader)).with_waker(move || {
            if let Ok(proxy) = proxy.lock() {
                // Fails only once the event loop has exited.
                let _ = proxy.send_event(ShowcaseEvent::AssetReady);
            }
        });
        assets.load_environment(config.assets.environment.clone());
        assets.load_model(config.assets.model.clone());
        Ok(Self { config, assets, context, window: None, backend: None, frame_loop: None, fatal: None })
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    fn finish(self) -> Result<()> {
        match self.fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!(target: "app", "{err:?}");
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn init_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_cfg = &self.config.window;
        let mut attrs = Window::default_attributes()
            .with_title(window_cfg.title.clone())
            .with_inner_size(LogicalSize::new(window_cfg.width, window_cfg.height))
            .with_transparent(true);
        if window_cfg.fullscreen {
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }
        let window = Arc::new(event_loop.create_window(attrs).context("Failed to create window")?);
        let surface = pollster::block_on(WindowSurface::new(window.clone(), window_cfg))?;
        let mut backend = WgpuBackend::new(surface, window_cfg.msaa_samples())?;

        let display = DisplayMetrics::from_physical(window.inner_size(), window.scale_factor());
        self.context.resize(display, &mut backend)?;

        let mut frame_loop = FrameLoop::new(Box::new(WindowScheduler::new(window.clone())));
        frame_loop.start();

        self.window = Some(window);
        self.backend = Some(backend);
        self.frame_loop = Some(frame_loop);
        Ok(())
    }

    fn handle_resize(&mut self, display: DisplayMetrics) -> Result<()> {
        let Some(backend) = self.backend.as_mut() else {
            return Ok(());
        };
        if let ResizeOutcome::Applied(target) = self.context.resize(display, backend)? {
            log::info!(
                target: "viewport",
                "resized to {}x{} @{}",
                target.width,
                target.height,
                target.pixel_ratio
            );
        }
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let (Some(frame_loop), Some(backend)) = (self.frame_loop.as_mut(), self.backend.as_mut()) else {
            return Ok(());
        };
        let dt = frame_loop.frame_delta();
        self.context.advance(dt);
        frame_loop.tick(&mut self.context, backend)
    }

    fn handle_input(&mut self, event_loop: &ActiveEventLoop, input: InputEvent) {
        match input {
            InputEvent::CursorPos { x, y } => {
                let scale = self.window.as_ref().map(|w| w.scale_factor()).unwrap_or(1.0);
                let logical = PhysicalPosition::new(x, y).to_logical::<f32>(scale);
                self.context.pointer_moved(Vec2::new(logical.x, logical.y));
            }
            InputEvent::MouseButton { button: MouseButton::Left, pressed } => self.context.pointer_button(pressed),
            InputEvent::Wheel { delta } => self.context.wheel(delta),
            InputEvent::Exit => event_loop.exit(),
            InputEvent::MouseButton { .. } | InputEvent::Other => {}
        }
    }
}

impl ApplicationHandler<ShowcaseEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init_window(event_loop) {
            self.fail(event_loop, err.context("Renderer initialization failed"));
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ShowcaseEvent) {
        match event {
            ShowcaseEvent::AssetReady => {
                let reports = self.assets.poll(self.context.scene_mut());
                if reports.iter().any(|report| report.is_attached()) {
                    if let Some(window) = self.window.as_ref() {
                        window.request_redraw();
                    }
                }
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };
        if id != window.id() {
            return;
        }
        match &event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                let display = DisplayMetrics::from_physical(*size, window.scale_factor());
                if let Err(err) = self.handle_resize(display) {
                    self.fail(event_loop, err);
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let display = DisplayMetrics::from_physical(window.inner_size(), *scale_factor);
                if let Err(err) = self.handle_resize(display) {
                    self.fail(event_loop, err);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw() {
                    self.fail(event_loop, err.context("Rendering failed"));
                }
            }
            other => self.handle_input(event_loop, InputEvent::from_window_event(other)),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(frame_loop) = self.frame_loop.as_mut() {
            frame_loop.stop();
            log::info!(target: "app", "exiting after {} frames", frame_loop.frames());
        }
        if self.assets.pending() > 0 {
            log::debug!(target: "app", "{} asset loads still in flight at exit", self.assets.pending());
        }
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("window", &self.window.as_ref().map(|w| w.id()))
            .field("assets", &self.assets)
            .field("fatal", &self.fatal.as_ref().map(|err| err.to_string()))
            .finish()
    }
}
