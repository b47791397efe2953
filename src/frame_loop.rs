use crate::context::RenderContext;
use crate::renderer::RenderBackend;
use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::window::Window;

/// Longest frame delta handed to animation; longer stalls are clamped.
const MAX_FRAME_DELTA: Duration = Duration::from_millis(250);

/// Asks the host for one more frame at the next display refresh.
pub trait FrameScheduler {
    fn schedule(&mut self);
}

pub struct WindowScheduler {
    window: Arc<Window>,
}

impl WindowScheduler {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }
}

impl FrameScheduler for WindowScheduler {
    fn schedule(&mut self) {
        self.window.request_redraw();
    }
}

pub struct FrameClock {
    start: Instant,
    last: Instant,
    delta: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self { start: now, last: now, delta: Duration::ZERO }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advances the clock and returns the clamped delta in seconds.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        self.delta = (now - self.last).min(MAX_FRAME_DELTA);
        self.last = now;
        self.delta.as_secs_f32()
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed_seconds(&self) -> f32 {
        self.last.duration_since(self.start).as_secs_f32()
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders exactly one frame per tick and re-schedules itself until stopped or a render fails.
pub struct FrameLoop {
    scheduler: Box<dyn FrameScheduler>,
    clock: FrameClock,
    running: bool,
    frames: u64,
}

impl FrameLoop {
    pub fn new(scheduler: Box<dyn FrameScheduler>) -> Self {
        Self { scheduler, clock: FrameClock::new(), running: false, frames: 0 }
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.clock.reset();
        self.scheduler.schedule();
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Seconds since the previous frame, for the caller to advance animation with.
    pub fn frame_delta(&mut self) -> f32 {
        self.clock.tick()
    }

    pub fn tick(&mut self, ctx: &mut RenderContext, backend: &mut dyn RenderBackend) -> Result<()> {
        if !self.running {
            return Ok(());
        }
        if let Err(err) = ctx.render_frame(backend) {
            self.running = false;
            log::error!(target: "render", "frame {} failed, stopping frame loop: {err:?}", self.frames);
            return Err(err);
        }
        self.frames += 1;
        self.scheduler.schedule();
        Ok(())
    }
}
