mod common;

use common::{BackendCall, RecordingBackend};
use scene_showcase::config::AppConfig;
use scene_showcase::context::RenderContext;
use scene_showcase::frame_loop::{FrameLoop, FrameScheduler};
use scene_showcase::render_graph::BufferSlot;
use scene_showcase::renderer::ShaderEffect;
use scene_showcase::viewport::DisplayMetrics;
use std::cell::Cell;
use std::rc::Rc;

struct CountingScheduler(Rc<Cell<usize>>);

impl FrameScheduler for CountingScheduler {
    fn schedule(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

fn setup(config: &AppConfig) -> (RenderContext, RecordingBackend) {
    let mut ctx = RenderContext::new(config).expect("context");
    let mut backend = RecordingBackend::new();
    ctx.resize(DisplayMetrics::new(640.0, 480.0, 1.0), &mut backend).expect("resize");
    backend.clear();
    (ctx, backend)
}

#[test]
fn each_tick_renders_one_frame_and_schedules_the_next() {
    let (mut ctx, mut backend) = setup(&AppConfig::default());
    let scheduled = Rc::new(Cell::new(0));
    let mut frame_loop = FrameLoop::new(Box::new(CountingScheduler(scheduled.clone())));

    frame_loop.tick(&mut ctx, &mut backend).expect("idle tick");
    assert_eq!(backend.presents(), 0, "nothing renders before start");

    frame_loop.start();
    assert_eq!(scheduled.get(), 1);
    for _ in 0..3 {
        frame_loop.tick(&mut ctx, &mut backend).expect("tick");
    }
    assert_eq!(frame_loop.frames(), 3);
    assert_eq!(backend.presents(), 3);
    assert_eq!(scheduled.get(), 4);

    frame_loop.stop();
    frame_loop.tick(&mut ctx, &mut backend).expect("stopped tick");
    assert_eq!(backend.presents(), 3);
    assert_eq!(scheduled.get(), 4);
}

#[test]
fn post_chain_runs_scene_into_ping_then_effect_onto_screen() {
    let (mut ctx, mut backend) = setup(&AppConfig::default());
    ctx.render_frame(&mut backend).expect("render");
    assert_eq!(backend.calls.len(), 3);
    assert!(matches!(backend.calls[0], BackendCall::DrawScene { target: BufferSlot::Ping, .. }));
    assert!(matches!(
        backend.calls[1],
        BackendCall::ApplyEffect {
            effect: ShaderEffect::RgbShift { .. },
            source: BufferSlot::Ping,
            target: BufferSlot::Screen
        }
    ));
    assert_eq!(backend.calls[2], BackendCall::Present);
}

#[test]
fn without_post_the_scene_draws_straight_to_screen() {
    let mut config = AppConfig::default();
    config.post.enabled = false;
    let (mut ctx, mut backend) = setup(&config);
    ctx.render_frame(&mut backend).expect("render");
    assert!(matches!(backend.calls[0], BackendCall::DrawScene { target: BufferSlot::Screen, .. }));
    assert_eq!(backend.calls[1..], [BackendCall::Present]);
}

#[test]
fn render_failure_stops_the_loop() {
    let (mut ctx, mut backend) = setup(&AppConfig::default());
    let scheduled = Rc::new(Cell::new(0));
    let mut frame_loop = FrameLoop::new(Box::new(CountingScheduler(scheduled.clone())));
    frame_loop.start();
    frame_loop.tick(&mut ctx, &mut backend).expect("first frame");

    backend.fail_draws = true;
    let err = frame_loop.tick(&mut ctx, &mut backend).expect_err("draw failure surfaces");
    assert!(err.to_string().contains("device lost"));
    assert!(!frame_loop.is_running());
    assert_eq!(frame_loop.frames(), 1);
    assert_eq!(scheduled.get(), 2, "no frame scheduled after the failure");

    backend.fail_draws = false;
    frame_loop.tick(&mut ctx, &mut backend).expect("stopped tick");
    assert_eq!(backend.presents(), 1);
}
