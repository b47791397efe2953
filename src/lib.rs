pub mod app;
pub mod assets;
pub mod camera;
pub mod cli;
pub mod config;
pub mod context;
pub mod environment;
pub mod frame_loop;
pub mod input;
pub mod mesh;
pub mod orbit;
pub mod render_graph;
pub mod renderer;
pub mod scene;
pub mod viewport;

pub use app::{run, run_with_overrides, App};
