use crate::environment::EnvironmentMap;
use crate::mesh::ModelData;
use crate::scene::{Model, Scene};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("glTF import failed: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("{} contains no triangle meshes", .0.display())]
    MissingMesh(PathBuf),
    #[error("unsupported {what}: {detail}")]
    UnsupportedFormat { what: &'static str, detail: String },
    #[error("asset worker unavailable: {0}")]
    WorkerUnavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Environment,
    Model,
}

impl AssetKind {
    pub fn label(self) -> &'static str {
        match self {
            AssetKind::Environment => "environment",
            AssetKind::Model => "model",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decodes asset files. Called from worker threads, never from the main thread.
pub trait AssetLoader: Send + Sync {
    fn load_environment(&self, path: &Path) -> Result<EnvironmentMap, LoadError>;
    fn load_model(&self, path: &Path) -> Result<ModelData, LoadError>;
}

/// Reads HDR/PNG environments through `image` and models through `gltf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileAssetLoader;

impl AssetLoader for FileAssetLoader {
    fn load_environment(&self, path: &Path) -> Result<EnvironmentMap, LoadError> {
        EnvironmentMap::load(path)
    }

    fn load_model(&self, path: &Path) -> Result<ModelData, LoadError> {
        ModelData::load_gltf(path)
    }
}

#[derive(Debug)]
enum AssetPayload {
    Environment(EnvironmentMap),
    Model(ModelData),
}

#[derive(Debug)]
struct AssetEvent {
    kind: AssetKind,
    path: PathBuf,
    result: Result<AssetPayload, LoadError>,
}

#[derive(Debug)]
pub enum AssetReport {
    Attached { kind: AssetKind, path: PathBuf },
    Failed { kind: AssetKind, path: PathBuf, error: LoadError },
}

impl AssetReport {
    pub fn kind(&self) -> AssetKind {
        match self {
            AssetReport::Attached { kind, .. } | AssetReport::Failed { kind, .. } => *kind,
        }
    }

    pub fn is_attached(&self) -> bool {
        matches!(self, AssetReport::Attached { .. })
    }
}

type Waker = Arc<dyn Fn() + Send + Sync>;

/// Loads the environment and the model on independent worker threads and attaches
/// finished results to the scene when polled from the main thread.
pub struct AssetPipeline {
    loader: Arc<dyn AssetLoader>,
    tx: Sender<AssetEvent>,
    rx: Receiver<AssetEvent>,
    waker: Option<Waker>,
    pending: usize,
}

impl AssetPipeline {
    pub fn new(loader: Arc<dyn AssetLoader>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { loader, tx, rx, waker: None, pending: 0 }
    }

    /// Invoked on the worker thread after each result is queued.
    pub fn with_waker(mut self, waker: impl Fn() + Send + Sync + 'static) -> Self {
        self.waker = Some(Arc::new(waker));
        self
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn load_environment(&mut self, path: impl Into<PathBuf>) {
        self.spawn(AssetKind::Environment, path.into());
    }

    pub fn load_model(&mut self, path: impl Into<PathBuf>) {
        self.spawn(AssetKind::Model, path.into());
    }

    fn spawn(&mut self, kind: AssetKind, path: PathBuf) {
        let loader = Arc::clone(&self.loader);
        let tx = self.tx.clone();
        let waker = self.waker.clone();
        let job_path = path.clone();
        log::info!(target: "assets", "loading {kind} from {}", path.display());
        let spawned = thread::Builder::new().name(format!("asset-{}", kind.label())).spawn(move || {
            let result = match kind {
                AssetKind::Environment => loader.load_environment(&job_path).map(AssetPayload::Environment),
                AssetKind::Model => loader.load_model(&job_path).map(AssetPayload::Model),
            };
            if tx.send(AssetEvent { kind, path: job_path, result }).is_ok() {
                if let Some(waker) = waker {
                    waker();
                }
            }
        });
        self.pending += 1;
        if let Err(err) = spawned {
            let error = LoadError::WorkerUnavailable(err.to_string());
            // The receiver lives in `self`, so this send cannot fail.
            let _ = self.tx.send(AssetEvent { kind, path, result: Err(error) });
        }
    }

    /// Drains finished loads without blocking and attaches successes to `scene`.
    pub fn poll(&mut self, scene: &mut Scene) -> Vec<AssetReport> {
        let mut reports = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            reports.push(self.apply(event, scene));
        }
        reports
    }

    /// Blocks until `expected` loads have been drained or `timeout` elapses.
    pub fn wait_for(&mut self, scene: &mut Scene, expected: usize, timeout: Duration) -> Vec<AssetReport> {
        let deadline = Instant::now() + timeout;
        let mut reports = Vec::with_capacity(expected);
        while reports.len() < expected {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(event) => reports.push(self.apply(event, scene)),
                Err(RecvTimeoutError::Timeout) => {
                    log::warn!(
                        target: "assets",
                        "timed out waiting for assets ({} of {expected} finished)",
                        reports.len()
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        reports
    }

    fn apply(&mut self, event: AssetEvent, scene: &mut Scene) -> AssetReport {
        self.pending = self.pending.saturating_sub(1);
        let AssetEvent { kind, path, result } = event;
        match result {
            Ok(AssetPayload::Environment(environment)) => {
                log::info!(
                    target: "assets",
                    "environment '{}' attached ({}x{})",
                    environment.label(),
                    environment.width(),
                    environment.height()
                );
                scene.attach_environment(environment);
                AssetReport::Attached { kind, path }
            }
            Ok(AssetPayload::Model(data)) => {
                log::info!(
                    target: "assets",
                    "model '{}' attached ({} triangles)",
                    data.label,
                    data.triangle_count()
                );
                scene.attach_model(Model::new(data));
                AssetReport::Attached { kind, path }
            }
            Err(error) => {
                log::error!(target: "assets", "failed to load {kind} from {}: {error}", path.display());
                AssetReport::Failed { kind, path, error }
            }
        }
    }
}

impl fmt::Debug for AssetPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetPipeline")
            .field("pending", &self.pending)
            .field("has_waker", &self.waker.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::ModelVertex;
    use glam::{Vec2, Vec3};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const TIMEOUT: Duration = Duration::from_secs(5);

    struct InstantLoader {
        fail_model: bool,
    }

    impl AssetLoader for InstantLoader {
        fn load_environment(&self, _path: &Path) -> Result<EnvironmentMap, LoadError> {
            EnvironmentMap::from_texels("flat", 2, 1, vec![Vec3::ONE; 2])
        }

        fn load_model(&self, path: &Path) -> Result<ModelData, LoadError> {
            if self.fail_model {
                return Err(LoadError::MissingMesh(path.to_path_buf()));
            }
            let vertices = vec![
                ModelVertex::new(Vec3::ZERO, Vec3::Z, Vec2::ZERO),
                ModelVertex::new(Vec3::X, Vec3::Z, Vec2::X),
                ModelVertex::new(Vec3::Y, Vec3::Z, Vec2::Y),
            ];
            Ok(ModelData::new("tri", vertices, vec![0, 1, 2]))
        }
    }

    /// Holds the environment load until the test releases it.
    struct GatedLoader {
        gate: Mutex<Receiver<()>>,
    }

    impl AssetLoader for GatedLoader {
        fn load_environment(&self, path: &Path) -> Result<EnvironmentMap, LoadError> {
            let gate = self.gate.lock().expect("gate lock");
            let _ = gate.recv();
            InstantLoader { fail_model: false }.load_environment(path)
        }

        fn load_model(&self, path: &Path) -> Result<ModelData, LoadError> {
            InstantLoader { fail_model: false }.load_model(path)
        }
    }

    #[test]
    fn both_assets_attach() {
        let mut pipeline = AssetPipeline::new(Arc::new(InstantLoader { fail_model: false }));
        let mut scene = Scene::new();
        pipeline.load_environment("env.hdr");
        pipeline.load_model("helmet.gltf");
        assert_eq!(pipeline.pending(), 2);
        let reports = pipeline.wait_for(&mut scene, 2, TIMEOUT);
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(AssetReport::is_attached));
        assert!(scene.environment().is_some());
        assert!(scene.model().is_some());
        assert_eq!(pipeline.pending(), 0);
    }

    #[test]
    fn model_failure_leaves_environment_attached() {
        let mut pipeline = AssetPipeline::new(Arc::new(InstantLoader { fail_model: true }));
        let mut scene = Scene::new();
        pipeline.load_environment("env.hdr");
        pipeline.load_model("broken.gltf");
        let reports = pipeline.wait_for(&mut scene, 2, TIMEOUT);
        let failed: Vec<_> = reports.iter().filter(|r| !r.is_attached()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].kind(), AssetKind::Model);
        assert!(scene.model().is_none());
        assert!(scene.environment().is_some());
    }

    #[test]
    fn model_can_finish_before_environment() {
        let (release, gate) = mpsc::channel();
        let mut pipeline = AssetPipeline::new(Arc::new(GatedLoader { gate: Mutex::new(gate) }));
        let mut scene = Scene::new();
        pipeline.load_environment("env.hdr");
        pipeline.load_model("helmet.gltf");

        let first = pipeline.wait_for(&mut scene, 1, TIMEOUT);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].kind(), AssetKind::Model);
        assert!(scene.model().is_some());
        assert!(scene.environment().is_none());

        release.send(()).expect("release environment");
        let second = pipeline.wait_for(&mut scene, 1, TIMEOUT);
        assert_eq!(second[0].kind(), AssetKind::Environment);
        assert!(scene.environment().is_some());
    }

    #[test]
    fn waker_fires_once_per_result() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&wakes);
        let mut pipeline = AssetPipeline::new(Arc::new(InstantLoader { fail_model: false }))
            .with_waker(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        let mut scene = Scene::new();
        pipeline.load_model("helmet.gltf");
        pipeline.wait_for(&mut scene, 1, TIMEOUT);
        // The waker runs right after the send; give the worker a moment to finish.
        let deadline = Instant::now() + TIMEOUT;
        while wakes.load(Ordering::SeqCst) == 0 && Instant::now() < deadline {
            thread::yield_now();
        }
        assert_eq!(wakes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn poll_without_results_is_empty() {
        let mut pipeline = AssetPipeline::new(Arc::new(FileAssetLoader));
        let mut scene = Scene::new();
        assert!(pipeline.poll(&mut scene).is_empty());
        assert!(scene.is_empty());
    }
}
