use crate::input::Easing;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/showcase.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
    pub fullscreen: bool,
    /// Multisample the scene pass.
    pub antialias: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    #[serde(default = "AssetConfig::default_model")]
    pub model: PathBuf,
    #[serde(default = "AssetConfig::default_environment")]
    pub environment: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "CameraConfig::default_fov_degrees")]
    pub fov_degrees: f32,
    #[serde(default = "CameraConfig::default_near")]
    pub near: f32,
    #[serde(default = "CameraConfig::default_far")]
    pub far: f32,
    #[serde(default = "CameraConfig::default_distance")]
    pub distance: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostConfig {
    #[serde(default = "PostConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "PostConfig::default_rgb_shift_amount")]
    pub rgb_shift_amount: f32,
    #[serde(default)]
    pub rgb_shift_angle: f32,
    #[serde(default = "PostConfig::default_clear_color")]
    pub clear_color: [f32; 4],
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Full rotation span in radians; the pointer maps onto half of it either side of centre.
    #[serde(default = "InputConfig::default_rotation_range")]
    pub rotation_range: f32,
    #[serde(default = "InputConfig::default_tween_seconds")]
    pub tween_seconds: f32,
    #[serde(default)]
    pub easing: Easing,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "ViewportConfig::default_max_pixel_ratio")]
    pub max_pixel_ratio: f32,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct FeatureConfig {
    #[serde(default)]
    pub orbit_controls: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrbitConfig {
    #[serde(default = "OrbitConfig::default_damping")]
    pub damping: f32,
    #[serde(default = "OrbitConfig::default_rotate_speed")]
    pub rotate_speed: f32,
    #[serde(default = "OrbitConfig::default_zoom_speed")]
    pub zoom_speed: f32,
    #[serde(default = "OrbitConfig::default_min_distance")]
    pub min_distance: f32,
    #[serde(default = "OrbitConfig::default_max_distance")]
    pub max_distance: f32,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub post: PostConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub viewport: ViewportConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub orbit: OrbitConfig,
}

#[derive(Debug, Clone, Default)]
pub struct AppConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub vsync: Option<bool>,
    pub antialias: Option<bool>,
    pub model: Option<PathBuf>,
    pub environment: Option<PathBuf>,
    pub rgb_shift_amount: Option<f32>,
    pub orbit_controls: Option<bool>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Scene Showcase".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            fullscreen: false,
            antialias: true,
        }
    }
}

impl WindowConfig {
    pub const ANTIALIAS_SAMPLES: u32 = 4;

    /// Requested scene-pass sample count; the backend may still drop to 1 if the format can't do it.
    pub fn msaa_samples(&self) -> u32 {
        if self.antialias {
            Self::ANTIALIAS_SAMPLES
        } else {
            1
        }
    }
}

impl AssetConfig {
    fn default_model() -> PathBuf {
        PathBuf::from("assets/models/DamagedHelmet.gltf")
    }

    fn default_environment() -> PathBuf {
        PathBuf::from("assets/environments/pond_bridge_night_1k.hdr")
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self { model: Self::default_model(), environment: Self::default_environment() }
    }
}

impl CameraConfig {
    const fn default_fov_degrees() -> f32 {
        45.0
    }

    const fn default_near() -> f32 {
        0.1
    }

    const fn default_far() -> f32 {
        1000.0
    }

    const fn default_distance() -> f32 {
        3.5
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: Self::default_fov_degrees(),
            near: Self::default_near(),
            far: Self::default_far(),
            distance: Self::default_distance(),
        }
    }
}

impl PostConfig {
    const fn default_enabled() -> bool {
        true
    }

    const fn default_rgb_shift_amount() -> f32 {
        0.003
    }

    const fn default_clear_color() -> [f32; 4] {
        [0.0, 0.0, 0.0, 0.0]
    }
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            rgb_shift_amount: Self::default_rgb_shift_amount(),
            rgb_shift_angle: 0.0,
            clear_color: Self::default_clear_color(),
        }
    }
}

impl InputConfig {
    fn default_rotation_range() -> f32 {
        crate::input::DEFAULT_ROTATION_RANGE
    }

    const fn default_tween_seconds() -> f32 {
        crate::input::DEFAULT_TWEEN_SECONDS
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            rotation_range: Self::default_rotation_range(),
            tween_seconds: Self::default_tween_seconds(),
            easing: Easing::default(),
        }
    }
}

impl ViewportConfig {
    const fn default_max_pixel_ratio() -> f32 {
        crate::viewport::DEFAULT_MAX_PIXEL_RATIO
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self { max_pixel_ratio: Self::default_max_pixel_ratio() }
    }
}

impl OrbitConfig {
    const fn default_damping() -> f32 {
        0.05
    }

    const fn default_rotate_speed() -> f32 {
        1.0
    }

    const fn default_zoom_speed() -> f32 {
        0.1
    }

    const fn default_min_distance() -> f32 {
        1.0
    }

    const fn default_max_distance() -> f32 {
        20.0
    }
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            damping: Self::default_damping(),
            rotate_speed: Self::default_rotate_speed(),
            zoom_speed: Self::default_zoom_speed(),
            min_distance: Self::default_min_distance(),
            max_distance: Self::default_max_distance(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let cfg = serde_json::from_slice(&bytes)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::warn!(target: "config", "Config load error: {err:?}. Falling back to defaults.");
                Self::default()
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &AppConfigOverrides) {
        if let Some(width) = overrides.width {
            self.window.width = width;
        }
        if let Some(height) = overrides.height {
            self.window.height = height;
        }
        if let Some(vsync) = overrides.vsync {
            self.window.vsync = vsync;
        }
        if let Some(antialias) = overrides.antialias {
            self.window.antialias = antialias;
        }
        if let Some(model) = overrides.model.as_ref() {
            self.assets.model = model.clone();
        }
        if let Some(environment) = overrides.environment.as_ref() {
            self.assets.environment = environment.clone();
        }
        if let Some(amount) = overrides.rgb_shift_amount {
            self.post.rgb_shift_amount = amount;
        }
        if let Some(orbit) = overrides.orbit_controls {
            self.features.orbit_controls = orbit;
        }
    }
}

impl AppConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.applied_fields().is_empty() && self.config_path.is_none()
    }

    pub fn applied_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.width.is_some() {
            fields.push("width");
        }
        if self.height.is_some() {
            fields.push("height");
        }
        if self.vsync.is_some() {
            fields.push("vsync");
        }
        if self.antialias.is_some() {
            fields.push("antialias");
        }
        if self.model.is_some() {
            fields.push("model");
        }
        if self.environment.is_some() {
            fields.push("environment");
        }
        if self.rgb_shift_amount.is_some() {
            fields.push("rgb_shift");
        }
        if self.orbit_controls.is_some() {
            fields.push("orbit");
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_config_fills_defaults() {
        let mut file = NamedTempFile::new().expect("temp config");
        write!(file, r#"{{"post":{{"rgb_shift_amount":0.01}},"features":{{"orbit_controls":true}}}}"#)
            .expect("write config");
        let cfg = AppConfig::load(file.path()).expect("load config");
        assert!((cfg.post.rgb_shift_amount - 0.01).abs() < f32::EPSILON);
        assert!(cfg.post.enabled);
        assert!(cfg.features.orbit_controls);
        assert_eq!(cfg.window.width, 1280);
        assert!((cfg.camera.fov_degrees - 45.0).abs() < f32::EPSILON);
        assert!((cfg.viewport.max_pixel_ratio - 2.0).abs() < f32::EPSILON);
        assert_eq!(cfg.input.easing, Easing::Power2Out);
    }

    #[test]
    fn antialias_is_on_unless_config_turns_it_off() {
        assert!(AppConfig::default().window.antialias);
        assert_eq!(AppConfig::default().window.msaa_samples(), 4);

        let mut file = NamedTempFile::new().expect("temp config");
        write!(file, r#"{{"window":{{"antialias":false,"width":800}}}}"#).expect("write config");
        let mut cfg = AppConfig::load(file.path()).expect("load config");
        assert!(!cfg.window.antialias);
        assert_eq!(cfg.window.msaa_samples(), 1);
        assert_eq!(cfg.window.width, 800);
        assert!(cfg.window.vsync);

        let overrides = AppConfigOverrides { antialias: Some(true), ..Default::default() };
        cfg.apply_overrides(&overrides);
        assert_eq!(cfg.window.msaa_samples(), 4);
        assert_eq!(overrides.applied_fields(), vec!["antialias"]);
    }

    #[test]
    fn shipped_config_enables_antialiasing() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_CONFIG_PATH);
        let cfg = AppConfig::load(&path).expect("shipped config parses");
        assert!(cfg.window.antialias);
        assert!(cfg.post.enabled);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = AppConfig::load_or_default("does/not/exist.json");
        assert!((cfg.camera.distance - 3.5).abs() < f32::EPSILON);
        assert!((cfg.input.tween_seconds - 1.0).abs() < f32::EPSILON);
        assert!(!cfg.features.orbit_controls);
    }

    #[test]
    fn overrides_replace_selected_fields() {
        let mut cfg = AppConfig::default();
        let overrides = AppConfigOverrides {
            width: Some(640),
            model: Some(PathBuf::from("helmet.gltf")),
            rgb_shift_amount: Some(0.0),
            ..Default::default()
        };
        cfg.apply_overrides(&overrides);
        assert_eq!(cfg.window.width, 640);
        assert_eq!(cfg.window.height, 720);
        assert_eq!(cfg.assets.model, PathBuf::from("helmet.gltf"));
        assert_eq!(cfg.post.rgb_shift_amount, 0.0);
        assert_eq!(overrides.applied_fields(), vec!["width", "model", "rgb_shift"]);
    }
}
